pub mod access_log;
pub mod admin_service;
pub mod http;
