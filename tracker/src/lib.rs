pub mod allowlist;
pub mod config;
pub mod errors;
pub mod payload;
pub mod pipeline;
pub mod service;

#[cfg(test)]
mod testutils;

use allowlist::Allowlist;
use pipeline::ClickPipeline;
use service::TrackerService;
use shared::access_log::AccessLog;
use shared::admin_service::AdminService;
use shared::http::{run_http_service, serve_http_service};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tracker config: {0}")]
    Config(#[from] config::ValidationError),
}

/// Builds the tracking service for a validated config
pub fn build_service(config: &config::Config) -> TrackerService {
    let allowlist: Arc<Allowlist> = Arc::new(config.allowlist());
    TrackerService::new(ClickPipeline::new(allowlist), config.redirect_mode)
}

pub async fn run(config: config::Config) -> Result<(), TrackerError> {
    config.validate()?;

    let service = build_service(&config);
    tracing::info!(
        allowed_hosts = service.pipeline().allowlist().len(),
        redirect_mode = ?config.redirect_mode,
        "tracker configured"
    );

    let ready = Arc::new(AtomicBool::new(false));

    let ready_flag = ready.clone();
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::new(move || ready_flag.load(Ordering::Relaxed)),
    );

    let tracker_task = async {
        let addr = format!("{}:{}", config.listener.host, config.listener.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %addr, "tracker listener bound");

        ready.store(true, Ordering::Relaxed);
        serve_http_service(listener, AccessLog::new(service)).await
    };

    tokio::try_join!(admin_task, tracker_task)?;
    Ok(())
}
