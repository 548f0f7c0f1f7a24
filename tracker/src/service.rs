use crate::config::RedirectMode;
use crate::errors::ClickError;
use crate::pipeline::{ClickPipeline, ValidatedClick};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::header::{ALLOW, HeaderValue, LOCATION};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{make_boxed_error_response, make_text_response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

const CLICK_ROUTE_PREFIX: &str = "/track/click/";
const PAYLOAD_PARAM: &str = "p";

/// Path parameters of `/track/click/{account_id}/{domain}`
#[derive(Debug, PartialEq)]
struct ClickRoute<'a> {
    account_id: &'a str,
    domain: &'a str,
}

impl<'a> ClickRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix(CLICK_ROUTE_PREFIX)?;
        let (account_id, domain) = rest.split_once('/')?;

        if account_id.is_empty() || domain.is_empty() || domain.contains('/') {
            return None;
        }

        Some(ClickRoute { account_id, domain })
    }
}

pub struct TrackerService {
    pipeline: ClickPipeline,
    redirect_mode: RedirectMode,
}

impl TrackerService {
    pub fn new(pipeline: ClickPipeline, redirect_mode: RedirectMode) -> Self {
        Self {
            pipeline,
            redirect_mode,
        }
    }

    pub fn pipeline(&self) -> &ClickPipeline {
        &self.pipeline
    }

    pub fn handle<B>(&self, req: &Request<B>) -> Response<BoxBody<Bytes, Infallible>> {
        let Some(route) = ClickRoute::parse(req.uri().path()) else {
            return make_boxed_error_response(StatusCode::NOT_FOUND);
        };

        if req.method() != Method::GET && req.method() != Method::HEAD {
            let mut response = make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED);
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        let payload = req.uri().query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == PAYLOAD_PARAM)
                .map(|(_, value)| value)
        });

        match self.pipeline.validate(route.domain, payload.as_deref()) {
            Ok(click) => self.redirect(click),
            Err(e) => {
                tracing::debug!(
                    account_id = route.account_id,
                    domain = route.domain,
                    reason = e.kind(),
                    error = %e,
                    "rejected click"
                );
                rejection(e)
            }
        }
    }

    fn redirect(&self, click: ValidatedClick) -> Response<BoxBody<Bytes, Infallible>> {
        let body = format!("Permanent redirect to: {}", click.target());

        match self.redirect_mode {
            RedirectMode::Simulate => make_text_response(StatusCode::OK, body),
            RedirectMode::Permanent => {
                let mut response = make_text_response(StatusCode::MOVED_PERMANENTLY, body);
                // Serialized Url rather than the raw target, which may hold non-ASCII
                if let Ok(location) = HeaderValue::from_str(click.url.as_str()) {
                    response.headers_mut().insert(LOCATION, location);
                }
                response
            }
        }
    }
}

fn rejection(error: ClickError) -> Response<BoxBody<Bytes, Infallible>> {
    make_text_response(error.status(), error.to_string())
}

impl Service<Request<Incoming>> for TrackerService {
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let res = self.handle(&req);
        Box::pin(async move { Ok(res) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::Allowlist;
    use crate::testutils::encode_payload;
    use http_body_util::BodyExt;
    use std::sync::Arc;

    fn test_service(redirect_mode: RedirectMode) -> TrackerService {
        TrackerService::new(
            ClickPipeline::new(Arc::new(Allowlist::default())),
            redirect_mode,
        )
    }

    fn click_request(method: Method, domain: &str, payload: Option<&str>) -> Request<()> {
        let mut uri = format!("/track/click/123/{domain}");
        if let Some(p) = payload {
            uri.push_str("?p=");
            uri.push_str(&p.replace('+', "%2B"));
        }
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    async fn body_string(response: Response<BoxBody<Bytes, Infallible>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_route_parsing() {
        assert_eq!(
            ClickRoute::parse("/track/click/123/facebook.com"),
            Some(ClickRoute {
                account_id: "123",
                domain: "facebook.com"
            })
        );
        assert_eq!(ClickRoute::parse("/track/click/123"), None);
        assert_eq!(ClickRoute::parse("/track/click/123/"), None);
        assert_eq!(ClickRoute::parse("/track/click//facebook.com"), None);
        assert_eq!(ClickRoute::parse("/track/click/123/facebook.com/x"), None);
        assert_eq!(ClickRoute::parse("/track/open/123/facebook.com"), None);
    }

    #[tokio::test]
    async fn test_simulated_redirect() {
        let payload = encode_payload("https://facebook.com/x");
        let req = click_request(Method::GET, "facebook.com", Some(&payload));

        let response = test_service(RedirectMode::Simulate).handle(&req);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(LOCATION).is_none());
        assert_eq!(
            body_string(response).await,
            "Permanent redirect to: https://facebook.com/x"
        );
    }

    #[tokio::test]
    async fn test_permanent_redirect() {
        let payload = encode_payload("https://facebook.com/x");
        let req = click_request(Method::GET, "facebook.com", Some(&payload));

        let response = test_service(RedirectMode::Permanent).handle(&req);
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://facebook.com/x"
        );
        assert!(body_string(response).await.contains("https://facebook.com/x"));
    }

    #[tokio::test]
    async fn test_domain_mismatch() {
        let payload = encode_payload("https://facebook.com/x");
        let req = click_request(Method::GET, "evil.com", Some(&payload));

        let response = test_service(RedirectMode::Simulate).handle(&req);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "Domain in route does not match domain in payload"
        );
    }

    #[tokio::test]
    async fn test_unsafe_host() {
        let payload = encode_payload("https://notallowed.com/x");
        let req = click_request(Method::GET, "notallowed.com", Some(&payload));

        let response = test_service(RedirectMode::Permanent).handle(&req);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(LOCATION).is_none());
        assert_eq!(
            body_string(response).await,
            "URL in payload is not considered safe"
        );
    }

    #[tokio::test]
    async fn test_missing_payload() {
        let service = test_service(RedirectMode::Simulate);

        for req in [
            click_request(Method::GET, "facebook.com", None),
            click_request(Method::GET, "facebook.com", Some("")),
            click_request(Method::GET, "evil.com", None),
        ] {
            let response = service.handle(&req);
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_string(response).await, "Missing payload");
        }
    }

    #[tokio::test]
    async fn test_unescaped_plus_in_payload() {
        // Standard base64 of this envelope contains a '+', sent unescaped
        let payload = encode_payload("https://facebook.com/>>>>>>");
        assert!(payload.contains('+'));

        let uri = format!("/track/click/123/facebook.com?p={payload}");
        let req = Request::builder().uri(uri).body(()).unwrap();

        let response = test_service(RedirectMode::Simulate).handle(&req);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_encoding_surfaces_decoder_error() {
        let req = click_request(Method::GET, "facebook.com", Some("****"));

        let response = test_service(RedirectMode::Simulate).handle(&req);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_string(response)
                .await
                .starts_with("invalid payload encoding: ")
        );
    }

    #[tokio::test]
    async fn test_domain_segment_not_percent_decoded() {
        let payload = encode_payload("https://facebook.com/x");
        let req = click_request(Method::GET, "facebook%2Ecom", Some(&payload));
        assert_eq!(
            ClickRoute::parse(req.uri().path()).unwrap().domain,
            "facebook%2Ecom"
        );

        let response = test_service(RedirectMode::Simulate).handle(&req);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "Domain in route does not match domain in payload"
        );
    }

    #[test]
    fn test_unknown_path_and_method() {
        let service = test_service(RedirectMode::Simulate);

        let req = Request::builder().uri("/track/click").body(()).unwrap();
        assert_eq!(service.handle(&req).status(), StatusCode::NOT_FOUND);

        let payload = encode_payload("https://facebook.com/x");
        let req = click_request(Method::POST, "facebook.com", Some(&payload));
        let response = service.handle(&req);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET, HEAD");
    }
}
