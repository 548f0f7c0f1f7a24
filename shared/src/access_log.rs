//! Request logging in the spirit of a common access log: one line per request
//! with client address, method, path, status and timing, emitted under the
//! `access` target.

use crate::http::PeerAddr;
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

pub struct AccessLog<S> {
    inner: S,
}

impl<S> AccessLog<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLog<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display + 'static,
    ResBody: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let client = client_addr(&req);
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let version = req.version();
        let start = Instant::now();

        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(response) => tracing::info!(
                    target: "access",
                    %client,
                    %method,
                    %path,
                    ?version,
                    status = response.status().as_u16(),
                    elapsed_ms,
                    "request"
                ),
                Err(e) => tracing::warn!(
                    target: "access",
                    %client,
                    %method,
                    %path,
                    ?version,
                    error = %e,
                    elapsed_ms,
                    "request failed"
                ),
            }

            result
        })
    }
}

/// Client IP for the log line, `-` when unknown as in the common log format
fn client_addr<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<PeerAddr>()
        .map_or_else(|| "-".to_string(), |peer| peer.0.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use std::convert::Infallible;
    use std::future::Ready;

    struct Teapot;

    impl Service<Request<()>> for Teapot {
        type Response = Response<()>;
        type Error = Infallible;
        type Future = Ready<Result<Self::Response, Self::Error>>;

        fn call(&self, _req: Request<()>) -> Self::Future {
            let mut response = Response::new(());
            *response.status_mut() = StatusCode::IM_A_TEAPOT;
            std::future::ready(Ok(response))
        }
    }

    #[test]
    fn test_client_addr() {
        let mut req = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(client_addr(&req), "-");

        req.extensions_mut()
            .insert(PeerAddr("10.1.2.3:51234".parse().unwrap()));
        assert_eq!(client_addr(&req), "10.1.2.3");
    }

    #[tokio::test]
    async fn test_passes_response_through() {
        let service = AccessLog::new(Teapot);
        let req = Request::builder().uri("/brew?cup=1").body(()).unwrap();

        let response = service.call(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
