//! HTTP transport for the request manager.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use tracing::warn;

use crate::dispatch::{DispatchRequest, Transport, TransportResponse};
use crate::error::generic_failure_status;

/// [`Transport`] that delivers requests as HTTP GETs.
///
/// Failures that never produce an HTTP response (connect errors, body read
/// errors) resolve to a synthetic 599 response, keeping the manager's policy
/// free of error-cause inspection. Retries are likewise left to the
/// manager's sweep; the middleware stack only adds tracing.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: ClientWithMiddleware,
}

impl HttpTransport {
    /// Create a transport with the default client stack.
    pub fn new() -> Self {
        let http = ClientBuilder::new(reqwest::Client::new())
            .with(TracingMiddleware::default())
            .build();
        Self { http }
    }

    /// Create a transport over a preconfigured client.
    pub fn with_client(http: ClientWithMiddleware) -> Self {
        Self { http }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &DispatchRequest) -> TransportResponse {
        match self.http.get(&request.url).send().await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => TransportResponse::new(status, body),
                    Err(err) => {
                        warn!(url = %request.url, error = %err, "failed reading response body");
                        TransportResponse::new(generic_failure_status(), "")
                    }
                }
            }
            Err(err) => {
                warn!(url = %request.url, error = %err, "transport error");
                TransportResponse::new(generic_failure_status(), "")
            }
        }
    }
}
