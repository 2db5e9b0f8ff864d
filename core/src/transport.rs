//! The I/O seam between `TodoClient` and the network.

use std::future::Future;

use thiserror::Error;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// The request produced no response (connection refused, DNS, reset).
/// Non-success statuses are responses, not transport errors.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::TransportError(err.0)
    }
}

/// Executes one HTTP round trip. No retries and no timeout beyond the
/// implementation's default.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::{Transport, TransportError};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Transport for ReqwestTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Put => reqwest::Method::PUT,
                HttpMethod::Delete => reqwest::Method::DELETE,
            };
            let mut builder = self.client.request(method, request.path.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError(e.to_string()))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    let value = value.to_str().ok()?;
                    Some((name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
