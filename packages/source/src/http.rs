//! Aggregate source backed by the dashboard HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use feedback_map_analytics_models::AggregateBatch;

use crate::envelope::{error_message, parse_heatmap_response};
use crate::{AggregateSource, FetchError, check_lookback};

/// Path of the county heatmap endpoint, relative to the API base URL.
pub const HEATMAP_PATH: &str = "/api/v1/dashboard/county-heatmap";

/// Fetches `GET {base_url}/api/v1/dashboard/county-heatmap?days=N`.
///
/// Failures are reported once; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct HttpAggregateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAggregateSource {
    /// Creates a source with its own client and a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feedback-map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a source that shares an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// The API base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for a lookback window.
    #[must_use]
    pub fn endpoint(&self, lookback_days: u32) -> String {
        format!("{}{HEATMAP_PATH}?days={lookback_days}", self.base_url)
    }
}

#[async_trait]
impl AggregateSource for HttpAggregateSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch_aggregates(&self, lookback_days: u32) -> Result<AggregateBatch, FetchError> {
        check_lookback(lookback_days)?;

        let url = self.endpoint(lookback_days);
        log::info!("Fetching county heatmap: {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            log::warn!("County heatmap request failed with {status}: {message}");
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let batch = parse_heatmap_response(&body, lookback_days)?;
        log::debug!("Received {} regions for a {lookback_days}-day window", batch.len());
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Serves one canned response and returns the request line it saw.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{addr}"), task)
    }

    fn source(base_url: &str) -> HttpAggregateSource {
        HttpAggregateSource::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let source = source("http://localhost:8000/");
        assert_eq!(
            source.endpoint(7),
            "http://localhost:8000/api/v1/dashboard/county-heatmap?days=7"
        );
    }

    #[tokio::test]
    async fn fetches_and_decodes_envelope() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"success":true,"message":"County heatmap retrieved","data":{"Nairobi":
                {"count":5,"sentiment":{"positive":1,"negative":3,"neutral":1}}}}"#,
        )
        .await;

        let batch = source(&url).fetch_aggregates(14).await.unwrap();
        assert_eq!(batch.lookback_days, 14);
        assert_eq!(batch.get("Nairobi").unwrap().count, 5);

        let request_line = server.await.unwrap();
        assert_eq!(
            request_line,
            "GET /api/v1/dashboard/county-heatmap?days=14 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn server_error_is_upstream() {
        let (url, _server) =
            serve_once("500 Internal Server Error", r#"{"detail":"query failed"}"#).await;

        let err = source(&url).fetch_aggregates(7).await.unwrap_err();
        match err {
            FetchError::Upstream { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "query failed");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_malformed() {
        let (url, _server) = serve_once("200 OK", "not json").await;
        let err = source(&url).fetch_aggregates(7).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source(&format!("http://{addr}"))
            .fetch_aggregates(7)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn zero_lookback_skips_request() {
        let err = source("http://127.0.0.1:9").fetch_aggregates(0).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidLookback { days: 0 }));
    }
}
