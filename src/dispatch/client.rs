//! HTTP client for the analysis webhook.

use crate::models::AnalysisRequest;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Ways a webhook call can fail. Each one ends the run before rendering.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The bounded wait ran out.
    #[error("Request timed out after {seconds}s. Try lowering --max-items.")]
    Timeout { seconds: u64 },

    /// The connection could not be made or was interrupted.
    #[error("Cannot reach webhook at {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The webhook answered with a non-success status.
    #[error("Webhook returned HTTP {status}{}", status_body(.body))]
    Status { status: u16, body: String },

    /// The body is not JSON. Handled like a transport failure.
    #[error("Webhook response could not be read as JSON: {0}")]
    MalformedPayload(#[source] serde_json::Error),
}

fn status_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

/// Client for one configured webhook timeout.
pub struct WebhookClient {
    http_client: reqwest::Client,
    timeout_seconds: u64,
}

impl WebhookClient {
    /// Create a client that abandons calls after `timeout_seconds`.
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("incident-intel/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            timeout_seconds,
        })
    }

    /// POST the request and return the parsed JSON body.
    pub async fn dispatch(
        &self,
        url: &str,
        request: &AnalysisRequest,
    ) -> Result<Value, DispatchError> {
        info!(
            "Posting analysis request (max_items={}, audience={}, include_html={}, scale_mode={})",
            request.max_items, request.audience, request.include_html, request.scale_mode
        );

        let response = self
            .http_client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(url, e))?;
        debug!("Webhook answered {} with {} bytes", status, body.len());

        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(DispatchError::MalformedPayload)
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> DispatchError {
        if error.is_timeout() {
            DispatchError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else {
            DispatchError::Transport {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Audience;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    fn sample_request() -> AnalysisRequest {
        AnalysisRequest {
            max_items: 20,
            audience: Audience::Manager,
            include_html: true,
            scale_mode: false,
        }
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    /// Read one request and return its body.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let length = text[..split]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= split + 4 + length {
                    return text[split + 4..].to_string();
                }
            }
        }
        String::new()
    }

    /// Serve a single canned response and report the request body received.
    async fn serve_once(
        response: String,
        delay: Duration,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let body = read_request(&mut socket).await;
            let _ = tx.send(body);
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        (format!("http://{}/webhook/aws-intel", addr), rx)
    }

    #[tokio::test]
    async fn test_dispatch_posts_request_and_parses_body() {
        let (url, received) = serve_once(
            http_response("200 OK", r#"{"total_items_analyzed": 3}"#),
            Duration::ZERO,
        )
        .await;

        let client = WebhookClient::new(5).unwrap();
        let value = client.dispatch(&url, &sample_request()).await.unwrap();
        assert_eq!(value["total_items_analyzed"], 3);

        let sent: Value = serde_json::from_str(&received.await.unwrap()).unwrap();
        assert_eq!(sent, serde_json::to_value(sample_request()).unwrap());
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_body() {
        let (url, _) = serve_once(
            http_response("500 Internal Server Error", "workflow crashed"),
            Duration::ZERO,
        )
        .await;

        let client = WebhookClient::new(5).unwrap();
        let err = client.dispatch(&url, &sample_request()).await.unwrap_err();
        match &err {
            DispatchError::Status { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "workflow crashed");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Webhook returned HTTP 500: workflow crashed"
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed_payload() {
        let (url, _) = serve_once(http_response("200 OK", "<html>oops"), Duration::ZERO).await;

        let client = WebhookClient::new(5).unwrap();
        let err = client.dispatch(&url, &sample_request()).await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_slow_webhook_times_out() {
        let (url, _) = serve_once(
            http_response("200 OK", "{}"),
            Duration::from_secs(4),
        )
        .await;

        let client = WebhookClient::new(1).unwrap();
        let err = client.dispatch(&url, &sample_request()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { seconds: 1 }));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = WebhookClient::new(5).unwrap();
        let err = client
            .dispatch(&format!("http://{}/hook", addr), &sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport { .. }));
    }

    #[test]
    fn test_status_message_without_body() {
        let err = DispatchError::Status {
            status: 404,
            body: "  ".to_string(),
        };
        assert_eq!(err.to_string(), "Webhook returned HTTP 404");
    }
}
