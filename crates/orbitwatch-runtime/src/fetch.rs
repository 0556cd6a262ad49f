//! Source fetching with bounded timeout and retry.

use std::time::Duration;

use async_trait::async_trait;
use orbitwatch_core::{Error, FetchPolicy, Result, SourceGroup};
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retrieves raw element-set text for a source group.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fails with [`Error::Fetch`] when the source is unreachable or
    /// answers with a non-success status.
    async fn fetch(&self, group: &SourceGroup) -> Result<String>;
}

/// HTTP(S) fetcher with a per-request timeout and exponential backoff.
pub struct HttpFetcher {
    client: Client,
    policy: FetchPolicy,
}

impl HttpFetcher {
    pub fn new(policy: FetchPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(policy.timeout_secs))
            .user_agent(concat!("orbitwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, policy })
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Attempt::Retry(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let msg = format!("HTTP {}", status);
            return Err(if is_retryable(status) {
                Attempt::Retry(msg)
            } else {
                Attempt::Fatal(msg)
            });
        }

        response
            .text()
            .await
            .map_err(|e| Attempt::Retry(format!("body read failed: {}", e)))
    }
}

enum Attempt {
    Retry(String),
    Fatal(String),
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, group: &SourceGroup) -> Result<String> {
        let attempts = self.policy.max_retries + 1;
        let mut delay = Duration::from_millis(self.policy.initial_backoff_ms);

        for attempt in 1..=attempts {
            match self.fetch_once(&group.url).await {
                Ok(body) => {
                    debug!("Fetched {} bytes for group {}", body.len(), group.name);
                    return Ok(body);
                }
                Err(Attempt::Fatal(msg)) => {
                    return Err(Error::Fetch(format!("{}: {}", group.name, msg)));
                }
                Err(Attempt::Retry(msg)) if attempt < attempts => {
                    warn!(
                        "Fetch for group {} failed (attempt {}/{}): {}, retrying in {:?}",
                        group.name, attempt, attempts, msg, delay
                    );
                    sleep(delay).await;
                    delay *= 2;
                }
                Err(Attempt::Retry(msg)) => {
                    return Err(Error::Fetch(format!(
                        "{}: {} after {} attempts",
                        group.name, msg, attempts
                    )));
                }
            }
        }

        Err(Error::Fetch(format!("{}: no attempts made", group.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitwatch_core::Category;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn group_at(url: String) -> SourceGroup {
        SourceGroup {
            name: "debris".into(),
            category: Category::Debris,
            url,
            default_max: 10,
        }
    }

    fn unreachable_group() -> SourceGroup {
        // Port 9 on loopback: connection refused without touching the network.
        group_at("http://127.0.0.1:9/elements.txt".into())
    }

    fn policy(timeout_secs: u64, max_retries: u32) -> FetchPolicy {
        FetchPolicy {
            timeout_secs,
            max_retries,
            initial_backoff_ms: 10,
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_unreachable_source_fails_after_bounded_retries() {
        let fetcher = HttpFetcher::new(policy(2, 2)).unwrap();

        let started = Instant::now();
        let err = fetcher.fetch(&unreachable_group()).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.to_string().contains("3 attempts"), "{}", err);
        // Backoff of 10ms + 20ms, plus fast connection refusals.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_silent_source_times_out() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let fetcher = HttpFetcher::new(policy(1, 0)).unwrap();
        let started = Instant::now();
        let err = fetcher
            .fetch(&group_at(format!("http://{}/elements.txt", addr)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.to_string().contains("1 attempts"), "{}", err);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(900), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(5), "{:?}", elapsed);
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_success() {
        // First request gets a 503, later ones get the body.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let served = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let n = served.fetch_add(1, Ordering::SeqCst);
                let response = if n == 0 {
                    "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                } else {
                    let body = "ISS (ZARYA)\n";
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        let fetcher = HttpFetcher::new(policy(2, 2)).unwrap();
        let body = fetcher
            .fetch(&group_at(format!("http://{}/elements.txt", addr)))
            .await
            .unwrap();
        assert_eq!(body, "ISS (ZARYA)\n");
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let served = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                served.fetch_add(1, Ordering::SeqCst);
                let _ = socket
                    .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
                let _ = socket.shutdown().await;
            }
        });

        let fetcher = HttpFetcher::new(policy(2, 3)).unwrap();
        let err = fetcher
            .fetch(&group_at(format!("http://{}/elements.txt", addr)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"), "{}", err);
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }
}
