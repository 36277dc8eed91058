//! HTTP transport seam.
//!
//! Connectors never talk to `reqwest` directly; they call a `Transport`, so
//! tests can script responses and the retry policy lives in one place.
//! `HttpTransport` retries HTTP 429 with exponential backoff plus jitter and
//! hands every other response back untouched. Deciding whether a status is
//! acceptable is the caller's job.

use rand::Rng;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Final response of a GET, after any rate-limit retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Compare the media type, ignoring parameters such as `charset`.
    pub fn has_content_type(&self, expected: &str) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|media| media.trim().eq_ignore_ascii_case(expected))
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("rate limited by provider: max retries ({retries}) exceeded")]
    RetriesExhausted { retries: u32 },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Something that can perform a GET and return the body as text.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Backoff schedule for rate-limited requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            multiplier: 1.5,
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    /// Base delay before retry number `retry` (0-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.min(i32::MAX as u32) as i32);
        Duration::try_from_secs_f64(self.initial_backoff.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }

    /// Base delay plus up to 10% random jitter.
    pub fn jittered<R: Rng>(&self, retry: u32, rng: &mut R) -> Duration {
        let base = self.backoff(retry);
        let jitter = base.as_secs_f64() * rng.gen_range(0.0..=0.1);
        base.saturating_add(Duration::try_from_secs_f64(jitter).unwrap_or(Duration::ZERO))
    }
}

/// Blocking `reqwest` transport with 429 backoff.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(retry: RetryPolicy) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("renewables-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, retry })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut retry = 0;

        loop {
            let resp = self.client.get(url).send().map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    TransportError::NetworkUnreachable(e.without_url().to_string())
                } else {
                    TransportError::Request(e.without_url().to_string())
                }
            })?;

            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if retry >= self.retry.max_retries {
                    warn!(retries = retry, "rate limited, giving up");
                    return Err(TransportError::RetriesExhausted {
                        retries: self.retry.max_retries,
                    });
                }

                // Honor Retry-After when the server asks for a longer pause.
                let retry_after = resp
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(Duration::ZERO);
                let wait = self
                    .retry
                    .jittered(retry, &mut rand::thread_rng())
                    .max(retry_after);

                debug!(
                    retry,
                    wait_secs = wait.as_secs_f64(),
                    "rate limited, retrying"
                );
                std::thread::sleep(wait);
                retry += 1;
                continue;
            }

            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp
                .text()
                .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

            return Ok(HttpResponse {
                status: status.as_u16(),
                content_type,
                body,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Instant;

    /// Serve one canned response per connection, in order, then stop.
    /// Returns the base URL and a handle yielding the number of requests seen.
    fn serve(responses: Vec<String>) -> (String, JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/wind/2023-01-01", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut served = 0;
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
                served += 1;
            }
            served
        });
        (url, handle)
    }

    fn response(status: &str, headers: &[&str], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
        for header in headers {
            out.push_str(header);
            out.push_str("\r\n");
        }
        out.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
        out
    }

    fn too_many_requests() -> String {
        response("429 Too Many Requests", &[], "")
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(5),
            multiplier: 1.5,
            max_retries,
        }
    }

    #[test]
    fn backoff_grows_geometrically() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_secs(1),
            multiplier: 1.5,
            max_retries: 5,
        };
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_millis(1500));
        assert_eq!(policy.backoff(2), Duration::from_millis(2250));
    }

    #[test]
    fn backoff_saturates_instead_of_panicking() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_secs(3600),
            multiplier: 1e6,
            max_retries: 100,
        };
        assert_eq!(policy.backoff(90), Duration::MAX);
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(42);
        for retry in 0..5 {
            let base = policy.backoff(retry);
            let wait = policy.jittered(retry, &mut rng);
            assert!(wait >= base);
            assert!(wait <= base.mul_f64(1.1) + Duration::from_micros(1));
        }
    }

    #[test]
    fn content_type_ignores_parameters() {
        let resp = HttpResponse::new(200, Some("text/csv; charset=utf-8"), "");
        assert!(resp.has_content_type("text/csv"));
        assert!(!resp.has_content_type("application/json"));

        let bare = HttpResponse::new(200, None, "");
        assert!(!bare.has_content_type("text/csv"));
    }

    #[test]
    fn success_is_2xx_only() {
        assert!(HttpResponse::new(204, None, "").is_success());
        assert!(!HttpResponse::new(301, None, "").is_success());
        assert!(!HttpResponse::new(429, None, "").is_success());
    }

    #[test]
    fn retries_rate_limits_until_success() {
        let (url, server) = serve(vec![
            too_many_requests(),
            too_many_requests(),
            response("200 OK", &["Content-Type: text/csv"], "a,b\n1,2\n"),
        ]);
        let transport = HttpTransport::new(fast_policy(5)).unwrap();

        let resp = transport.get(&url).unwrap();

        assert_eq!(resp.status, 200);
        assert!(resp.has_content_type("text/csv"));
        assert_eq!(resp.body, "a,b\n1,2\n");
        assert_eq!(server.join().unwrap(), 3);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let (url, server) = serve(vec![too_many_requests(); 3]);
        let transport = HttpTransport::new(fast_policy(2)).unwrap();

        let err = transport.get(&url).unwrap_err();

        assert!(matches!(err, TransportError::RetriesExhausted { retries: 2 }));
        assert_eq!(server.join().unwrap(), 3);
    }

    #[test]
    fn waits_at_least_retry_after() {
        let (url, server) = serve(vec![
            response("429 Too Many Requests", &["Retry-After: 1"], ""),
            response("200 OK", &["Content-Type: application/json"], "[]"),
        ]);
        let transport = HttpTransport::new(fast_policy(3)).unwrap();

        let started = Instant::now();
        let resp = transport.get(&url).unwrap();

        assert_eq!(resp.status, 200);
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(server.join().unwrap(), 2);
    }

    #[test]
    fn other_statuses_are_returned_without_retry() {
        let (url, server) = serve(vec![response("403 Forbidden", &[], "denied")]);
        let transport = HttpTransport::new(fast_policy(5)).unwrap();

        let resp = transport.get(&url).unwrap();

        assert_eq!(resp.status, 403);
        assert_eq!(resp.body, "denied");
        assert_eq!(server.join().unwrap(), 1);
    }

    #[test]
    fn refused_connection_is_network_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!(
            "http://{}/solar/2023-01-01?api_key=secret",
            listener.local_addr().unwrap()
        );
        drop(listener);
        let transport = HttpTransport::new(fast_policy(0)).unwrap();

        let err = transport.get(&url).unwrap_err();

        assert!(matches!(err, TransportError::NetworkUnreachable(_)));
        assert!(!err.to_string().contains("secret"));
    }
}
