use crate::utils::error::{Result, ScrapeError};
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Rotated uniformly at random per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.127 Safari/537.36",
];

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Transient statuses worth another attempt.
    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
    }

    fn is_retryable_transport(&self, err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }
}

/// HTTP client with per-call timeout, rotating User-Agent and bounded
/// exponential backoff on transient failures. Exhausted retries and
/// non-retryable statuses surface as typed errors; the fetch pool treats
/// both as "drop this listing".
pub struct RetryingClient {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, policy })
    }

    fn pick_user_agent(&self) -> &'static str {
        USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let mut delay = self.policy.base_delay;

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }

            let result = self
                .client
                .get(url.clone())
                .header(USER_AGENT, self.pick_user_agent())
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text().await?);
                    }
                    if self.policy.is_retryable_status(status) {
                        tracing::debug!(%url, %status, attempt, "transient status, backing off");
                        continue;
                    }
                    return Err(ScrapeError::HttpStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                Err(err) if self.policy.is_retryable_transport(&err) => {
                    tracing::debug!(%url, error = %err, attempt, "transport error, backing off");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ScrapeError::RetryExhausted {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
        })
    }
}
