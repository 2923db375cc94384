use crate::core::client::RetryingClient;
use crate::core::limiter::RateLimiter;
use crate::core::parse;
use crate::domain::model::{Link, Listing};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use url::Url;

/// Politeness pause after each job, sampled uniformly from this range.
/// An empty range disables the pause.
#[derive(Debug, Clone, Copy)]
pub struct PoliteDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for PoliteDelay {
    fn default() -> Self {
        Self {
            min_ms: 200,
            max_ms: 500,
        }
    }
}

impl PoliteDelay {
    pub const NONE: PoliteDelay = PoliteDelay {
        min_ms: 0,
        max_ms: 0,
    };

    fn sample(&self) -> Option<Duration> {
        if self.max_ms <= self.min_ms {
            return None;
        }
        let ms = {
            use rand::Rng;
            rand::thread_rng().gen_range(self.min_ms..self.max_ms)
        };
        Some(Duration::from_millis(ms))
    }
}

/// Fixed-size pool of fetch workers over a shared job queue. Each job
/// acquires one rate token, fetches through the retrying client and parses;
/// failures are logged and dropped, never fatal to siblings. `fetch_all`
/// returns only after every job has been observed complete.
pub struct DetailFetcher {
    client: Arc<RetryingClient>,
    limiter: Arc<RateLimiter>,
    base_url: Url,
    workers: usize,
    polite_delay: PoliteDelay,
}

impl DetailFetcher {
    pub fn new(
        client: Arc<RetryingClient>,
        limiter: Arc<RateLimiter>,
        base_url: Url,
        workers: usize,
        polite_delay: PoliteDelay,
    ) -> Self {
        Self {
            client,
            limiter,
            base_url,
            workers: workers.max(1),
            polite_delay,
        }
    }

    /// Discovered hrefs are resolved against the site base; `Url` takes
    /// care of percent-encoding whatever the page left raw.
    fn normalize(&self, link: &Link) -> Option<Url> {
        match self.base_url.join(&link.href) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(href = %link.href, error = %e, "unusable detail link");
                None
            }
        }
    }

    async fn fetch_one(&self, link: &Link) -> Option<Listing> {
        let url = self.normalize(link)?;

        self.limiter.wait().await;

        let html = match self.client.get_text(&url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(%url, error = %e, "detail fetch dropped");
                return None;
            }
        };

        // Insufficient data (no price or area) is the expected, frequent
        // case and is dropped silently.
        let listing = parse::parse_listing_detail(&html).into_listing(&link.neighborhood)?;
        tracing::debug!(
            neighborhood = %listing.neighborhood,
            price = listing.price,
            area = listing.area,
            "scraped listing"
        );
        Some(listing)
    }

    pub async fn fetch_all(self: Arc<Self>, links: Vec<Link>) -> Vec<Listing> {
        if links.is_empty() {
            return Vec::new();
        }

        let (tx, rx) = mpsc::channel::<Link>(links.len());
        for link in links {
            // Queue capacity covers every job; send cannot block here.
            if tx.send(link).await.is_err() {
                break;
            }
        }
        drop(tx);
        let rx = Arc::new(Mutex::new(rx));

        let mut pool = JoinSet::new();
        for _ in 0..self.workers {
            let rx = rx.clone();
            let fetcher = self.clone();
            pool.spawn(async move {
                let mut scraped = Vec::new();
                loop {
                    let job = { rx.lock().await.recv().await };
                    let Some(link) = job else { break };

                    if let Some(listing) = fetcher.fetch_one(&link).await {
                        scraped.push(listing);
                    }
                    if let Some(pause) = fetcher.polite_delay.sample() {
                        tokio::time::sleep(pause).await;
                    }
                }
                scraped
            });
        }

        // Join barrier: downstream sees the complete result set or nothing.
        let mut listings = Vec::new();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(mut scraped) => listings.append(&mut scraped),
                Err(e) => tracing::error!(error = %e, "fetch worker panicked"),
            }
        }
        listings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::RetryPolicy;
    use httpmock::prelude::*;

    fn fetcher(base: &str, workers: usize) -> Arc<DetailFetcher> {
        let client = RetryingClient::new(
            Duration::from_secs(5),
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(10),
            },
        )
        .unwrap();
        Arc::new(DetailFetcher::new(
            Arc::new(client),
            Arc::new(RateLimiter::new(100, Duration::from_secs(1))),
            Url::parse(base).unwrap(),
            workers,
            PoliteDelay::NONE,
        ))
    }

    fn detail_body(price: u32, area: &str) -> String {
        format!(
            r#"<html><body>
                <bdi class="new-price"><span class="format-money-int" value="{price}">{price}</span></bdi>
                <a class="tag-item">Shitet</a>
                <a class="tag-item"><span>Sipërfaqe:</span><bdi>{area} m2</bdi></a>
            </body></html>"#
        )
    }

    fn link(href: &str) -> Link {
        Link {
            href: href.to_string(),
            neighborhood: "Blloku".to_string(),
        }
    }

    #[tokio::test]
    async fn pool_collects_only_usable_listings() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/item/1");
            then.status(200).body(detail_body(100_000, "50"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/item/2");
            then.status(200).body(detail_body(150_000, "60"));
        });
        // no price on this one → insufficient data, silently dropped
        server.mock(|when, then| {
            when.method(GET).path("/item/3");
            then.status(200).body("<html><body>pa cmim</body></html>");
        });
        // and this one 404s → dropped after a typed failure
        server.mock(|when, then| {
            when.method(GET).path("/item/4");
            then.status(404);
        });

        let fetcher = fetcher(&server.base_url(), 4);
        let mut listings = fetcher
            .fetch_all(vec![
                link("/item/1"),
                link("/item/2"),
                link("/item/3"),
                link("/item/4"),
            ])
            .await;

        listings.sort_by_key(|l| l.price);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].price, 100_000);
        assert_eq!(listings[0].price_per_m2, 2000.0);
        assert_eq!(listings[1].price, 150_000);
        assert_eq!(listings[1].price_per_m2, 2500.0);
    }

    #[tokio::test]
    async fn failed_jobs_do_not_abort_siblings() {
        let server = MockServer::start();
        let broken = server.mock(|when, then| {
            when.method(GET).path("/item/down");
            then.status(503);
        });
        server.mock(|when, then| {
            when.method(GET).path("/item/ok");
            then.status(200).body(detail_body(120_000, "60"));
        });

        let fetcher = fetcher(&server.base_url(), 2);
        let listings = fetcher
            .fetch_all(vec![link("/item/down"), link("/item/ok")])
            .await;

        // retried to exhaustion, then dropped
        assert_eq!(broken.hits(), 2);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, 120_000);
    }

    #[tokio::test]
    async fn unusable_href_is_skipped() {
        let server = MockServer::start();
        let fetcher = fetcher(&server.base_url(), 2);
        let listings = fetcher.fetch_all(vec![link("http://[broken")]).await;
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn empty_link_list_is_a_noop() {
        let fetcher = fetcher("http://localhost:1", 2);
        assert!(fetcher.fetch_all(Vec::new()).await.is_empty());
    }
}
