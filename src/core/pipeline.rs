use crate::config::settings::ScrapeSettings;
use crate::core::clean;
use crate::core::client::{RetryPolicy, RetryingClient};
use crate::core::fetcher::{DetailFetcher, PoliteDelay};
use crate::core::history::HistoricalAppender;
use crate::core::limiter::RateLimiter;
use crate::core::scheduler::BatchScheduler;
use crate::core::{aggregate, ConfigProvider, Pipeline, SessionFactory, Storage};
use crate::domain::model::{Listing, Neighborhood, TransformResult};
use crate::utils::error::{Result, ScrapeError};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The crawl-and-aggregate pipeline: extract crawls every neighborhood,
/// transform cleans and aggregates, load persists the two artifacts.
pub struct ScrapePipeline<S: Storage, C: ConfigProvider, F: SessionFactory> {
    storage: S,
    config: C,
    settings: ScrapeSettings,
    factory: F,
    neighborhoods: Vec<Neighborhood>,
}

impl<S: Storage, C: ConfigProvider, F: SessionFactory> ScrapePipeline<S, C, F> {
    pub fn new(
        storage: S,
        config: C,
        settings: ScrapeSettings,
        factory: F,
        neighborhoods: Vec<Neighborhood>,
    ) -> Self {
        Self {
            storage,
            config,
            settings,
            factory,
            neighborhoods,
        }
    }

    fn listings_csv(listings: &[Listing]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for listing in listings {
            writer.serialize(listing)?;
        }
        writer.into_inner().map_err(|e| ScrapeError::Processing {
            message: format!("flushing listings CSV: {e}"),
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, F: SessionFactory> Pipeline for ScrapePipeline<S, C, F> {
    async fn extract(&self) -> Result<Vec<Listing>> {
        let limiter = Arc::new(RateLimiter::new(
            self.config.requests_per_second(),
            Duration::from_secs(1),
        ));
        let client = Arc::new(RetryingClient::new(
            Duration::from_secs(self.settings.fetch.timeout_seconds),
            RetryPolicy {
                max_attempts: self.settings.fetch.max_attempts,
                base_delay: Duration::from_millis(self.settings.fetch.backoff_base_ms),
            },
        )?);
        let fetcher = Arc::new(DetailFetcher::new(
            client,
            limiter,
            Url::parse(&self.settings.site.base_url)?,
            self.config.workers(),
            PoliteDelay {
                min_ms: self.settings.fetch.polite_delay_min_ms,
                max_ms: self.settings.fetch.polite_delay_max_ms,
            },
        ));

        let scheduler = BatchScheduler::new(
            &self.factory,
            fetcher,
            &self.settings.site.search_template,
            self.config.batch_size(),
        );

        tracing::info!(
            neighborhoods = self.neighborhoods.len(),
            batch_size = self.config.batch_size(),
            workers = self.config.workers(),
            "starting crawl"
        );
        Ok(scheduler.run(&self.neighborhoods).await)
    }

    async fn transform(&self, listings: Vec<Listing>) -> Result<TransformResult> {
        let cleaned = clean::clean(listings, &self.settings.cleaning);
        let today = chrono::Local::now().date_naive();
        let indices = aggregate::aggregate(today, &cleaned);

        // Partial coverage is expected; make the gaps visible rather than
        // letting a thin run pass for a full one.
        let missing: Vec<&str> = self
            .neighborhoods
            .iter()
            .filter(|nb| !indices.iter().any(|row| row.neighborhood == nb.name))
            .map(|nb| nb.name.as_str())
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                ?missing,
                "no index rows for {} of {} neighborhoods this run",
                missing.len(),
                self.neighborhoods.len()
            );
        }

        Ok(TransformResult { cleaned, indices })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let listings_csv = Self::listings_csv(&result.cleaned)?;
        self.storage
            .write_file(self.config.listings_file(), &listings_csv)
            .await?;
        tracing::info!(
            listings = result.cleaned.len(),
            file = self.config.listings_file(),
            "saved cleaned listings"
        );

        let appender = HistoricalAppender::new(&self.storage, self.config.history_file());
        let total_rows = appender.append(result.indices).await?;
        tracing::info!(
            total_rows,
            file = self.config.history_file(),
            "appended today's indices"
        );

        Ok(format!(
            "{}/{}",
            self.config.output_path(),
            self.config.history_file()
        ))
    }
}
