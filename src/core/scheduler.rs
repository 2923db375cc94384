use crate::core::fetcher::DetailFetcher;
use crate::core::render;
use crate::domain::model::{Listing, Neighborhood};
use crate::domain::ports::{RenderSession, SessionFactory};
use std::sync::Arc;

/// Outer crawl loop: neighborhoods are processed in fixed-size batches,
/// each batch owning one renderer session for its whole lifetime.
/// Concurrency exists only inside a neighborhood's detail-fetch phase.
pub struct BatchScheduler<'a, F: SessionFactory> {
    factory: &'a F,
    fetcher: Arc<DetailFetcher>,
    search_template: &'a str,
    batch_size: usize,
}

impl<'a, F: SessionFactory> BatchScheduler<'a, F> {
    pub fn new(
        factory: &'a F,
        fetcher: Arc<DetailFetcher>,
        search_template: &'a str,
        batch_size: usize,
    ) -> Self {
        Self {
            factory,
            fetcher,
            search_template,
            batch_size: batch_size.max(1),
        }
    }

    /// Never fails as a whole: a batch whose session cannot start is
    /// skipped, everything else proceeds and whatever succeeded is
    /// returned.
    pub async fn run(&self, neighborhoods: &[Neighborhood]) -> Vec<Listing> {
        let mut all = Vec::new();

        for (batch_no, batch) in neighborhoods.chunks(self.batch_size).enumerate() {
            let mut session = match self.factory.start().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(
                        batch = batch_no + 1,
                        error = %e,
                        "renderer session failed to start, skipping batch"
                    );
                    continue;
                }
            };

            // No early exit between here and close(): per-neighborhood
            // failures are absorbed inside process_batch.
            let listings = self.process_batch(&mut session, batch).await;
            if let Err(e) = session.close().await {
                tracing::warn!(batch = batch_no + 1, error = %e, "session close failed");
            }

            tracing::info!(
                batch = batch_no + 1,
                listings = listings.len(),
                "batch finished"
            );
            all.extend(listings);
        }

        all
    }

    async fn process_batch(
        &self,
        session: &mut F::Session,
        batch: &[Neighborhood],
    ) -> Vec<Listing> {
        let mut listings = Vec::new();

        for neighborhood in batch {
            let url = match neighborhood.search_url(self.search_template) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(
                        neighborhood = %neighborhood.name,
                        error = %e,
                        "could not build search URL"
                    );
                    continue;
                }
            };

            tracing::info!(neighborhood = %neighborhood.name, %url, "loading search page");
            let html = match session.page_source(url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!(
                        neighborhood = %neighborhood.name,
                        error = %e,
                        "search page failed, skipping neighborhood"
                    );
                    continue;
                }
            };

            let links = render::extract_links(&html, neighborhood);
            if links.is_empty() {
                tracing::info!(neighborhood = %neighborhood.name, "no listings this run");
                continue;
            }

            let scraped = self.fetcher.clone().fetch_all(links).await;
            tracing::info!(
                neighborhood = %neighborhood.name,
                listings = scraped.len(),
                "✅ neighborhood finished"
            );
            listings.extend(scraped);
        }

        listings
    }
}
