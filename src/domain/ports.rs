use crate::domain::model::{Listing, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Artifact I/O, relative to an implementation-defined base location.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn listings_file(&self) -> &str;
    fn history_file(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn workers(&self) -> usize;
    fn requests_per_second(&self) -> u32;
}

/// One live JS-capable renderer session. Used by exactly one neighborhood
/// at a time; `close` must be safe to call on every exit path.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to `url`, waits for the page to settle and returns the
    /// rendered document.
    async fn page_source(&mut self, url: &str) -> Result<String>;

    async fn close(&mut self) -> Result<()>;
}

/// Acquires renderer sessions; the batch loop owns one per batch.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: RenderSession;

    async fn start(&self) -> Result<Self::Session>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Listing>>;
    async fn transform(&self, listings: Vec<Listing>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
