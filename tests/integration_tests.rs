use async_trait::async_trait;
use httpmock::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tirana_index::domain::ports::{ConfigProvider, RenderSession, SessionFactory};
use tirana_index::utils::error::{Result, ScrapeError};
use tirana_index::{
    IndexEngine, LocalStorage, Neighborhood, NeighborhoodIndex, ScrapePipeline, ScrapeSettings,
};

struct TestConfig;

impl ConfigProvider for TestConfig {
    fn output_path(&self) -> &str {
        "test_output"
    }

    fn listings_file(&self) -> &str {
        "listings_data.csv"
    }

    fn history_file(&self) -> &str {
        "historical_indices.csv"
    }

    fn batch_size(&self) -> usize {
        2
    }

    fn workers(&self) -> usize {
        4
    }

    fn requests_per_second(&self) -> u32 {
        100
    }
}

/// Serves canned search pages; URLs without a canned page render empty.
struct CannedSession {
    pages: HashMap<String, String>,
}

#[async_trait]
impl RenderSession for CannedSession {
    async fn page_source(&mut self, url: &str) -> Result<String> {
        Ok(self
            .pages
            .iter()
            .find(|(slug, _)| url.contains(slug.as_str()))
            .map(|(_, html)| html.clone())
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct CannedFactory {
    pages: HashMap<String, String>,
    started: Arc<AtomicUsize>,
    fail_all: bool,
}

impl CannedFactory {
    fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            started: Arc::new(AtomicUsize::new(0)),
            fail_all: false,
        }
    }
}

#[async_trait]
impl SessionFactory for CannedFactory {
    type Session = CannedSession;

    async fn start(&self) -> Result<Self::Session> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            return Err(ScrapeError::Processing {
                message: "webdriver not reachable".to_string(),
            });
        }
        Ok(CannedSession {
            pages: self.pages.clone(),
        })
    }
}

fn fast_settings(detail_base: &str) -> ScrapeSettings {
    let mut settings = ScrapeSettings::default();
    settings.site.base_url = detail_base.to_string();
    settings.site.search_template = "https://search.test/q-{}".to_string();
    settings.fetch.backoff_base_ms = 10;
    settings.fetch.polite_delay_min_ms = 0;
    settings.fetch.polite_delay_max_ms = 0;
    settings
}

fn sale_detail(price: u32, area: u32) -> String {
    format!(
        r#"<html><body>
            <bdi class="new-price"><span class="format-money-int" value="{price}">{price}</span></bdi>
            <a class="tag-item">Shitet</a>
            <a class="tag-item"><span>Numri i dhomave:</span><bdi>2</bdi></a>
            <a class="tag-item"><span>Sipërfaqe:</span><bdi>{area} m2</bdi></a>
        </body></html>"#
    )
}

fn blloku_search_page() -> String {
    r#"<html><body>
        <a class="Link_vis" href="/item/1">njoftim 1</a>
        <a class="Link_vis" href="/item/2">njoftim 2</a>
        <a class="Link_vis" href="/item/3">njoftim 3</a>
    </body></html>"#
        .to_string()
}

fn read_history(dir: &TempDir) -> Vec<NeighborhoodIndex> {
    let path = dir.path().join("historical_indices.csv");
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().collect::<std::result::Result<_, _>>().unwrap()
}

#[tokio::test]
async fn test_end_to_end_two_neighborhood_run() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    // Blloku yields 3 links; two parse as sale listings, one has no price.
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/item/1");
        then.status(200).body(sale_detail(100_000, 50));
    });
    server.mock(|when, then| {
        when.method(GET).path("/item/2");
        then.status(200).body(sale_detail(150_000, 60));
    });
    server.mock(|when, then| {
        when.method(GET).path("/item/3");
        then.status(200)
            .body("<html><body>cmimi mungon</body></html>");
    });

    let mut pages = HashMap::new();
    pages.insert("q-blloku".to_string(), blloku_search_page());
    let factory = CannedFactory::new(pages);
    let sessions_started = factory.started.clone();

    let pipeline = ScrapePipeline::new(
        LocalStorage::new(output_path),
        TestConfig,
        fast_settings(&server.base_url()),
        factory,
        vec![Neighborhood::new("Blloku"), Neighborhood::new("Kombinat")],
    );
    let engine = IndexEngine::new(pipeline);

    let output = engine.run().await.unwrap();
    assert_eq!(output, "test_output/historical_indices.csv");

    // one batch of two neighborhoods → a single renderer session
    assert_eq!(sessions_started.load(Ordering::SeqCst), 1);

    let history = read_history(&temp_dir);
    assert_eq!(history.len(), 1);
    let row = &history[0];
    assert_eq!(row.neighborhood, "Blloku");
    assert_eq!(row.date, chrono::Local::now().date_naive());
    // mean of 100000/50=2000 and 150000/60=2500
    assert_eq!(row.avg_sale_price_per_m2, Some(2250.0));
    assert_eq!(row.avg_rent_price, None);
    assert_eq!(row.avg_rent_price_per_m2, None);
    assert_eq!(row.avg_rooms, Some(2.0));

    let listings =
        std::fs::read_to_string(temp_dir.path().join("listings_data.csv")).unwrap();
    let mut lines = listings.lines();
    assert_eq!(
        lines.next().unwrap(),
        "neighborhood,price,rooms,area,category,price_per_m2"
    );
    assert_eq!(lines.clone().count(), 2);
    assert!(lines.all(|l| l.starts_with("Blloku,")));
}

#[tokio::test]
async fn test_three_neighborhoods_use_two_sessions() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let factory = CannedFactory::new(HashMap::new());
    let sessions_started = factory.started.clone();

    let pipeline = ScrapePipeline::new(
        LocalStorage::new(temp_dir.path().to_str().unwrap().to_string()),
        TestConfig,
        fast_settings(&server.base_url()),
        factory,
        vec![
            Neighborhood::new("Blloku"),
            Neighborhood::new("Kombinat"),
            Neighborhood::new("Lapraka"),
        ],
    );

    IndexEngine::new(pipeline).run().await.unwrap();

    // batch size 2 over 3 neighborhoods → two sequential sessions
    assert_eq!(sessions_started.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rerun_same_day_keeps_one_row_per_neighborhood() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/item/1");
        then.status(200).body(sale_detail(100_000, 50));
    });

    let search = r#"<a class="Link_vis" href="/item/1">njoftim</a>"#.to_string();

    for _ in 0..2 {
        let mut pages = HashMap::new();
        pages.insert("q-blloku".to_string(), search.clone());
        let pipeline = ScrapePipeline::new(
            LocalStorage::new(output_path.clone()),
            TestConfig,
            fast_settings(&server.base_url()),
            CannedFactory::new(pages),
            vec![Neighborhood::new("Blloku")],
        );
        IndexEngine::new(pipeline).run().await.unwrap();
    }

    // merge-by-key: the second run replaced the first run's row
    let history = read_history(&temp_dir);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].avg_sale_price_per_m2, Some(2000.0));
}

#[tokio::test]
async fn test_run_completes_when_no_session_can_start() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let mut factory = CannedFactory::new(HashMap::new());
    factory.fail_all = true;

    let pipeline = ScrapePipeline::new(
        LocalStorage::new(temp_dir.path().to_str().unwrap().to_string()),
        TestConfig,
        fast_settings(&server.base_url()),
        factory,
        vec![Neighborhood::new("Blloku"), Neighborhood::new("Kombinat")],
    );

    // every batch lost its session, but the run still completes and
    // writes (empty) artifacts rather than erroring out
    IndexEngine::new(pipeline).run().await.unwrap();

    assert!(temp_dir.path().join("listings_data.csv").exists());
    assert!(temp_dir.path().join("historical_indices.csv").exists());
    let history = std::fs::read_to_string(temp_dir.path().join("historical_indices.csv")).unwrap();
    assert!(history.is_empty());
}
