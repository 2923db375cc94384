use crate::domain::model::{Link, Neighborhood};
use crate::domain::ports::{RenderSession, SessionFactory};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

/// One way of pulling candidate listing anchors out of a rendered search
/// page. Strategies are tried in order; the first non-empty result wins.
enum LinkStrategy {
    /// Select anchors directly.
    Anchors(&'static str),
    /// Select containers, take the first href-carrying anchor of each.
    FirstAnchorIn(&'static str),
}

const LINK_STRATEGIES: &[(&str, LinkStrategy)] = &[
    ("primary", LinkStrategy::Anchors("a.Link_vis")),
    (
        "fallback",
        LinkStrategy::FirstAnchorIn("li.announcement-item"),
    ),
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

impl LinkStrategy {
    fn extract(&self, doc: &Html) -> Vec<String> {
        let anchor = selector("a[href]");
        match self {
            LinkStrategy::Anchors(css) => doc
                .select(&selector(css))
                .filter_map(|el| el.value().attr("href"))
                .map(str::to_string)
                .collect(),
            LinkStrategy::FirstAnchorIn(css) => doc
                .select(&selector(css))
                .filter_map(|container| container.select(&anchor).next())
                .filter_map(|el| el.value().attr("href"))
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Candidate links for one neighborhood, in page order. An empty result is
/// a valid outcome, not an error.
pub fn extract_links(html: &str, neighborhood: &Neighborhood) -> Vec<Link> {
    let doc = Html::parse_document(html);

    for (name, strategy) in LINK_STRATEGIES {
        let hrefs = strategy.extract(&doc);
        if !hrefs.is_empty() {
            tracing::info!(
                neighborhood = %neighborhood.name,
                strategy = *name,
                anchors = hrefs.len(),
                "anchors found"
            );
            return hrefs
                .into_iter()
                .map(|href| Link {
                    href,
                    neighborhood: neighborhood.name.clone(),
                })
                .collect();
        }
    }

    tracing::info!(neighborhood = %neighborhood.name, "no anchors with any strategy");
    Vec::new()
}

/// WebDriver-backed session; navigation settles for a fixed delay before
/// the rendered source is read.
pub struct WebDriverSession {
    client: Option<fantoccini::Client>,
    settle: Duration,
    render_timeout: Duration,
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn page_source(&mut self, url: &str) -> Result<String> {
        let render_timeout = self.render_timeout;
        let settle = self.settle;
        let client = self.client.as_mut().ok_or_else(|| ScrapeError::Processing {
            message: "render session already closed".to_string(),
        })?;

        tokio::time::timeout(render_timeout, client.goto(url))
            .await
            .map_err(|_| ScrapeError::RenderTimeout {
                url: url.to_string(),
                seconds: render_timeout.as_secs(),
            })??;

        tokio::time::sleep(settle).await;
        Ok(client.source().await?)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }
}

/// Connects headless Chrome sessions through a WebDriver endpoint.
pub struct WebDriverFactory {
    webdriver_url: String,
    settle: Duration,
    render_timeout: Duration,
}

impl WebDriverFactory {
    pub fn new(webdriver_url: String, settle: Duration, render_timeout: Duration) -> Self {
        Self {
            webdriver_url,
            settle,
            render_timeout,
        }
    }

    fn capabilities() -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": [
                    "--headless",
                    "--disable-gpu",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                ]
            }),
        );
        caps
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    type Session = WebDriverSession;

    async fn start(&self) -> Result<Self::Session> {
        let mut builder = fantoccini::ClientBuilder::native();
        builder.capabilities(Self::capabilities());
        let client = builder.connect(&self.webdriver_url).await?;

        Ok(WebDriverSession {
            client: Some(client),
            settle: self.settle,
            render_timeout: self.render_timeout,
        })
    }
}
