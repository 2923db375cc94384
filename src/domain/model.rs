use crate::utils::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// A neighborhood to crawl. Loaded once per run from the input CSV
/// (one name per row) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhood {
    pub name: String,
}

impl Neighborhood {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// One name per row, no header. Blank rows are skipped.
    pub fn load_from_csv(path: &str) -> Result<Vec<Neighborhood>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut neighborhoods = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(name) = record.get(0) {
                let name = name.trim();
                if !name.is_empty() {
                    neighborhoods.push(Neighborhood::new(name));
                }
            }
        }
        Ok(neighborhoods)
    }

    /// URL-safe identifier: trimmed, lowercased, spaces to hyphens.
    /// Non-ASCII characters are percent-encoded when the search URL is built.
    pub fn slug(&self) -> String {
        self.name.trim().to_lowercase().replace(' ', "-")
    }

    /// Substitutes the slug into the search URL template. Parsing through
    /// `Url` percent-encodes whatever the slug left unencoded.
    pub fn search_url(&self, template: &str) -> Result<Url> {
        let raw = template.replace("{}", &self.slug());
        Ok(Url::parse(&raw)?)
    }
}

/// A candidate detail-page link discovered on a neighborhood's search page.
/// Ephemeral: produced by the renderer, consumed by one fetch job.
#[derive(Debug, Clone)]
pub struct Link {
    pub href: String,
    pub neighborhood: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Sale,
    Rent,
}

/// One parsed listing. `price_per_m2` is always `price / area`, computed
/// once at construction; `area > 0` is guaranteed by the constructor path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub neighborhood: String,
    pub price: i64,
    pub rooms: Option<u32>,
    pub area: f64,
    pub category: Category,
    pub price_per_m2: f64,
}

impl Listing {
    pub fn new(
        neighborhood: impl Into<String>,
        price: i64,
        rooms: Option<u32>,
        area: f64,
        category: Category,
    ) -> Self {
        Self {
            neighborhood: neighborhood.into(),
            price,
            rooms,
            area,
            category,
            price_per_m2: price as f64 / area,
        }
    }
}

/// One row of the historical index log, keyed by (date, neighborhood).
/// Averages are absent (not zero) when the backing subset was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodIndex {
    pub date: NaiveDate,
    pub neighborhood: String,
    pub avg_sale_price_per_m2: Option<f64>,
    pub avg_rent_price: Option<f64>,
    pub avg_rent_price_per_m2: Option<f64>,
    pub avg_rooms: Option<f64>,
}

/// Output of the transform phase: the cleaned listings table and the index
/// rows to merge into the historical log.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub cleaned: Vec<Listing>,
    pub indices: Vec<NeighborhoodIndex>,
}
