use crate::domain::model::{Category, Listing};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Plausibility bounds, inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningThresholds {
    pub min_area: f64,
    pub max_area: f64,
    pub min_price_per_m2: f64,
    pub max_price_per_m2: f64,
}

impl Default for CleaningThresholds {
    fn default() -> Self {
        Self {
            min_area: 20.0,
            max_area: 500.0,
            min_price_per_m2: 200.0,
            max_price_per_m2: 5000.0,
        }
    }
}

impl CleaningThresholds {
    fn is_plausible(&self, listing: &Listing) -> bool {
        listing.area >= self.min_area
            && listing.area <= self.max_area
            && listing.price_per_m2 >= self.min_price_per_m2
            && listing.price_per_m2 <= self.max_price_per_m2
    }
}

type DedupKey = (String, i64, Option<u32>, u64, Category);

fn dedup_key(listing: &Listing) -> DedupKey {
    (
        listing.neighborhood.clone(),
        listing.price,
        listing.rooms,
        listing.area.to_bits(),
        listing.category,
    )
}

/// Drops implausible listings and exact duplicates. Remaining order is not
/// significant downstream.
pub fn clean(listings: Vec<Listing>, thresholds: &CleaningThresholds) -> Vec<Listing> {
    let before = listings.len();
    let mut seen: HashSet<DedupKey> = HashSet::new();

    let cleaned: Vec<Listing> = listings
        .into_iter()
        .filter(|l| thresholds.is_plausible(l))
        .filter(|l| seen.insert(dedup_key(l)))
        .collect();

    tracing::info!(
        raw = before,
        cleaned = cleaned.len(),
        dropped = before - cleaned.len(),
        "cleaned listings"
    );
    cleaned
}
