use crate::domain::model::NeighborhoodIndex;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScrapeError};
use std::collections::HashSet;

/// Sole writer of the historical index log.
///
/// Rerun policy: merge-by-key. Existing rows whose (date, neighborhood)
/// matches an incoming row are replaced; everything else is preserved and
/// today's rows are appended. The log stays one row per (date,
/// neighborhood).
pub struct HistoricalAppender<'a, S: Storage> {
    storage: &'a S,
    path: &'a str,
}

impl<'a, S: Storage> HistoricalAppender<'a, S> {
    pub fn new(storage: &'a S, path: &'a str) -> Self {
        Self { storage, path }
    }

    async fn read_existing(&self) -> Result<Vec<NeighborhoodIndex>> {
        let bytes = match self.storage.read_file(self.path).await {
            Ok(bytes) => bytes,
            Err(ScrapeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Merges today's rows into the log and returns the total row count
    /// after the merge.
    pub async fn append(&self, rows: Vec<NeighborhoodIndex>) -> Result<usize> {
        let mut merged = self.read_existing().await?;

        let before = merged.len();
        {
            let incoming_keys: HashSet<(chrono::NaiveDate, &str)> = rows
                .iter()
                .map(|r| (r.date, r.neighborhood.as_str()))
                .collect();
            merged.retain(|r| !incoming_keys.contains(&(r.date, r.neighborhood.as_str())));
        }
        let replaced = before - merged.len();

        merged.extend(rows);

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &merged {
            writer.serialize(row)?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| ScrapeError::Processing {
                message: format!("flushing historical index CSV: {e}"),
            })?;

        self.storage.write_file(self.path, &data).await?;

        if replaced > 0 {
            tracing::warn!(replaced, "rerun replaced existing rows for the same day");
        }
        Ok(merged.len())
    }
}
