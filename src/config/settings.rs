use crate::core::clean::CleaningThresholds;
use crate::utils::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Site-specific knobs, overridable from a TOML file. Defaults target the
/// MerrJep Tirane apartment section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub base_url: String,
    /// `{}` is replaced by the neighborhood slug.
    pub search_template: String,
    pub settle_seconds: u64,
    pub render_timeout_seconds: u64,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.merrjep.al".to_string(),
            search_template:
                "https://www.merrjep.al/njoftime/imobiliare-vendbanime/apartamente/tirane/q-{}"
                    .to_string(),
            settle_seconds: 2,
            render_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub polite_delay_min_ms: u64,
    pub polite_delay_max_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_attempts: 5,
            backoff_base_ms: 1000,
            polite_delay_min_ms: 200,
            polite_delay_max_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    pub site: SiteSettings,
    pub fetch: FetchSettings,
    pub cleaning: CleaningThresholds,
}

impl ScrapeSettings {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ScrapeError::Config {
            message: format!("invalid settings file {}: {}", path.display(), e),
        })
    }

    /// File if given, compiled-in defaults otherwise.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Ok(Self::default()),
        }
    }
}
