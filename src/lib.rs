pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::ScrapeSettings;
pub use core::{engine::IndexEngine, pipeline::ScrapePipeline, render::WebDriverFactory};
pub use domain::model::{Listing, Neighborhood, NeighborhoodIndex};
pub use utils::error::{Result, ScrapeError};
