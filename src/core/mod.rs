pub mod aggregate;
pub mod clean;
pub mod client;
pub mod engine;
pub mod fetcher;
pub mod history;
pub mod limiter;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod scheduler;

pub use crate::domain::model::{
    Category, Link, Listing, Neighborhood, NeighborhoodIndex, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RenderSession, SessionFactory, Storage};
pub use crate::utils::error::Result;
