//! Finds the matches of a team on hltv.org, downloads their demo archives, extracts the replays
//! and offers them to a replay store that deduplicates by SHA-1.

pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod markup;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod service;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, Stage};
pub use error::{Error, Result};
pub use model::Summary;
pub use pipeline::{run, Pipeline};
