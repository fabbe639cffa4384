//! # m3u-mirror
//!
//! Fetches a remote M3U playlist, mirrors every channel logo into a local
//! content-addressed store and publishes a rewritten playlist whose logo
//! links point at the mirror, together with a JSON run report.
//!
//! ## Pipeline
//!
//! 1. [`fetch`] downloads the source playlist, retrying with backoff
//! 2. [`parser`] turns the text into [`Channel`] records, skipping malformed entries
//! 3. [`mirror`] resolves logos with bounded concurrency; a failed logo never
//!    fails the run
//! 4. [`writer`] and [`report`] render the outputs from the final records
//!
//! ## Quick Start
//!
//! ```no_run
//! use m3u_mirror::{Config, Scraper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         source_url: "https://example.com/all.m3u".to_string(),
//!         github_repo: Some("someone/playlists".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let summary = Scraper::new(config)?.run().await?;
//!     println!(
//!         "{} channels, {:.1}% logo coverage",
//!         summary.report.total_channels, summary.report.logo_coverage_percent
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Channel records and mirror outcomes
pub mod channel;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// HTTP client for the playlist and logos
pub mod fetch;
/// Log files and subscriber setup
pub mod logging;
/// Content-addressed logo store
pub mod mirror;
/// M3U parsing
pub mod parser;
/// Run driver
pub mod pipeline;
/// Run report
pub mod report;
/// Retry logic with exponential backoff
pub mod retry;
/// Utility functions
pub mod utils;
/// Playlist rendering
pub mod writer;

pub use channel::{Channel, MirrorOutcome, MirrorSummary};
pub use config::Config;
pub use error::{AssetError, Error, Result};
pub use fetch::HttpFetcher;
pub use mirror::{AssetFetcher, AssetMirror};
pub use parser::parse_playlist;
pub use pipeline::{RunSummary, Scraper, SmokeTestSummary};
pub use report::{RunReport, summarize};
pub use writer::render_playlist;
