//! Run driver wiring fetch, parse, mirror, render and report together
//!
//! A [`Scraper`] owns everything one run needs: the validated configuration
//! and the HTTP client. There is no global state, so several scrapers with
//! different configurations can coexist (the tests rely on this).

use crate::channel::{Channel, MirrorSummary};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::HttpFetcher;
use crate::mirror::AssetMirror;
use crate::parser::parse_playlist;
use crate::report::{RunReport, summarize};
use crate::utils::{ensure_dir, write_atomic};
use crate::writer::render_playlist;
use chrono::Utc;
use std::path::PathBuf;

/// What a completed run produced
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Report written to `report_path`
    pub report: RunReport,
    /// Tally of logo outcomes
    pub mirror: MirrorSummary,
    /// Where the rewritten playlist was written
    pub playlist_path: PathBuf,
    /// Where the JSON report was written
    pub report_path: PathBuf,
}

/// Result of a smoke test
#[derive(Clone, Debug)]
pub struct SmokeTestSummary {
    /// Characters in the fetched playlist
    pub fetched_chars: usize,
    /// Channels parsed from it
    pub parsed_channels: usize,
    /// Channels whose logos were mirrored as a sample
    pub sampled: Vec<Channel>,
    /// Tally of the sample's logo outcomes
    pub mirror: MirrorSummary,
}

/// Per-run context
pub struct Scraper {
    config: Config,
    fetcher: HttpFetcher,
}

impl Scraper {
    /// Validate `config` and build the HTTP client
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }

    /// Configuration this scraper runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch and parse the source playlist
    ///
    /// An empty result is [`Error::EmptyPlaylist`].
    async fn fetch_channels(&self) -> Result<(usize, Vec<Channel>)> {
        let source_url = &self.config.source_url;
        let content = self.fetcher.fetch_playlist(source_url).await?;
        let channels = parse_playlist(&content);
        if channels.is_empty() {
            return Err(Error::EmptyPlaylist {
                source_url: source_url.clone(),
            });
        }
        Ok((content.chars().count(), channels))
    }

    fn asset_mirror(&self) -> AssetMirror<HttpFetcher> {
        AssetMirror::from_config(self.fetcher.clone(), &self.config)
    }

    /// Execute the full pipeline and write both outputs
    ///
    /// Aborts only on a fetch failure, an empty playlist, or an error writing
    /// the outputs. Logos that cannot be mirrored lower the coverage but do
    /// not fail the run.
    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!(source = %self.config.source_url, "scraper started");

        let (_, mut channels) = self.fetch_channels().await?;

        ensure_dir(&self.config.paths.logos_dir).await?;
        ensure_dir(&self.config.paths.output_dir).await?;

        let outcomes = self.asset_mirror().mirror(&mut channels).await;
        let mirror = MirrorSummary::from_outcomes(&outcomes);

        let generated_at = Utc::now();
        let base_logo_url = self.config.logo_base_url();
        let playlist = render_playlist(
            &channels,
            base_logo_url.as_deref(),
            &self.config.playlist_title,
            &generated_at,
        );

        let playlist_path = self.config.playlist_path();
        write_atomic(&playlist_path, playlist.as_bytes()).await?;
        tracing::info!(path = %playlist_path.display(), "saved playlist");

        let report = summarize(&channels, &self.config.source_url, generated_at)?;
        let report_path = self.config.report_path();
        report.save(&report_path).await?;

        tracing::info!(
            channels = report.total_channels,
            logos = report.channels_with_logos,
            "scraper completed, {:.1}% logo coverage",
            report.logo_coverage_percent
        );

        Ok(RunSummary {
            report,
            mirror,
            playlist_path,
            report_path,
        })
    }

    /// Fetch, parse and mirror the first `sample` channels' logos
    ///
    /// Neither the playlist nor the report is written.
    pub async fn smoke_test(&self, sample: usize) -> Result<SmokeTestSummary> {
        let (fetched_chars, channels) = self.fetch_channels().await?;
        let parsed_channels = channels.len();
        tracing::info!(fetched_chars, parsed_channels, sample, "smoke test");

        let mut sampled: Vec<Channel> = channels.into_iter().take(sample).collect();
        ensure_dir(&self.config.paths.logos_dir).await?;
        let outcomes = self.asset_mirror().mirror(&mut sampled).await;

        Ok(SmokeTestSummary {
            fetched_chars,
            parsed_channels,
            sampled,
            mirror: MirrorSummary::from_outcomes(&outcomes),
        })
    }
}
