//! Run report: totals, logo coverage and per-group counts

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::utils::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Group name used in the report for channels with an empty `group-title`
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Aggregate statistics for one run, written as `stats.json`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Number of channels in the rewritten playlist
    pub total_channels: usize,
    /// Channels whose logo was mirrored
    pub channels_with_logos: usize,
    /// `channels_with_logos / total_channels * 100`, one decimal place
    pub logo_coverage_percent: f64,
    /// Channel count per group
    pub groups: BTreeMap<String, usize>,
    /// When the run produced its outputs
    pub generated_at: DateTime<Utc>,
    /// Playlist the channels came from
    pub source_url: String,
}

/// Build the report from the final channel list
///
/// Fails with [`Error::EmptyPlaylist`] when there are no channels, since
/// coverage is undefined.
pub fn summarize(
    channels: &[Channel],
    source_url: &str,
    generated_at: DateTime<Utc>,
) -> Result<RunReport> {
    if channels.is_empty() {
        return Err(Error::EmptyPlaylist {
            source_url: source_url.to_string(),
        });
    }

    let channels_with_logos = channels.iter().filter(|c| c.has_local_logo()).count();
    let mut groups = BTreeMap::new();
    for channel in channels {
        let group = if channel.group.is_empty() {
            UNKNOWN_GROUP
        } else {
            channel.group.as_str()
        };
        *groups.entry(group.to_string()).or_insert(0) += 1;
    }

    Ok(RunReport {
        total_channels: channels.len(),
        channels_with_logos,
        logo_coverage_percent: round_one_decimal(
            channels_with_logos as f64 / channels.len() as f64 * 100.0,
        ),
        groups,
        generated_at,
        source_url: source_url.to_string(),
    })
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

impl RunReport {
    /// Write the report as pretty-printed JSON, replacing any previous file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json).await?;
        tracing::info!(path = %path.display(), "saved run report");
        Ok(())
    }

    /// Read a report written by [`save`](Self::save)
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ReportNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Groups ordered by channel count, largest first, ties by name
    pub fn groups_by_size(&self) -> Vec<(&str, usize)> {
        let mut groups: Vec<(&str, usize)> = self
            .groups
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        groups
    }

    /// Human-readable summary printed by the `analyze` command
    pub fn render_summary(&self) -> String {
        let mut lines = vec![
            "Playlist Analysis".to_string(),
            format!("Source: {}", self.source_url),
            format!(
                "Generated: {}",
                self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            format!("Total channels: {}", self.total_channels),
            format!("Channels with logos: {}", self.channels_with_logos),
            format!("Logo coverage: {:.1}%", self.logo_coverage_percent),
            String::new(),
            format!("Groups ({}):", self.groups.len()),
        ];
        for (name, count) in self.groups_by_size() {
            lines.push(format!("  {name}: {count}"));
        }
        lines.join("\n")
    }
}
