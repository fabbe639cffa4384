//! Channel records and per-record mirror outcomes

use serde::{Deserialize, Serialize};

/// Group assigned when an entry carries no `group-title` attribute
pub const DEFAULT_GROUP: &str = "General";

/// Title assigned when an `#EXTINF` line has no comma-separated title
pub const DEFAULT_NAME: &str = "Unknown";

/// One playlist entry
///
/// Everything except `local_logo` is fixed at parse time. `local_logo` is the
/// file name inside the logo store and is set at most once, by the mirror.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Free-text title after the first comma of the `#EXTINF` line
    pub name: String,
    /// `group-title` attribute
    pub group: String,
    /// `tvg-logo` attribute, empty when absent
    pub logo_url: String,
    /// Line following the `#EXTINF` line, never empty
    pub stream_url: String,
    /// `tvg-id` attribute, empty when absent
    pub tvg_id: String,
    /// `tvg-name` attribute, empty when absent
    pub tvg_name: String,
    /// File name of the mirrored logo, if it was resolved
    pub local_logo: Option<String>,
}

impl Channel {
    /// Borrow the logo URL together with the only field the mirror may write
    pub fn asset_slot(&mut self) -> AssetSlot<'_> {
        AssetSlot {
            logo_url: &self.logo_url,
            local_logo: &mut self.local_logo,
        }
    }

    /// Whether the logo was mirrored
    pub fn has_local_logo(&self) -> bool {
        self.local_logo.as_deref().is_some_and(|name| !name.is_empty())
    }

    /// Render the `#EXTINF` line and stream line for this channel
    ///
    /// Attributes are emitted only when non-empty, in the order `tvg-id`,
    /// `tvg-name`, `tvg-logo`, `group-title`, then a comma and the title.
    pub fn to_m3u_entry(&self, base_logo_url: Option<&str>) -> String {
        let logo = match (base_logo_url, self.local_logo.as_deref()) {
            (Some(base), Some(local)) if !local.is_empty() => format!("{base}/{local}"),
            _ => self.logo_url.clone(),
        };

        let mut parts = vec!["#EXTINF:-1".to_string()];
        let attributes = [
            ("tvg-id", self.tvg_id.as_str()),
            ("tvg-name", self.tvg_name.as_str()),
            ("tvg-logo", logo.as_str()),
            ("group-title", self.group.as_str()),
        ];
        for (key, value) in attributes {
            if !value.is_empty() {
                parts.push(format!("{key}=\"{value}\""));
            }
        }
        // Title follows a comma, the separator `parse_playlist` splits on
        format!("{},{}\n{}", parts.join(" "), self.name, self.stream_url)
    }
}

/// Mutable view the mirror gets of a single channel
#[derive(Debug)]
pub struct AssetSlot<'a> {
    /// Remote logo URL, empty when the channel has none
    pub logo_url: &'a str,
    /// Where the mirrored file name is recorded
    pub local_logo: &'a mut Option<String>,
}

/// How a channel's logo was resolved during one mirror run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// File was already present in the store
    Hit,
    /// File was fetched and written
    Downloaded {
        /// Bytes written
        bytes: u64,
    },
    /// Channel has no logo URL
    Skipped,
    /// Fetch or write failed
    Failed {
        /// Human-readable failure reason
        reason: String,
    },
}

impl MirrorOutcome {
    /// Whether the channel ended up with a local logo
    pub fn is_resolved(&self) -> bool {
        matches!(self, MirrorOutcome::Hit | MirrorOutcome::Downloaded { .. })
    }
}

/// Tally of mirror outcomes for logging and the run summary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSummary {
    /// Logos already in the store
    pub hits: usize,
    /// Logos fetched this run
    pub downloaded: usize,
    /// Channels without a logo URL
    pub skipped: usize,
    /// Logos that could not be mirrored
    pub failed: usize,
    /// Total bytes written this run
    pub bytes: u64,
}

impl MirrorSummary {
    /// Count outcomes
    pub fn from_outcomes(outcomes: &[MirrorOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome {
                    MirrorOutcome::Hit => summary.hits += 1,
                    MirrorOutcome::Downloaded { bytes } => {
                        summary.downloaded += 1;
                        summary.bytes += bytes;
                    }
                    MirrorOutcome::Skipped => summary.skipped += 1,
                    MirrorOutcome::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }

    /// Channels that had a logo URL and were therefore attempted
    pub fn eligible(&self) -> usize {
        self.hits + self.downloaded + self.failed
    }

    /// Channels whose logo ended up in the store
    pub fn resolved(&self) -> usize {
        self.hits + self.downloaded
    }
}
