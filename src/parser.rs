//! M3U playlist parsing
//!
//! The format pairs an `#EXTINF:` metadata line with the stream line right
//! after it. Anything that does not fit that shape is skipped; parsing never
//! fails as a whole.

use crate::channel::{Channel, DEFAULT_GROUP, DEFAULT_NAME};
use regex::Regex;
use std::sync::LazyLock;

/// Prefix that marks a metadata line
pub const EXTINF_PREFIX: &str = "#EXTINF:";

/// Attribute keys recognized on a metadata line, matched case-insensitively
const ATTRIBUTE_KEYS: [&str; 4] = ["tvg-id", "tvg-name", "tvg-logo", "group-title"];

#[allow(clippy::expect_used)]
static ATTRIBUTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ATTRIBUTE_KEYS
        .iter()
        .map(|key| {
            // Patterns are built from constant keys and always compile
            Regex::new(&format!(r#"(?i){}="([^"]*)""#, regex::escape(key)))
                .expect("attribute pattern")
        })
        .collect()
});

/// Values pulled out of a single `#EXTINF` line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtinfAttributes {
    /// Title after the first top-level comma
    pub name: Option<String>,
    /// `tvg-id`
    pub tvg_id: Option<String>,
    /// `tvg-name`
    pub tvg_name: Option<String>,
    /// `tvg-logo`
    pub tvg_logo: Option<String>,
    /// `group-title`
    pub group_title: Option<String>,
}

/// Whether a trimmed line starts a playlist entry
pub fn is_metadata_line(line: &str) -> bool {
    line.starts_with(EXTINF_PREFIX)
}

/// Parse playlist text into channels, preserving source order
///
/// A metadata line produces a channel only when the next line is non-empty
/// and is not a `#` directive. A blank or directive line that breaks a pair
/// is consumed, except another `#EXTINF` line, which starts the next pair.
pub fn parse_playlist(content: &str) -> Vec<Channel> {
    let lines: Vec<&str> = content.trim().lines().map(str::trim).collect();
    let mut channels = Vec::new();
    let mut skipped = 0usize;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if !is_metadata_line(line) {
            continue;
        }

        match lines.get(i) {
            Some(next) if !next.is_empty() && !next.starts_with('#') => {
                channels.push(channel_from_pair(line, next));
                i += 1;
            }
            Some(next) if is_metadata_line(next) => {
                tracing::debug!(line = i, "metadata line without stream line");
                skipped += 1;
            }
            Some(_) => {
                tracing::debug!(line = i, "metadata line followed by blank or directive");
                skipped += 1;
                i += 1;
            }
            None => {
                tracing::debug!(line = i, "metadata line at end of input");
                skipped += 1;
            }
        }
    }

    tracing::info!(channels = channels.len(), skipped, "parsed playlist");
    channels
}

/// Extract attributes and title from an `#EXTINF` line
pub fn parse_extinf(line: &str) -> ExtinfAttributes {
    let mut values = ATTRIBUTE_PATTERNS.iter().map(|pattern| {
        pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    });

    ExtinfAttributes {
        tvg_id: values.next().flatten(),
        tvg_name: values.next().flatten(),
        tvg_logo: values.next().flatten(),
        group_title: values.next().flatten(),
        name: title_start(line).map(|start| line[start..].trim().to_string()),
    }
}

fn channel_from_pair(metadata: &str, stream_url: &str) -> Channel {
    let attributes = parse_extinf(metadata);
    Channel {
        name: attributes.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        group: attributes
            .group_title
            .unwrap_or_else(|| DEFAULT_GROUP.to_string()),
        logo_url: attributes.tvg_logo.unwrap_or_default(),
        stream_url: stream_url.to_string(),
        tvg_id: attributes.tvg_id.unwrap_or_default(),
        tvg_name: attributes.tvg_name.unwrap_or_default(),
        local_logo: None,
    }
}

/// Byte offset just past the comma that introduces the title
///
/// The first comma outside a double-quoted value wins. If quotes are
/// unbalanced and no such comma exists, falls back to the first comma.
fn title_start(line: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some(idx + 1),
            _ => {}
        }
    }
    line.find(',').map(|idx| idx + 1)
}
