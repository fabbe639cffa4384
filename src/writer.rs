//! Rendering the rewritten playlist

use crate::channel::Channel;
use chrono::{DateTime, Utc};

/// First line of every generated playlist
pub const M3U_HEADER: &str = "#EXTM3U";

/// Render channels back to M3U text
///
/// Output is fully determined by the arguments: a header, a generation
/// comment, a channel count comment, a blank line, then every channel's
/// entry followed by a blank line.
pub fn render_playlist(
    channels: &[Channel],
    base_logo_url: Option<&str>,
    title: &str,
    generated_at: &DateTime<Utc>,
) -> String {
    let mut lines = Vec::with_capacity(4 + channels.len() * 2);
    lines.push(M3U_HEADER.to_string());
    lines.push(format!(
        "# {} Auto Scraper - {}",
        title,
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("# Total channels: {}", channels.len()));
    lines.push(String::new());

    for channel in channels {
        lines.push(channel.to_m3u_entry(base_logo_url));
        lines.push(String::new());
    }

    tracing::debug!(channels = channels.len(), "rendered playlist");
    lines.join("\n")
}
