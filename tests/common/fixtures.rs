//! Playlist fixtures

/// Path the mock server serves the source playlist from
pub const PLAYLIST_PATH: &str = "/ALL.m3u";

/// Playlist with one channel whose logo lives on `host`
pub fn single_channel_playlist(host: &str) -> String {
    format!(
        "#EXTM3U\n\
         #EXTINF:-1 tvg-id=\"1\" tvg-name=\"A\" tvg-logo=\"{host}/x/a.png\" group-title=\"Sports\",Channel A\n\
         http://stream/a.m3u8\n"
    )
}

/// Playlist mixing good, broken and logo-less entries, with CRLF line
/// endings and a few malformed lines
pub fn mixed_playlist(host: &str) -> String {
    [
        "#EXTM3U".to_string(),
        format!("#EXTINF:-1 tvg-id=\"s1\" tvg-logo=\"{host}/x/sky.png\" group-title=\"Sports\",Sky Sports"),
        "http://stream/sky.m3u8".to_string(),
        format!("#EXTINF:-1 tvg-id=\"s2\" tvg-logo=\"{host}/x/sky.png\" group-title=\"Sports\",Sky Sports HD"),
        "http://stream/skyhd.m3u8".to_string(),
        format!("#EXTINF:-1 tvg-logo=\"{host}/x/gone.jpg\" group-title=\"News\",Gone News"),
        "http://stream/news.m3u8".to_string(),
        "#EXTINF:-1 group-title=\"News\",No Stream".to_string(),
        "#EXTINF:-1 group-title=\"\",Plain".to_string(),
        "http://stream/plain.m3u8".to_string(),
        "#EXTINF:-1,Dangling".to_string(),
        String::new(),
        "http://orphan/stream.m3u8".to_string(),
    ]
    .join("\r\n")
}
