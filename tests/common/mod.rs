//! Common test utilities for m3u-mirror integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use m3u_mirror::Config;
use m3u_mirror::config::{PathsConfig, RetryConfig};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Base URL the rewritten playlists point their logos at
pub const MIRROR_BASE: &str = "https://mirror.example/logos";

/// Configuration reading from `server` and writing under `root`
///
/// Retries are fast so failure tests finish quickly.
pub fn test_config(server: &MockServer, root: &Path) -> Config {
    Config {
        source_url: format!("{}{}", server.uri(), PLAYLIST_PATH),
        asset_base_url: Some(MIRROR_BASE.to_string()),
        playlist_title: "Test".to_string(),
        max_concurrent_downloads: 4,
        request_timeout: Duration::from_secs(5),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        paths: PathsConfig {
            logos_dir: root.join("logos"),
            output_dir: root.join("output"),
            logs_dir: root.join("logs"),
        },
        ..Config::default()
    }
}

/// Serve `body` as the source playlist
pub async fn mount_playlist(server: &MockServer, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
        .mount(server)
        .await;
}

/// Serve `bytes` as a logo at `logo_path`
pub async fn mount_logo(server: &MockServer, logo_path: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(logo_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}
