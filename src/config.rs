//! Configuration types for m3u-mirror

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Keys the `validate` command requires to be spelled out in the config file
pub const REQUIRED_KEYS: &[&str] = &["source_url", "github_repo", "output_filename"];

/// Directory layout for the logo store, outputs and log files
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Content-addressed logo store (default: "./logos")
    #[serde(default = "default_logos_dir")]
    pub logos_dir: PathBuf,

    /// Rewritten playlist and stats.json (default: "./output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Dated log files (default: "./logs")
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logos_dir: default_logos_dir(),
            output_dir: default_output_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

/// Retry configuration for the source playlist fetch
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Main configuration for a mirror run
///
/// Every field has a default, so an empty JSON object (or a missing config
/// file) yields a runnable configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Playlist to mirror
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// GitHub repository (`owner/name`) the logos are published from
    ///
    /// Used to derive the logo base URL when `asset_base_url` is not set.
    #[serde(default)]
    pub github_repo: Option<String>,

    /// Explicit base URL for rewritten logo links, overrides `github_repo`
    #[serde(default)]
    pub asset_base_url: Option<String>,

    /// File name of the rewritten playlist inside `output_dir`
    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    /// Name shown in the generated playlist header comment
    #[serde(default = "default_playlist_title")]
    pub playlist_title: String,

    /// Maximum concurrent logo downloads (default: 10)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Retry policy for the source playlist fetch
    #[serde(default)]
    pub retry: RetryConfig,

    /// Recognized logo extensions, lowercase with leading dot
    #[serde(default = "default_logo_formats")]
    pub logo_formats: Vec<String>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            github_repo: None,
            asset_base_url: None,
            output_filename: default_output_filename(),
            playlist_title: default_playlist_title(),
            max_concurrent_downloads: default_max_concurrent(),
            request_timeout: default_request_timeout(),
            retry: RetryConfig::default(),
            logo_formats: default_logo_formats(),
            user_agent: default_user_agent(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged. A file that exists but cannot be read or parsed is a
    /// [`Error::Config`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;

        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("invalid JSON in {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Check semantic constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        let source = url::Url::parse(&self.source_url)
            .map_err(|e| Error::config("source_url", format!("not a valid URL: {e}")))?;
        if !matches!(source.scheme(), "http" | "https") {
            return Err(Error::config(
                "source_url",
                format!("unsupported scheme '{}'", source.scheme()),
            ));
        }

        let file_name = Path::new(&self.output_filename);
        let is_plain_name = file_name.file_name() == Some(file_name.as_os_str());
        if self.output_filename.trim().is_empty() || !is_plain_name {
            return Err(Error::config(
                "output_filename",
                "must be a plain file name without directories",
            ));
        }

        if let Some(repo) = &self.github_repo {
            let mut parts = repo.split('/');
            let well_formed = matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
            );
            if !well_formed {
                return Err(Error::config(
                    "github_repo",
                    format!("expected 'owner/name', got '{repo}'"),
                ));
            }
        }

        if self.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "max_concurrent_downloads",
                "must be at least 1",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts", "must be at least 1"));
        }

        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                "must be a finite number, 1.0 or greater",
            ));
        }

        if let Some(bad) = self.logo_formats.iter().find(|f| !f.starts_with('.')) {
            return Err(Error::config(
                "logo_formats",
                format!("extension '{bad}' must start with '.'"),
            ));
        }

        Ok(())
    }

    /// Base URL that mirrored logo file names are appended to, if any
    pub fn logo_base_url(&self) -> Option<String> {
        if let Some(base) = &self.asset_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        self.github_repo
            .as_ref()
            .map(|repo| format!("https://raw.githubusercontent.com/{repo}/main/logos"))
    }

    /// Path of the rewritten playlist
    pub fn playlist_path(&self) -> PathBuf {
        self.paths.output_dir.join(&self.output_filename)
    }

    /// Path of the JSON run report
    pub fn report_path(&self) -> PathBuf {
        self.paths.output_dir.join(REPORT_FILENAME)
    }
}

/// File name of the run report inside `output_dir`
pub const REPORT_FILENAME: &str = "stats.json";

/// Strict check used by the `validate` command
///
/// Unlike [`Config::load`], the file must exist and must spell out every key
/// in [`REQUIRED_KEYS`]; the merged configuration must then pass
/// [`Config::validate`].
pub fn validate_config_file(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("cannot read {}: {}", path.display(), e),
        key: None,
    })?;

    let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| Error::Config {
        message: format!("invalid JSON in {}: {}", path.display(), e),
        key: None,
    })?;

    let object = value.as_object().ok_or_else(|| Error::Config {
        message: "top level must be a JSON object".to_string(),
        key: None,
    })?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Config {
            message: format!("missing fields: {}", missing.join(", ")),
            key: missing.first().map(|k| k.to_string()),
        });
    }

    let config: Config = serde_json::from_value(value).map_err(|e| Error::Config {
        message: format!("invalid configuration: {e}"),
        key: None,
    })?;
    config.validate()?;
    Ok(config)
}

fn default_source_url() -> String {
    "https://raw.githubusercontent.com/abusaeeidx/CricHd-playlists-Auto-Update-permanent/refs/heads/main/ALL.m3u".to_string()
}

fn default_output_filename() -> String {
    "playlist.m3u".to_string()
}

fn default_playlist_title() -> String {
    "M3U Mirror".to_string()
}

fn default_max_concurrent() -> usize {
    10
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_logo_formats() -> Vec<String> {
    [".png", ".jpg", ".jpeg", ".gif", ".webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_user_agent() -> String {
    concat!("m3u-mirror/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_logos_dir() -> PathBuf {
    PathBuf::from("./logos")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("./logs")
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
