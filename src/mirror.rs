//! Content-addressed logo mirroring
//!
//! Each logo URL maps to a stable file name: the first [`HASH_LEN`] hex
//! characters of its MD5 digest plus an extension taken from the URL path.
//! A file that already exists is never fetched again, so repeated runs only
//! download logos that are new.
//!
//! Up to `concurrency` fetch-and-write operations run at once. Channels that
//! share a logo URL share a single fetch. A failed logo is reported as a
//! [`MirrorOutcome::Failed`] and never aborts the stage.

use crate::channel::{AssetSlot, Channel, MirrorOutcome, MirrorSummary};
use crate::config::Config;
use crate::error::AssetError;
use crate::utils::write_atomic;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Number of hex digest characters kept in a logo file name
pub const HASH_LEN: usize = 12;

/// Extension used when the URL path has none or an unrecognized one
pub const FALLBACK_EXTENSION: &str = ".png";

/// Abstraction over logo fetching, enabling testability.
#[async_trait::async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the bytes behind `url` in a single attempt
    async fn fetch_asset(&self, url: &str) -> Result<Bytes, AssetError>;
}

/// Compute the store file name for a logo URL
///
/// # Examples
///
/// ```
/// use m3u_mirror::mirror::asset_file_name;
///
/// let formats = vec![".png".to_string(), ".jpg".to_string()];
/// let name = asset_file_name("http://x/logos/a.JPG?v=2", &formats);
/// assert!(name.ends_with(".jpg"));
/// assert_eq!(name.len(), 12 + 4);
///
/// let svg = asset_file_name("http://x/logos/a.svg", &formats);
/// assert!(svg.ends_with(".png"));
/// ```
pub fn asset_file_name(url: &str, formats: &[String]) -> String {
    let digest = format!("{:x}", md5::compute(url.as_bytes()));
    let extension = url_extension(url)
        .filter(|ext| formats.iter().any(|f| f.eq_ignore_ascii_case(ext)))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    format!("{}{}", &digest[..HASH_LEN], extension)
}

/// Lowercased extension (with leading dot) of the URL path, ignoring query
/// and fragment
fn url_extension(url: &str) -> Option<String> {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Mirrors channel logos into a local directory
pub struct AssetMirror<F> {
    fetcher: F,
    storage_dir: PathBuf,
    concurrency: usize,
    formats: Vec<String>,
}

impl<F: AssetFetcher> AssetMirror<F> {
    /// Create a mirror writing into `storage_dir` with at most `concurrency`
    /// operations in flight
    pub fn new(
        fetcher: F,
        storage_dir: impl Into<PathBuf>,
        concurrency: usize,
        formats: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            storage_dir: storage_dir.into(),
            concurrency: concurrency.max(1),
            formats,
        }
    }

    /// Create a mirror from the run configuration
    pub fn from_config(fetcher: F, config: &Config) -> Self {
        Self::new(
            fetcher,
            config.paths.logos_dir.clone(),
            config.max_concurrent_downloads,
            config.logo_formats.clone(),
        )
    }

    /// Directory the logos are written to
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Resolve every channel's logo and record the local file name on success
    ///
    /// Outcomes are returned in channel order.
    pub async fn mirror(&self, channels: &mut [Channel]) -> Vec<MirrorOutcome> {
        let mut slots: Vec<AssetSlot<'_>> = channels.iter_mut().map(Channel::asset_slot).collect();
        self.mirror_slots(&mut slots).await
    }

    /// Same as [`mirror`](Self::mirror), over pre-borrowed slots
    pub async fn mirror_slots(&self, slots: &mut [AssetSlot<'_>]) -> Vec<MirrorOutcome> {
        if let Err(e) = tokio::fs::create_dir_all(&self.storage_dir).await {
            tracing::warn!(
                dir = %self.storage_dir.display(),
                error = %e,
                "cannot create logo directory, every download will fail"
            );
        }

        // One identity per slot; each distinct identity is resolved once
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        let identities: Vec<Option<String>> = slots
            .iter()
            .map(|slot| {
                if slot.logo_url.is_empty() {
                    return None;
                }
                let name = asset_file_name(slot.logo_url, &self.formats);
                if seen.insert(name.clone()) {
                    pending.push((name.clone(), slot.logo_url.to_string()));
                }
                Some(name)
            })
            .collect();

        tracing::info!(
            logos = pending.len(),
            concurrency = self.concurrency,
            "mirroring channel logos"
        );

        let resolved: HashMap<String, MirrorOutcome> = stream::iter(pending)
            .map(|(name, url)| async move {
                let outcome = self.resolve(&url, &name).await;
                (name, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut first_seen = HashSet::new();
        let outcomes: Vec<MirrorOutcome> = slots
            .iter_mut()
            .zip(identities)
            .map(|(slot, identity)| {
                let Some(name) = identity else {
                    return MirrorOutcome::Skipped;
                };
                let outcome = resolved.get(&name).cloned().unwrap_or(MirrorOutcome::Failed {
                    reason: "logo was not attempted".to_string(),
                });
                if outcome.is_resolved() {
                    *slot.local_logo = Some(name.clone());
                }
                match (first_seen.insert(name), outcome) {
                    (false, outcome) if outcome.is_resolved() => MirrorOutcome::Hit,
                    (_, outcome) => outcome,
                }
            })
            .collect();

        let summary = MirrorSummary::from_outcomes(&outcomes);
        tracing::info!(
            downloaded = summary.downloaded,
            hits = summary.hits,
            failed = summary.failed,
            skipped = summary.skipped,
            "Resolved {}/{} logos",
            summary.resolved(),
            summary.eligible()
        );

        outcomes
    }

    async fn resolve(&self, url: &str, name: &str) -> MirrorOutcome {
        let path = self.storage_dir.join(name);

        match tokio::fs::try_exists(&path).await {
            Ok(true) => return MirrorOutcome::Hit,
            Ok(false) => {}
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "cannot stat logo"),
        }

        let bytes = match self.fetcher.fetch_asset(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(url, error = %e, "logo download failed");
                return MirrorOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        match write_atomic(&path, &bytes).await {
            Ok(()) => MirrorOutcome::Downloaded {
                bytes: bytes.len() as u64,
            },
            Err(source) => {
                let error = AssetError::Storage { path, source };
                tracing::warn!(url, error = %error, "logo could not be stored");
                MirrorOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves `logo:<url>` for every URL not listed in `fail`, tracking
    /// calls and peak concurrency
    #[derive(Default)]
    struct FakeFetcher {
        fail: Vec<String>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AssetFetcher for FakeFetcher {
        async fn fetch_asset(&self, url: &str) -> Result<Bytes, AssetError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(url.to_string());

            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail.iter().any(|f| f == url) {
                return Err(AssetError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            Ok(Bytes::from(format!("logo:{url}")))
        }
    }

    fn formats() -> Vec<String> {
        vec![".png".into(), ".jpg".into(), ".jpeg".into(), ".gif".into(), ".webp".into()]
    }

    fn channel(name: &str, logo: &str) -> Channel {
        Channel {
            name: name.into(),
            group: "General".into(),
            logo_url: logo.into(),
            stream_url: format!("http://stream/{name}"),
            tvg_id: String::new(),
            tvg_name: String::new(),
            local_logo: None,
        }
    }

    #[test]
    fn file_name_is_truncated_md5_plus_extension() {
        // md5("http://x/a.png") computed independently
        let expected_hash = format!("{:x}", md5::compute(b"http://x/a.png"));
        let name = asset_file_name("http://x/a.png", &formats());
        assert_eq!(name, format!("{}.png", &expected_hash[..12]));
    }

    #[test]
    fn file_name_is_deterministic_and_url_sensitive() {
        let a1 = asset_file_name("http://x/a.webp", &formats());
        let a2 = asset_file_name("http://x/a.webp", &formats());
        let b = asset_file_name("http://x/b.webp", &formats());
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(a1.ends_with(".webp"));
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert!(asset_file_name("http://x/logo.svg", &formats()).ends_with(".png"));
        assert!(asset_file_name("http://x/logo", &formats()).ends_with(".png"));
        assert!(asset_file_name("not a url/logo.GIF", &formats()).ends_with(".gif"));
        assert!(asset_file_name("http://x/logo.jpeg#frag", &formats()).ends_with(".jpeg"));
    }

    #[tokio::test]
    async fn downloads_skips_and_fails_per_channel() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher {
            fail: vec!["http://x/broken.png".into()],
            ..Default::default()
        };
        let mirror = AssetMirror::new(fetcher, dir.path(), 4, formats());

        let mut channels = vec![
            channel("ok", "http://x/ok.png"),
            channel("none", ""),
            channel("broken", "http://x/broken.png"),
        ];
        let outcomes = mirror.mirror(&mut channels).await;

        assert!(matches!(outcomes[0], MirrorOutcome::Downloaded { .. }));
        assert_eq!(outcomes[1], MirrorOutcome::Skipped);
        assert!(matches!(outcomes[2], MirrorOutcome::Failed { .. }));

        let stored = channels[0].local_logo.clone().unwrap();
        let contents = std::fs::read(dir.path().join(&stored)).unwrap();
        assert_eq!(contents, b"logo:http://x/ok.png");
        assert!(channels[1].local_logo.is_none());
        assert!(channels[2].local_logo.is_none());

        let calls = mirror.fetcher.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2, "channel without logo must not hit the network");
    }

    #[tokio::test]
    async fn second_run_is_all_hits_with_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = AssetMirror::new(FakeFetcher::default(), dir.path(), 3, formats());

        let build = || {
            vec![
                channel("a", "http://x/a.png"),
                channel("b", "http://x/b.jpg"),
                channel("c", "http://x/c.gif"),
            ]
        };

        let mut first = build();
        let first_outcomes = mirror.mirror(&mut first).await;
        assert!(
            first_outcomes
                .iter()
                .all(|o| matches!(o, MirrorOutcome::Downloaded { .. }))
        );
        let snapshot: Vec<Vec<u8>> = first
            .iter()
            .map(|c| std::fs::read(dir.path().join(c.local_logo.as_ref().unwrap())).unwrap())
            .collect();

        let mut second = build();
        let second_outcomes = mirror.mirror(&mut second).await;
        assert!(second_outcomes.iter().all(|o| *o == MirrorOutcome::Hit));
        assert_eq!(
            MirrorSummary::from_outcomes(&second_outcomes).downloaded,
            0
        );
        assert_eq!(mirror.fetcher.calls.lock().unwrap().len(), 3);

        for (channel, before) in second.iter().zip(snapshot) {
            let after = std::fs::read(dir.path().join(channel.local_logo.as_ref().unwrap())).unwrap();
            assert_eq!(after, before);
        }
    }

    #[tokio::test]
    async fn shared_logo_is_fetched_once() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = AssetMirror::new(FakeFetcher::default(), dir.path(), 4, formats());

        let mut channels = vec![
            channel("one", "http://x/shared.png"),
            channel("two", "http://x/shared.png"),
            channel("three", "http://x/shared.png"),
        ];
        let outcomes = mirror.mirror(&mut channels).await;

        assert!(matches!(outcomes[0], MirrorOutcome::Downloaded { .. }));
        assert_eq!(outcomes[1], MirrorOutcome::Hit);
        assert_eq!(outcomes[2], MirrorOutcome::Hit);
        assert_eq!(mirror.fetcher.calls.lock().unwrap().len(), 1);
        assert!(channels.iter().all(|c| c.local_logo == channels[0].local_logo));
    }

    #[tokio::test]
    async fn shared_failed_logo_fails_every_channel() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher {
            fail: vec!["http://x/gone.png".into()],
            ..Default::default()
        };
        let mirror = AssetMirror::new(fetcher, dir.path(), 4, formats());

        let mut channels = vec![
            channel("one", "http://x/gone.png"),
            channel("two", "http://x/gone.png"),
        ];
        let outcomes = mirror.mirror(&mut channels).await;

        assert!(outcomes.iter().all(|o| matches!(o, MirrorOutcome::Failed { .. })));
        assert!(channels.iter().all(|c| c.local_logo.is_none()));
    }

    #[tokio::test]
    async fn in_flight_fetches_never_exceed_limit() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher {
            delay: Duration::from_millis(20),
            ..Default::default()
        };
        let mirror = AssetMirror::new(fetcher, dir.path(), 3, formats());

        let mut channels: Vec<Channel> = (0..20)
            .map(|i| channel(&format!("c{i}"), &format!("http://x/{i}.png")))
            .collect();
        let outcomes = mirror.mirror(&mut channels).await;

        assert_eq!(outcomes.len(), 20);
        let peak = mirror.fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight was {peak}");
        assert!(peak >= 2, "work should overlap, peak was {peak}");
        assert_eq!(mirror.fetcher.calls.lock().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn existing_file_is_never_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let name = asset_file_name("http://x/cached.png", &formats());
        std::fs::write(dir.path().join(&name), b"old bytes").unwrap();

        let mirror = AssetMirror::new(FakeFetcher::default(), dir.path(), 2, formats());
        let mut channels = vec![channel("cached", "http://x/cached.png")];
        let outcomes = mirror.mirror(&mut channels).await;

        assert_eq!(outcomes, vec![MirrorOutcome::Hit]);
        assert_eq!(channels[0].local_logo.as_deref(), Some(name.as_str()));
        assert_eq!(std::fs::read(dir.path().join(&name)).unwrap(), b"old bytes");
        assert!(mirror.fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the store directory should be
        let blocked = dir.path().join("logos");
        std::fs::write(&blocked, b"not a directory").unwrap();

        let mirror = AssetMirror::new(FakeFetcher::default(), &blocked, 2, formats());
        let mut channels = vec![channel("a", "http://x/a.png")];
        let outcomes = mirror.mirror(&mut channels).await;

        match &outcomes[0] {
            MirrorOutcome::Failed { reason } => {
                assert!(reason.contains("failed to store"), "got: {reason}")
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(channels[0].local_logo.is_none());
    }
}
