//! Utility functions for file operations

use std::path::{Path, PathBuf};

/// Write `contents` to `path` so readers never observe a partial file
///
/// The data goes to a uniquely named sibling first and is then renamed over
/// the destination. The temporary file is removed if the rename fails.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_sibling(path)?;

    if let Err(e) = tokio::fs::write(&temp_path, contents).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}

/// Hidden temporary path next to `path`, e.g. `dir/.name.3f2a9c.tmp`
fn temp_sibling(path: &Path) -> std::io::Result<PathBuf> {
    let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("'{}' has no file name", path.display()),
        )
    })?;
    let suffix: u64 = rand::random();
    Ok(path.with_file_name(format!(".{file_name}.{suffix:x}.tmp")))
}

/// Create `dir` and its parents, adding the path to the error message
pub async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to create directory '{}': {}", dir.display(), e),
        )
    })
}
