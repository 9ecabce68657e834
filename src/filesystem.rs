//! Filesystem primitives used by the archiver and the manifest store.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Move a file by renaming, with fallback to copy+delete.
///
/// The destination's parent directory is created when missing. The rename
/// fails across filesystems, in which case the file is copied and the
/// source removed. An existing destination is never replaced.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if fs::symlink_metadata(dst).is_ok() {
        bail!(
            "refusing to move '{}': destination '{}' already exists",
            src.display(),
            dst.display()
        );
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !src.is_file() {
                return Err(rename_err)
                    .with_context(|| format!("moving '{}'", src.display()));
            }
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                error = %rename_err,
                "rename failed; falling back to copy"
            );
            fs::copy(src, dst)
                .with_context(|| format!("copying '{}' to '{}'", src.display(), dst.display()))?;
            fs::remove_file(src).with_context(|| format!("removing '{}'", src.display()))?;
            Ok(())
        }
    }
}

/// Serialize `value` as pretty JSON and replace `path` in one rename.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path without parent '{}'", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("creating parent directory '{}'", parent.display()))?;
    let tmp = path.with_extension(format!("tmp-{}", std::process::id()));
    let mut payload = serde_json::to_vec_pretty(value)
        .with_context(|| format!("serializing '{}'", path.display()))?;
    payload.push(b'\n');
    fs::write(&tmp, payload).with_context(|| format!("writing temp file '{}'", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| {
        format!(
            "renaming temp file '{}' to '{}'",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}
