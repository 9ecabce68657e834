//! Disk enumeration of image assets under the images root.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::layout::{to_posix, SiteLayout};

/// An image file physically present under the images root.
///
/// Ordered by public path so sets iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageRecord {
    pub public_path: String,
    pub relative_path: String,
}

/// Case-insensitive set of accepted file extensions.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionSet(&'static [&'static str]);

impl ExtensionSet {
    /// Everything the validator considers an image reference target.
    pub const VALIDATOR: Self = Self(&["jpg", "jpeg", "png", "gif", "webp", "avif", "svg"]);
    /// Raster images eligible for archiving.
    pub const ARCHIVER: Self = Self(&["jpg", "jpeg", "png", "gif", "webp", "avif"]);
    /// Sources the optimizer derives WebP/AVIF from.
    pub const SOURCES: Self = Self(&["jpg", "jpeg", "png"]);

    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        self.0.iter().any(|known| known.eq_ignore_ascii_case(ext))
    }
}

/// List every image under the images root with an accepted extension.
///
/// The archive subtree is pruned from the walk. A missing images root is an
/// empty result; any other walk error aborts.
pub fn enumerate_images(
    layout: &SiteLayout,
    extensions: ExtensionSet,
) -> Result<BTreeSet<ImageRecord>> {
    let root = &layout.images_root;
    let mut images = BTreeSet::new();
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "images root missing; nothing to enumerate");
        return Ok(images);
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.path() != layout.archive_root);

    for entry in walker {
        let entry =
            entry.with_context(|| format!("walking images root '{}'", root.display()))?;
        let path = entry.path();
        // Symlinked files count as images; directory links are not descended.
        if !path.is_file() {
            continue;
        }
        if !extensions.matches(path) {
            continue;
        }
        let relative = path.strip_prefix(root).with_context(|| {
            format!(
                "resolving '{}' relative to '{}'",
                path.display(),
                root.display()
            )
        })?;
        let relative_path = to_posix(relative);
        images.insert(ImageRecord {
            public_path: layout.public_path(&relative_path),
            relative_path,
        });
    }

    tracing::debug!(count = images.len(), root = %root.display(), "enumerated images");
    Ok(images)
}
