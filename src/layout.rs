//! Filesystem convention shared by all pipeline tools.
//!
//! ```text
//! <project>/
//!     image-pipeline.toml            optional config
//!     public/images/                 images root
//!     public/images/_archive/        archive subtree (never enumerated)
//!     public/images/.image-manifest.json
//!     src/data/data.tsx              reference sources
//! ```

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::config::{PipelineConfig, CONFIG_FILENAME};

/// Environment variable that pins the project root, skipping discovery.
pub const PROJECT_ROOT_ENV: &str = "IMAGE_PIPELINE_ROOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    pub project_root: PathBuf,
    pub images_root: PathBuf,
    pub archive_root: PathBuf,
    pub manifest_path: PathBuf,
    pub public_prefix: String,
}

impl SiteLayout {
    pub fn new(project_root: &Path, config: &PipelineConfig) -> Self {
        let images_root = project_root.join(&config.images_dir);
        Self {
            project_root: project_root.to_path_buf(),
            archive_root: images_root.join(&config.archive_dir),
            manifest_path: images_root.join(&config.manifest_file),
            images_root,
            public_prefix: config.public_prefix.clone(),
        }
    }

    /// Public reference form of a path relative to the images root.
    pub fn public_path(&self, relative: &str) -> String {
        format!("{}{}", self.public_prefix, relative.trim_start_matches('/'))
    }

    /// Where an image would live on disk, given its relative path.
    pub fn image_path(&self, relative: &str) -> PathBuf {
        self.images_root.join(relative)
    }

    /// Where an image lands once archived, preserving its relative path.
    pub fn archived_path(&self, relative: &str) -> PathBuf {
        self.archive_root.join(relative)
    }

    /// Project-relative display form for report lines.
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .map(to_posix)
            .unwrap_or_else(|_| path.display().to_string())
    }
}

/// Resolve the project root for a CLI invocation.
///
/// `IMAGE_PIPELINE_ROOT` wins when set. Otherwise the ancestors of the
/// current directory are searched for `image-pipeline.toml` or a
/// `public/images` directory, falling back to the current directory.
pub fn resolve_project_root() -> Result<PathBuf> {
    if let Some(root) = std::env::var_os(PROJECT_ROOT_ENV) {
        return Ok(PathBuf::from(root));
    }
    let cwd = std::env::current_dir().context("resolving current directory")?;
    Ok(locate_project_root(&cwd))
}

pub fn locate_project_root(start: &Path) -> PathBuf {
    for ancestor in start.ancestors() {
        if ancestor.join(CONFIG_FILENAME).is_file() {
            return ancestor.to_path_buf();
        }
        if ancestor.join(crate::config::DEFAULT_IMAGES_DIR).is_dir() {
            return ancestor.to_path_buf();
        }
    }
    start.to_path_buf()
}

/// Join path components with `/` regardless of host separator.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
