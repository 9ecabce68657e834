//! Move orphaned images into the archive subtree.
//!
//! Archived files keep their path relative to the images root, so restoring
//! one is a move back. Because the archive subtree is never enumerated, a
//! second run over an unchanged tree finds nothing to do.

use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use crate::config::{PipelineConfig, ReferenceSurface};
use crate::enumerate::{enumerate_images, ExtensionSet, ImageRecord};
use crate::filesystem::move_file;
use crate::layout::SiteLayout;
use crate::report::{bold, cyan, green, red, yellow};
use crate::scan::{sources_from_paths, ReferenceRecord, ReferenceScanner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFailure {
    pub relative_path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub orphans_found: usize,
    pub moved: Vec<String>,
    pub failures: Vec<ArchiveFailure>,
}

/// Images on disk whose public path no reference names, sorted.
pub fn find_orphans(
    existing: &BTreeSet<ImageRecord>,
    references: &[ReferenceRecord],
) -> Vec<ImageRecord> {
    let referenced: HashSet<&str> = references
        .iter()
        .map(|reference| reference.path.as_str())
        .collect();
    existing
        .iter()
        .filter(|image| !referenced.contains(image.public_path.as_str()))
        .cloned()
        .collect()
}

/// Orphans as seen from the archiver's reference surface.
pub fn collect_orphans(layout: &SiteLayout, config: &PipelineConfig) -> Result<Vec<ImageRecord>> {
    let existing = enumerate_images(layout, ExtensionSet::ARCHIVER)?;
    let scanner = ReferenceScanner::new(&layout.public_prefix)?;
    let sources = sources_from_paths(config.sources_for(ReferenceSurface::Archiver));
    let references = scanner.scan_sources(&layout.project_root, &sources)?;
    Ok(find_orphans(&existing, &references))
}

/// Move each orphan under the archive root.
///
/// A failed move is recorded and the batch continues. Nothing is created
/// when `orphans` is empty.
pub fn archive_orphans(
    layout: &SiteLayout,
    orphans: &[ImageRecord],
    mut on_moved: impl FnMut(&str, Result<(), &str>),
) -> ArchiveSummary {
    let mut summary = ArchiveSummary {
        orphans_found: orphans.len(),
        ..ArchiveSummary::default()
    };

    let mut sorted: Vec<&ImageRecord> = orphans.iter().collect();
    sorted.sort();

    for orphan in sorted {
        let source = layout.image_path(&orphan.relative_path);
        let destination = layout.archived_path(&orphan.relative_path);
        match move_file(&source, &destination) {
            Ok(()) => {
                tracing::debug!(image = %orphan.relative_path, "archived");
                on_moved(&orphan.relative_path, Ok(()));
                summary.moved.push(orphan.relative_path.clone());
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::warn!(image = %orphan.relative_path, error = %message, "archive move failed");
                on_moved(&orphan.relative_path, Err(message.as_str()));
                summary.failures.push(ArchiveFailure {
                    relative_path: orphan.relative_path.clone(),
                    message,
                });
            }
        }
    }

    summary
}

pub fn render_move(
    relative_path: &str,
    result: Result<(), &str>,
    out: &mut impl Write,
) -> std::io::Result<()> {
    match result {
        Ok(()) => writeln!(out, "  {} {}", cyan("→"), relative_path),
        Err(message) => writeln!(out, "  {} {}: {}", red("✗"), relative_path, message),
    }
}

pub fn render_summary(
    summary: &ArchiveSummary,
    archive_display: &str,
    out: &mut impl Write,
) -> std::io::Result<()> {
    writeln!(out, "{}", bold("\n=== Summary ==="))?;
    writeln!(out, "{}: {} images", green("Moved"), summary.moved.len())?;
    if !summary.failures.is_empty() {
        writeln!(out, "{}: {} images", red("Errors"), summary.failures.len())?;
    }
    writeln!(out, "\nArchived images are in: {}", cyan(format!("{archive_display}/")))?;
    writeln!(out, "This folder should be git-ignored so it is never deployed.")?;
    writeln!(out, "\nTo restore an image, move it back to its original location.")
}

pub fn render_header(orphans: usize, out: &mut impl Write) -> std::io::Result<()> {
    if orphans == 0 {
        writeln!(out, "{}", green("No orphaned images found. Nothing to archive."))
    } else {
        writeln!(out, "Found {} orphaned images to archive.\n", yellow(orphans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn site() -> (TempDir, SiteLayout, PipelineConfig) {
        let temp = TempDir::new().unwrap();
        let config = PipelineConfig::default();
        let layout = SiteLayout::new(temp.path(), &config);
        fs::create_dir_all(&layout.images_root).unwrap();
        (temp, layout, config)
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative.as_bytes()).unwrap();
    }

    fn write_source(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn archive(layout: &SiteLayout, config: &PipelineConfig) -> ArchiveSummary {
        let orphans = collect_orphans(layout, config).unwrap();
        archive_orphans(layout, &orphans, |_, _| {})
    }

    #[test]
    fn orphan_is_moved_preserving_structure() {
        let (temp, layout, config) = site();
        touch(&layout.images_root, "old/unused.png");
        touch(&layout.images_root, "kept.jpg");
        write_source(temp.path(), "src/data/data.tsx", "img: '/images/kept.jpg'\n");

        let summary = archive(&layout, &config);

        assert_eq!(summary.moved, vec!["old/unused.png".to_string()]);
        assert!(summary.failures.is_empty());
        assert!(!layout.images_root.join("old/unused.png").exists());
        assert_eq!(
            fs::read_to_string(layout.archive_root.join("old/unused.png")).unwrap(),
            "old/unused.png"
        );
        assert!(layout.images_root.join("kept.jpg").exists());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (_temp, layout, config) = site();
        touch(&layout.images_root, "old/unused.png");

        let first = archive(&layout, &config);
        let second = archive(&layout, &config);

        assert_eq!(first.moved.len(), 1);
        assert_eq!(second.orphans_found, 0);
        assert!(second.moved.is_empty());
    }

    #[test]
    fn no_orphans_creates_no_archive_dir() {
        let (temp, layout, config) = site();
        touch(&layout.images_root, "kept.jpg");
        write_source(temp.path(), "src/data/data.tsx", "img: \"/images/kept.jpg\"\n");

        let summary = archive(&layout, &config);

        assert_eq!(summary.orphans_found, 0);
        assert!(!layout.archive_root.exists());
    }

    #[test]
    fn component_only_references_are_archived_by_default() {
        let (temp, layout, config) = site();
        touch(&layout.images_root, "hero/me.png");
        write_source(
            temp.path(),
            "src/components/Sections/Hero.tsx",
            "<img src=\"/images/hero/me.png\" />\n",
        );

        let summary = archive(&layout, &config);

        assert_eq!(summary.moved, vec!["hero/me.png".to_string()]);
    }

    #[test]
    fn shared_surface_keeps_component_references() {
        let (temp, layout, mut config) = site();
        config.archive_sources = config.reference_sources.clone();
        touch(&layout.images_root, "hero/me.png");
        write_source(
            temp.path(),
            "src/components/Sections/Hero.tsx",
            "<img src=\"/images/hero/me.png\" />\n",
        );

        let summary = archive(&layout, &config);

        assert_eq!(summary.orphans_found, 0);
        assert!(layout.images_root.join("hero/me.png").exists());
    }

    #[test]
    fn svg_is_never_archived() {
        let (_temp, layout, config) = site();
        touch(&layout.images_root, "logo.svg");

        let summary = archive(&layout, &config);

        assert_eq!(summary.orphans_found, 0);
    }

    #[test]
    fn failed_move_does_not_abort_batch() {
        let (_temp, layout, _config) = site();
        touch(&layout.images_root, "b.png");
        let orphans = vec![
            ImageRecord {
                public_path: "/images/a.png".into(),
                relative_path: "a.png".into(),
            },
            ImageRecord {
                public_path: "/images/b.png".into(),
                relative_path: "b.png".into(),
            },
        ];

        let mut seen = Vec::new();
        let summary = archive_orphans(&layout, &orphans, |path, result| {
            seen.push((path.to_string(), result.is_ok()));
        });

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].relative_path, "a.png");
        assert_eq!(summary.moved, vec!["b.png".to_string()]);
        assert_eq!(
            seen,
            vec![("a.png".to_string(), false), ("b.png".to_string(), true)]
        );
    }

    #[test]
    fn rearchiving_same_path_keeps_earlier_copy() {
        let (_temp, layout, config) = site();
        touch(&layout.images_root, "old/unused.png");
        archive(&layout, &config);

        let replacement = layout.images_root.join("old/unused.png");
        fs::write(&replacement, "replacement").unwrap();
        let summary = archive(&layout, &config);

        assert!(summary.moved.is_empty());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].relative_path, "old/unused.png");
        assert_eq!(
            fs::read_to_string(layout.archive_root.join("old/unused.png")).unwrap(),
            "old/unused.png"
        );
        assert_eq!(fs::read_to_string(replacement).unwrap(), "replacement");
    }

    #[test]
    fn find_orphans_is_exact_match() {
        let existing: BTreeSet<ImageRecord> = ["a.jpg", "A.jpg"]
            .iter()
            .map(|name| ImageRecord {
                public_path: format!("/images/{name}"),
                relative_path: name.to_string(),
            })
            .collect();
        let references = vec![ReferenceRecord {
            path: "/images/a.jpg".into(),
            source_file: "data/data.tsx".into(),
            line_number: 1,
        }];

        let orphans = find_orphans(&existing, &references);

        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].relative_path, "A.jpg");
    }
}
