//! Cross-reference scanned image references against images on disk.
//!
//! Broken references fail the run (deployment gate). Orphans and missing
//! derivatives only warn.

use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use crate::config::{PipelineConfig, ReferenceSurface};
use crate::enumerate::{enumerate_images, ExtensionSet, ImageRecord};
use crate::layout::SiteLayout;
use crate::optimize::DerivativeFormat;
use crate::paths::{derivative_public_path, is_derivable, is_valid_image_path};
use crate::report::{bold, cyan, green, red, yellow};
use crate::scan::{sources_from_paths, ReferenceRecord, ReferenceScanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Passed,
    PassedWithWarnings,
    Failed,
}

impl ValidationOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Failed => 1,
            Self::Passed | Self::PassedWithWarnings => 0,
        }
    }
}

/// A referenced JPEG/PNG whose derivative has not been generated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissingDerivative {
    pub source: String,
    pub format: DerivativeFormat,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub total_images: usize,
    pub total_references: usize,
    /// Broken references in the order they were found.
    pub broken: Vec<ReferenceRecord>,
    /// Distinct referenced paths that exist on disk.
    pub valid: BTreeSet<String>,
    /// Images on disk no valid reference mentions, sorted by public path.
    pub orphans: Vec<String>,
    pub missing_derivatives: Vec<MissingDerivative>,
}

impl ValidationReport {
    pub fn outcome(&self) -> ValidationOutcome {
        if !self.broken.is_empty() {
            ValidationOutcome::Failed
        } else if !self.orphans.is_empty() {
            ValidationOutcome::PassedWithWarnings
        } else {
            ValidationOutcome::Passed
        }
    }
}

/// Pure cross-reference of enumerated images against scanned references.
pub fn cross_reference(
    existing: &BTreeSet<ImageRecord>,
    references: &[ReferenceRecord],
) -> ValidationReport {
    let on_disk: HashSet<&str> = existing
        .iter()
        .map(|image| image.public_path.as_str())
        .collect();

    let mut broken = Vec::new();
    let mut valid = BTreeSet::new();
    for reference in references {
        if on_disk.contains(reference.path.as_str()) {
            valid.insert(reference.path.clone());
        } else {
            broken.push(reference.clone());
        }
    }

    let orphans = existing
        .iter()
        .filter(|image| !valid.contains(&image.public_path))
        .map(|image| image.public_path.clone())
        .collect();

    let mut missing_derivatives = Vec::new();
    for source in valid.iter().filter(|path| is_derivable(path)) {
        for format in [DerivativeFormat::Webp, DerivativeFormat::Avif] {
            let expected = derivative_public_path(source, format);
            if !on_disk.contains(expected.as_str()) {
                missing_derivatives.push(MissingDerivative {
                    source: source.clone(),
                    format,
                    expected,
                });
            }
        }
    }

    ValidationReport {
        total_images: existing.len(),
        total_references: references.len(),
        broken,
        valid,
        orphans,
        missing_derivatives,
    }
}

/// Enumerate, scan and cross-reference for the validator surface.
pub fn validate(layout: &SiteLayout, config: &PipelineConfig) -> Result<ValidationReport> {
    let existing = enumerate_images(layout, ExtensionSet::VALIDATOR)?;
    let scanner = ReferenceScanner::new(&layout.public_prefix)?;
    let sources = sources_from_paths(config.sources_for(ReferenceSurface::Validator));
    let references = scanner.scan_sources(&layout.project_root, &sources)?;
    Ok(cross_reference(&existing, &references))
}

pub fn render_report(
    report: &ValidationReport,
    public_prefix: &str,
    out: &mut impl Write,
) -> std::io::Result<()> {
    if !report.broken.is_empty() {
        writeln!(out, "{}", red("Broken References:"))?;
        for reference in &report.broken {
            let hint = if is_valid_image_path(&reference.path, public_prefix) {
                String::new()
            } else {
                format!(" {}", yellow("(not an image path)"))
            };
            writeln!(out, "  {} {}{}", red("*"), reference.path, hint)?;
            writeln!(
                out,
                "    {}",
                cyan(format!("{}:{}", reference.source_file, reference.line_number))
            )?;
        }
        writeln!(out)?;
    }

    if !report.orphans.is_empty() {
        writeln!(out, "{}", yellow("Orphaned Images (not referenced):"))?;
        for orphan in &report.orphans {
            writeln!(out, "  {} {}", yellow("?"), orphan)?;
        }
        writeln!(out)?;
    }

    if !report.missing_derivatives.is_empty() {
        writeln!(out, "{}", yellow("Missing Derivatives (run images-optimize):"))?;
        for missing in &report.missing_derivatives {
            writeln!(
                out,
                "  {} {} {}",
                yellow("~"),
                missing.expected,
                cyan(format!("({} of {})", missing.format, missing.source))
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", bold("=== Summary ==="))?;
    writeln!(out, "Total images on disk: {}", report.total_images)?;
    writeln!(
        out,
        "Total references in data files: {}",
        report.total_references
    )?;
    writeln!(out, "{}: {}", green("Valid references"), report.valid.len())?;
    writeln!(out, "{}: {}", red("Broken references"), report.broken.len())?;
    writeln!(out, "{}: {}", yellow("Orphaned images"), report.orphans.len())?;

    match report.outcome() {
        ValidationOutcome::Failed => writeln!(
            out,
            "{}",
            red("\nValidation FAILED - fix broken references before deploying")
        ),
        ValidationOutcome::PassedWithWarnings => writeln!(
            out,
            "{}",
            yellow("\nValidation PASSED with warnings - consider removing orphaned images")
        ),
        ValidationOutcome::Passed => writeln!(out, "{}", green("\nValidation PASSED")),
    }
}
