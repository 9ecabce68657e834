//! WebP/AVIF derivative generation.
//!
//! Every JPEG/PNG source under the images root gets a `.webp` and an `.avif`
//! sibling. A derivative is (re)generated when it is missing, or when the
//! source's byte size differs from the size recorded in the manifest. The
//! manifest is updated for every source that processes without error, even
//! when nothing was regenerated, so an edit is detected on the run after it
//! happens.
//!
//! Per image:
//!
//! ```text
//! Unprocessed -> SizeChecked -> WebP (skip|generate) -> AVIF (skip|generate) -> ManifestUpdated
//!                     \______________ any error ______________/-> Failed (manifest untouched)
//! ```

mod encode;

pub use encode::{
    standard_encoders, AvifEncoder, DerivativeEncoder, DerivativeFormat, WebpEncoder,
    AVIF_QUALITY, AVIF_SPEED, WEBP_QUALITY,
};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::enumerate::{enumerate_images, ExtensionSet, ImageRecord};
use crate::layout::SiteLayout;
use crate::manifest::SizeManifest;
use crate::report::{bold, dim, format_file_size, green, red, savings_percent, yellow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeReason {
    /// The derivative did not exist.
    New,
    /// The derivative existed but the source size no longer matches the manifest.
    SourceChanged,
}

impl DerivativeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::SourceChanged => "source-changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeOutcome {
    pub output_path: PathBuf,
    pub format: DerivativeFormat,
    pub size_bytes: u64,
    pub savings_percent: f64,
    pub reason: DerivativeReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutcome {
    pub relative_path: String,
    pub original_size: u64,
    pub dimensions: (u32, u32),
    pub outputs: Vec<DerivativeOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub relative_path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageResult {
    Done(ImageOutcome),
    Failed(ImageFailure),
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug)]
pub enum OptimizeEvent<'a> {
    Started {
        source_images: usize,
        manifest_entries: usize,
        manifest_warning: Option<&'a str>,
    },
    Image(&'a ImageResult),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizeSummary {
    pub source_images: usize,
    pub derivatives_created: usize,
    pub total_original_size: u64,
    pub total_optimized_size: u64,
    pub failures: Vec<ImageFailure>,
    pub manifest_save_warning: Option<String>,
}

impl OptimizeSummary {
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    /// Savings across everything produced this run; `None` when nothing
    /// was produced.
    pub fn average_savings(&self) -> Option<f64> {
        if self.total_optimized_size == 0 {
            return None;
        }
        Some(savings_percent(
            self.total_original_size,
            self.total_optimized_size,
        ))
    }
}

/// Where the `format` derivative of `source` is written.
pub fn derivative_path(source: &Path, format: DerivativeFormat) -> PathBuf {
    source.with_extension(format.extension())
}

pub struct Optimizer {
    encoders: Vec<Box<dyn DerivativeEncoder>>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(standard_encoders())
    }
}

impl Optimizer {
    pub fn new(encoders: Vec<Box<dyn DerivativeEncoder>>) -> Self {
        Self { encoders }
    }

    pub fn encoders(&self) -> &[Box<dyn DerivativeEncoder>] {
        &self.encoders
    }

    /// Process every source image and persist the manifest once at the end.
    pub fn run(
        &self,
        layout: &SiteLayout,
        mut on_event: impl FnMut(OptimizeEvent<'_>),
    ) -> Result<OptimizeSummary> {
        let sources = enumerate_images(layout, ExtensionSet::SOURCES)?;
        let load = SizeManifest::load(&layout.manifest_path);
        let mut manifest = load.manifest;

        on_event(OptimizeEvent::Started {
            source_images: sources.len(),
            manifest_entries: manifest.len(),
            manifest_warning: load.warning.as_deref(),
        });

        let mut summary = OptimizeSummary {
            source_images: sources.len(),
            ..OptimizeSummary::default()
        };

        for record in &sources {
            let result = match self.process_image(layout, record, &manifest) {
                Ok(outcome) => {
                    manifest.record(&outcome.relative_path, outcome.original_size);
                    summary.total_original_size += outcome.original_size;
                    summary.derivatives_created += outcome.outputs.len();
                    summary.total_optimized_size += outcome
                        .outputs
                        .iter()
                        .map(|output| output.size_bytes)
                        .sum::<u64>();
                    ImageResult::Done(outcome)
                }
                Err(err) => {
                    let failure = ImageFailure {
                        relative_path: record.relative_path.clone(),
                        message: format!("{err:#}"),
                    };
                    tracing::warn!(image = %failure.relative_path, error = %failure.message, "image failed");
                    summary.failures.push(failure.clone());
                    ImageResult::Failed(failure)
                }
            };
            on_event(OptimizeEvent::Image(&result));
        }

        // Rewritten on every run, even with no sources; a missing images
        // root is left missing.
        if layout.images_root.is_dir() {
            if let Err(err) = manifest.save(&layout.manifest_path) {
                summary.manifest_save_warning = Some(format!("{err:#}"));
            }
        }

        Ok(summary)
    }

    /// Bring one source's derivatives up to date.
    ///
    /// The manifest is only read here; the caller records the new size once
    /// the whole image succeeded.
    pub fn process_image(
        &self,
        layout: &SiteLayout,
        record: &ImageRecord,
        manifest: &SizeManifest,
    ) -> Result<ImageOutcome> {
        let source = layout.image_path(&record.relative_path);
        let original_size = fs::metadata(&source)
            .with_context(|| format!("reading size of '{}'", source.display()))?
            .len();
        let dimensions = open_source(&source)?
            .into_dimensions()
            .with_context(|| format!("reading dimensions of '{}'", source.display()))?;
        let size_changed = manifest.size_changed(&record.relative_path, original_size);

        let mut decoded: Option<DynamicImage> = None;
        let mut outputs = Vec::new();

        for encoder in &self.encoders {
            let format = encoder.format();
            let output_path = derivative_path(&source, format);
            let exists = output_path.is_file();
            if exists && !size_changed {
                tracing::debug!(image = %record.relative_path, %format, "derivative up to date");
                continue;
            }

            let image = match decoded.take() {
                Some(image) => image,
                None => open_source(&source)?
                    .decode()
                    .with_context(|| format!("decoding '{}'", source.display()))?,
            };
            let bytes = encoder
                .encode(&image)
                .with_context(|| format!("encoding {format} for '{}'", source.display()))?;
            decoded = Some(image);

            fs::write(&output_path, &bytes)
                .with_context(|| format!("writing '{}'", output_path.display()))?;

            let size_bytes = bytes.len() as u64;
            let reason = if exists {
                DerivativeReason::SourceChanged
            } else {
                DerivativeReason::New
            };
            tracing::debug!(
                image = %record.relative_path,
                %format,
                reason = reason.as_str(),
                size_bytes,
                "derivative written"
            );
            outputs.push(DerivativeOutcome {
                output_path,
                format,
                size_bytes,
                savings_percent: savings_percent(original_size, size_bytes),
                reason,
            });
        }

        Ok(ImageOutcome {
            relative_path: record.relative_path.clone(),
            original_size,
            dimensions,
            outputs,
        })
    }
}

/// Open a source for decoding, trusting its content over its extension.
fn open_source(source: &Path) -> Result<ImageReader<BufReader<File>>> {
    ImageReader::open(source)
        .with_context(|| format!("opening '{}'", source.display()))?
        .with_guessed_format()
        .with_context(|| format!("detecting image format of '{}'", source.display()))
}

/// One progress line for a processed image, keyed by its relative path.
pub fn render_image_line(result: &ImageResult) -> (&str, String) {
    match result {
        ImageResult::Failed(failure) => (
            failure.relative_path.as_str(),
            red(format!("Error: {}", failure.message)),
        ),
        ImageResult::Done(outcome) if outcome.outputs.is_empty() => {
            (outcome.relative_path.as_str(), dim("(already optimized)"))
        }
        ImageResult::Done(outcome) => {
            let line = outcome
                .outputs
                .iter()
                .map(|output| {
                    let tag = match output.reason {
                        DerivativeReason::SourceChanged => yellow(" [source changed]"),
                        DerivativeReason::New => String::new(),
                    };
                    format!(
                        "{}: {} smaller{}",
                        output.format,
                        green(format!("{:.0}%", output.savings_percent)),
                        tag
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            (outcome.relative_path.as_str(), line)
        }
    }
}

pub fn render_summary(summary: &OptimizeSummary, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{}", bold("\n=== Summary ==="))?;
    writeln!(out, "Source images: {}", summary.source_images)?;
    writeln!(out, "New files created: {}", summary.derivatives_created)?;
    writeln!(
        out,
        "Total original size: {}",
        format_file_size(summary.total_original_size)
    )?;
    if summary.total_optimized_size > 0 {
        writeln!(
            out,
            "Total optimized size: {}",
            format_file_size(summary.total_optimized_size)
        )?;
    }
    if let Some(savings) = summary.average_savings() {
        writeln!(out, "Average savings: {}", green(format!("{savings:.0}%")))?;
    }
    if summary.error_count() > 0 {
        writeln!(out, "{}", red(format!("Errors: {}", summary.error_count())))?;
    }
    if let Some(warning) = &summary.manifest_save_warning {
        writeln!(
            out,
            "{}",
            yellow(format!("Warning: Could not save manifest: {warning}"))
        )?;
    }
    writeln!(out, "{}", green("\nOptimization complete!"))
}
