//! Static image asset pipeline for a single-page site.
//!
//! Three tools share this crate:
//!
//! - **images-validate** - Every image path referenced from source exists on disk
//! - **images-archive** - Move unreferenced images into the archive subtree
//! - **images-optimize** - Generate WebP/AVIF derivatives for JPEG/PNG sources
//!
//! # Architecture
//!
//! ```text
//! asset-pipeline (this crate)
//!     │
//!     ├── config / layout   project root, images root, public prefix
//!     ├── enumerate         images on disk (archive subtree excluded)
//!     ├── scan              quoted image paths in source files
//!     │
//!     ├── validate ─────────┐ enumerate + scan, read only
//!     ├── archive ──────────┤ enumerate + scan, moves orphans
//!     └── optimize ─────────┘ enumerate + manifest, writes derivatives
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use asset_pipeline::cli::load_site;
//! use asset_pipeline::validate::validate;
//!
//! let (layout, config) = load_site()?;
//! let report = validate(&layout, &config)?;
//! std::process::exit(report.outcome().exit_code().into());
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod enumerate;
pub mod filesystem;
pub mod layout;
pub mod manifest;
pub mod optimize;
pub mod paths;
pub mod preflight;
pub mod report;
pub mod scan;
pub mod validate;

pub use config::PipelineConfig;
pub use layout::SiteLayout;
