//! Plumbing shared by the `images-*` binaries.

use anyhow::{bail, Result};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{load_config, PipelineConfig};
use crate::layout::{resolve_project_root, SiteLayout};
use crate::report::red;

/// Diagnostics go to stderr so the report on stdout stays clean.
/// `RUST_LOG` controls verbosity; the default only shows warnings.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// None of the tools take arguments.
pub fn reject_arguments(tool: &str) -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        bail!(
            "unexpected arguments: {}\nUsage:\n  {tool}\n\nRun from the project root (or set IMAGE_PIPELINE_ROOT).",
            args.join(" ")
        );
    }
    Ok(())
}

/// Resolve the project root and load its configuration.
pub fn load_site() -> Result<(SiteLayout, PipelineConfig)> {
    let project_root = resolve_project_root()?;
    let config = load_config(&project_root)?;
    let layout = SiteLayout::new(&project_root, &config);
    tracing::debug!(
        project_root = %layout.project_root.display(),
        images_root = %layout.images_root.display(),
        "resolved site layout"
    );
    Ok((layout, config))
}

/// Run a tool body, printing any escaping error and mapping it to exit 1.
pub fn run_tool(tool: impl FnOnce() -> Result<u8>) -> ExitCode {
    init_tracing();
    match tool() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {err:#}", red("Error:"));
            ExitCode::FAILURE
        }
    }
}
