use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use asset_pipeline::cli::{load_site, reject_arguments, run_tool};
use asset_pipeline::report::bold;
use asset_pipeline::validate::{render_report, validate};

fn main() -> ExitCode {
    run_tool(run)
}

fn run() -> Result<u8> {
    reject_arguments("images-validate")?;
    let (layout, config) = load_site()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", bold("\n=== Image Validator ===\n"))?;

    let report = validate(&layout, &config)?;
    render_report(&report, &layout.public_prefix, &mut out)?;

    Ok(report.outcome().exit_code())
}
