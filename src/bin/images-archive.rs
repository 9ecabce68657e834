use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use asset_pipeline::archive::{
    archive_orphans, collect_orphans, render_header, render_move, render_summary,
};
use asset_pipeline::cli::{load_site, reject_arguments, run_tool};
use asset_pipeline::report::bold;

fn main() -> ExitCode {
    run_tool(run)
}

fn run() -> Result<u8> {
    reject_arguments("images-archive")?;
    let (layout, config) = load_site()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", bold("\n=== Archive Orphaned Images ===\n"))?;

    let orphans = collect_orphans(&layout, &config)?;
    render_header(orphans.len(), &mut out)?;
    if orphans.is_empty() {
        return Ok(0);
    }

    let mut write_error = None;
    let summary = archive_orphans(&layout, &orphans, |relative_path, result| {
        if write_error.is_none() {
            write_error = render_move(relative_path, result, &mut out).err();
        }
    });
    if let Some(err) = write_error {
        return Err(err.into());
    }

    let archive_display = layout.display_relative(&layout.archive_root);
    render_summary(&summary, &archive_display, &mut out)?;

    // Per-file failures are reported above; they do not fail the run.
    Ok(0)
}
