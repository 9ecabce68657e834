use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use asset_pipeline::cli::{load_site, reject_arguments, run_tool};
use asset_pipeline::optimize::{render_image_line, render_summary, OptimizeEvent, Optimizer};
use asset_pipeline::preflight::check_codecs;
use asset_pipeline::report::{bold, cyan, dim, yellow};

fn main() -> ExitCode {
    run_tool(run)
}

fn run() -> Result<u8> {
    reject_arguments("images-optimize")?;
    let (layout, _config) = load_site()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", bold("\n=== Image Optimizer ===\n"))?;

    let optimizer = Optimizer::default();
    if let Err(err) = check_codecs(optimizer.encoders()) {
        writeln!(out, "{}", yellow(format!("{err:#}")))?;
        writeln!(out, "{}", dim("Rebuild with: cargo install --path . --force"))?;
        writeln!(out)?;
        return Ok(1);
    }

    let mut write_result: std::io::Result<()> = Ok(());
    let summary = optimizer.run(&layout, |event| {
        if write_result.is_err() {
            return;
        }
        write_result = match event {
            OptimizeEvent::Started {
                source_images,
                manifest_entries,
                manifest_warning,
            } => {
                let mut lines = Vec::new();
                if let Some(warning) = manifest_warning {
                    lines.push(yellow(format!("Warning: Could not load manifest: {warning}")));
                }
                lines.push(format!("Found {source_images} source images to optimize\n"));
                if manifest_entries > 0 {
                    lines.push(format!("Loaded manifest with {manifest_entries} entries\n"));
                }
                lines.iter().try_for_each(|line| writeln!(out, "{line}"))
            }
            OptimizeEvent::Image(result) => {
                let (relative_path, line) = render_image_line(result);
                let display = layout.display_relative(&layout.image_path(relative_path));
                writeln!(out, "Processing {}... {}", cyan(display), line)
            }
        };
    })?;
    write_result?;

    render_summary(&summary, &mut out)?;
    Ok(0)
}
