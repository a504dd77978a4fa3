pub mod compress;
pub mod config;
pub mod decompress;
pub mod forge;
pub mod inspect;

use anyhow::bail;
use std::path::Path;

use crate::output::{OutputStyle, format_error, format_success, format_warning, to_json};
use crate::{BatchJob, BatchReport, Direction, OutputFormat, SpoofConfig};

/// Run a batch and report it, failing if any file failed
fn run_batch(
    direction: Direction,
    path: &Path,
    config: &SpoofConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    config.validate()?;

    let report = BatchJob::new(direction, config)?.run(path)?;
    print_report(&report, format)?;

    if report.failed > 0 {
        bail!("{} of {} files failed", report.failed, report.failed + report.processed);
    }
    Ok(())
}

fn print_report(report: &BatchReport, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(json) = to_json(report, format)? {
        println!("{json}");
        return Ok(());
    }

    let style = OutputStyle::new();
    let summary = format!(
        "{} processed, {} skipped, {} failed",
        report.processed, report.skipped, report.failed
    );

    if report.failed > 0 {
        println!("{}", format_error(&summary, &style));
    } else if report.processed == 0 {
        println!("{}", format_warning(&summary, &style));
    } else {
        println!("{}", format_success(&summary, &style));
    }
    Ok(())
}
