use anyhow::ensure;
use luaspoof_format::{RunningCrc, forge_suffix};
use serde::Serialize;

use crate::output::{OutputStyle, format_crc, format_key_value, to_json};
use crate::{ForgeArgs, OutputFormat};

#[derive(Debug, Serialize)]
struct ForgeReport {
    crc: u32,
    target: u32,
    suffix: String,
}

pub fn handle(args: ForgeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let suffix = forge_suffix(args.crc, args.target);

    let mut check = RunningCrc::resume(args.crc, 0);
    check.update(&suffix);
    ensure!(
        check.value() == args.target,
        "forged suffix yields {} instead of {}",
        format_crc(check.value()),
        format_crc(args.target)
    );

    let report = ForgeReport {
        crc: args.crc,
        target: args.target,
        suffix: hex::encode(suffix),
    };

    if let Some(json) = to_json(&report, format)? {
        println!("{json}");
        return Ok(());
    }

    let style = OutputStyle::new();
    println!("{}", format_key_value("From", &format_crc(report.crc), &style));
    println!("{}", format_key_value("To", &format_crc(report.target), &style));
    println!("{}", format_key_value("Append", &report.suffix, &style));
    Ok(())
}
