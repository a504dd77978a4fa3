use anyhow::anyhow;
use std::path::Path;

use crate::output::to_json;
use crate::{ConfigCommands, OutputFormat, SpoofConfig};

pub fn handle(
    cmd: ConfigCommands,
    explicit: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(&SpoofConfig::load(explicit)?, format),
        ConfigCommands::Path => show_path(explicit, format),
    }
}

fn show_config(config: &SpoofConfig, format: OutputFormat) -> anyhow::Result<()> {
    match to_json(config, format)? {
        Some(json) => println!("{json}"),
        None => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

fn show_path(explicit: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => SpoofConfig::default_path()
            .ok_or_else(|| anyhow!("no configuration directory on this platform"))?,
    };

    let value = serde_json::json!({
        "path": path.display().to_string(),
        "exists": path.exists(),
    });
    match to_json(&value, format)? {
        Some(json) => println!("{json}"),
        None => println!("{}", path.display()),
    }
    Ok(())
}
