//! luaspoof command-line library
//!
//! Hosts everything around the container core: file name patterns, batch
//! processing of files and directories, configuration, and the command
//! handlers behind the `luaspoof` binary.

pub mod batch;
pub mod commands;
pub mod config;
pub mod output;
pub mod pattern;

use clap::{Args, Subcommand};
use std::path::PathBuf;

pub use batch::{BatchJob, BatchReport, Direction};
pub use config::{ConfigError, SpoofConfig};
pub use pattern::{NameMatch, NamePattern};

/// Options for `luaspoof compress`
#[derive(Debug, Args)]
pub struct CompressArgs {
    /// File (`<crc>.src.lua`) or directory of files to compress
    pub path: PathBuf,

    /// LZMA dictionary size in bytes
    #[arg(long)]
    pub dict_size: Option<u32>,

    /// Read size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

/// Options for `luaspoof decompress`
#[derive(Debug, Args)]
pub struct DecompressArgs {
    /// File (`<crc>.lua`) or directory of files to decompress
    pub path: PathBuf,

    /// Read size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overwrite outputs that already exist
    #[arg(short, long)]
    pub force: bool,
}

/// Options for `luaspoof inspect`
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Container to inspect
    pub file: PathBuf,
}

/// Options for `luaspoof forge`
#[derive(Debug, Args)]
pub struct ForgeArgs {
    /// Current CRC32 of the data (decimal or 0x-prefixed hex)
    #[arg(value_parser = parse_crc)]
    pub crc: u32,

    /// CRC32 the data should end up with (decimal or 0x-prefixed hex)
    #[arg(value_parser = parse_crc)]
    pub target: u32,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the default configuration file location
    Path,
}

/// Output format options for the CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON output
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// Parse a CRC given either as decimal or as `0x`-prefixed hex
pub fn parse_crc(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|e| format!("'{value}' is not a 32-bit CRC: {e}"))
}
