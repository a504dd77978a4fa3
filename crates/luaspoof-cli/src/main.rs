use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use luaspoof_cli::{
    CompressArgs, ConfigCommands, DecompressArgs, ForgeArgs, InspectArgs, OutputFormat,
    SpoofConfig, commands,
};

#[derive(Parser)]
#[command(
    name = "luaspoof",
    about = "Pack Lua bytecode into LZMA containers that carry a chosen CRC32",
    version,
    long_about = "Compresses <crc>.src.lua files into <crc>.lua containers whose decompressed \
                  contents hash to <crc>, and turns such containers back into sources."
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compress <crc>.src.lua files into <crc>.lua containers
    Compress(CompressArgs),

    /// Decompress <crc>.lua containers back into <crc>.src.lua files
    Decompress(DecompressArgs),

    /// Show the header and checksum status of a container
    Inspect(InspectArgs),

    /// Compute the four bytes that move one CRC32 to another
    Forge(ForgeArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Compress(args) => {
            commands::compress::handle(args, SpoofConfig::load(config_path)?, cli.format)?;
        }
        Commands::Decompress(args) => {
            commands::decompress::handle(args, SpoofConfig::load(config_path)?, cli.format)?;
        }
        Commands::Inspect(args) => commands::inspect::handle(args, cli.format)?,
        Commands::Forge(args) => commands::forge::handle(args, cli.format)?,
        Commands::Config(cmd) => commands::config::handle(cmd, config_path, cli.format)?,
    }

    Ok(())
}
