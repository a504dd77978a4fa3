use crate::{DecompressArgs, Direction, OutputFormat, SpoofConfig};

pub fn handle(
    args: DecompressArgs,
    mut config: SpoofConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    config.overwrite_existing |= args.force;

    super::run_batch(Direction::Decompress, &args.path, &config, format)
}
