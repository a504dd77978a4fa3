use crate::{CompressArgs, Direction, OutputFormat, SpoofConfig};

pub fn handle(
    args: CompressArgs,
    mut config: SpoofConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if let Some(dict_size) = args.dict_size {
        config.dict_size = dict_size;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    super::run_batch(Direction::Compress, &args.path, &config, format)
}
