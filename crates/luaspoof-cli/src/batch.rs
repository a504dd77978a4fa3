//! Batch processing of files and directories
//!
//! A path is either a single file or a directory whose immediate entries are
//! considered. Names that do not fit the pattern are skipped silently; a
//! failure on one file is logged, its partial output removed, and the rest of
//! the batch carries on.

use anyhow::{Context, Result, bail};
use luaspoof_format::{
    CompressOptions, CompressSummary, DecompressOptions, DecompressSummary, compress_with_options,
    decompress_with_options,
};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::SpoofConfig;
use crate::pattern::NamePattern;

/// Which way a batch converts files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `<crc>.src.lua` to `<crc>.lua`
    Compress,
    /// `<crc>.lua` to `<crc>.src.lua`
    Decompress,
}

/// Outcome counts for a batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// A configured batch run
#[derive(Debug)]
pub struct BatchJob {
    direction: Direction,
    pattern: NamePattern,
    compress: CompressOptions,
    decompress: DecompressOptions,
    overwrite_existing: bool,
}

impl BatchJob {
    pub fn new(direction: Direction, config: &SpoofConfig) -> Result<Self> {
        let pattern = match direction {
            Direction::Compress => NamePattern::new(&config.source_suffix, &config.output_suffix),
            Direction::Decompress => NamePattern::new(&config.output_suffix, &config.source_suffix),
        }
        .context("building file name pattern")?;

        Ok(Self {
            direction,
            pattern,
            compress: config.compress_options(),
            decompress: config.decompress_options(),
            overwrite_existing: config.overwrite_existing,
        })
    }

    /// Process a file, or every file directly inside a directory
    pub fn run(&self, path: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for file in candidates(path)? {
            self.process(&file, &mut report);
        }

        debug!(
            "Batch finished: {} processed, {} skipped, {} failed",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    fn process(&self, path: &Path, report: &mut BatchReport) {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            debug!("Skipping {}: file name is not UTF-8", path.display());
            report.skipped += 1;
            return;
        };

        let Some(name_match) = self.pattern.match_name(file_name) else {
            debug!("Skipping '{file_name}': name does not match");
            report.skipped += 1;
            return;
        };

        let output = path.with_file_name(&name_match.output_name);
        if output == path {
            warn!("Skipping '{file_name}': it would be written over itself");
            report.skipped += 1;
            return;
        }

        let result = match self.direction {
            Direction::Compress => {
                let Some(target) = name_match.checksum() else {
                    warn!(
                        "Skipping '{file_name}': {} does not fit in a 32-bit CRC",
                        name_match.digits
                    );
                    report.skipped += 1;
                    return;
                };

                info!("Compressing '{file_name}'");
                compress_file(path, &output, target, &self.compress).map(|summary| {
                    debug!("{}: {summary}", output.display());
                })
            }
            Direction::Decompress => {
                if output.exists() && !self.overwrite_existing {
                    debug!("Skipping '{file_name}': {} already exists", output.display());
                    report.skipped += 1;
                    return;
                }

                info!("Decompressing '{file_name}'");
                decompress_file(path, &output, &self.decompress).map(|_| ())
            }
        };

        match result {
            Ok(()) => report.processed += 1,
            Err(e) => {
                error!("{file_name}: {e:#}");
                report.failed += 1;
            }
        }
    }
}

/// Files a path stands for: itself, or the files directly inside it
fn candidates(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        bail!("{} is neither a file nor a directory", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("listing {}", path.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Remove a partially written output; the failure that caused it is reported by the caller
fn discard_partial(output: &Path) {
    if let Err(e) = fs::remove_file(output) {
        debug!("Could not remove partial output {}: {e}", output.display());
    }
}

/// Compress one file into a container asserting `target`
pub fn compress_file(
    input: &Path,
    output: &Path,
    target: u32,
    options: &CompressOptions,
) -> Result<CompressSummary> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("opening {}", input.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("creating {}", output.display()))?,
    );

    let result = compress_with_options(reader, &mut writer, target, options);
    drop(writer);

    result
        .with_context(|| format!("compressing {} into {}", input.display(), output.display()))
        .inspect_err(|_| discard_partial(output))
}

/// Decompress one container file
pub fn decompress_file(
    input: &Path,
    output: &Path,
    options: &DecompressOptions,
) -> Result<DecompressSummary> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("opening {}", input.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("creating {}", output.display()))?,
    );

    let result = decompress_with_options(reader, &mut writer, options);
    drop(writer);

    result
        .with_context(|| format!("decompressing {} into {}", input.display(), output.display()))
        .inspect_err(|_| discard_partial(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use luaspoof_format::{crc32, read_header};
    use pretty_assertions::assert_eq;

    fn job(direction: Direction) -> BatchJob {
        BatchJob::new(direction, &SpoofConfig::default()).expect("valid job")
    }

    #[test]
    fn test_compress_single_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("3735928559.src.lua");
        fs::write(&source, b"print('hello')").expect("write source");

        let report = job(Direction::Compress).run(&source).expect("run");
        assert_eq!(
            report,
            BatchReport {
                processed: 1,
                skipped: 0,
                failed: 0
            }
        );

        let container = fs::read(dir.path().join("3735928559.lua")).expect("read output");
        let header = read_header(&container).expect("header");
        assert_eq!(header.asserted_checksum, 0xDEAD_BEEF);
        assert_eq!(header.uncompressed_size, 18);
    }

    #[test]
    fn test_round_trip_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("1.src.lua"), b"return 1").expect("write");
        fs::write(dir.path().join("2.src.lua"), b"return 2").expect("write");
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");
        fs::create_dir(dir.path().join("3.src.lua")).expect("mkdir");

        let report = job(Direction::Compress).run(dir.path()).expect("run");
        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);

        fs::remove_file(dir.path().join("1.src.lua")).expect("remove");
        fs::remove_file(dir.path().join("2.src.lua")).expect("remove");

        let report = job(Direction::Decompress).run(dir.path()).expect("run");
        assert_eq!(report.processed, 2);

        let one = fs::read(dir.path().join("1.src.lua")).expect("read");
        assert!(one.starts_with(b"return 1"));
        assert_eq!(crc32(&one), 1);

        let two = fs::read(dir.path().join("2.src.lua")).expect("read");
        assert!(two.starts_with(b"return 2"));
        assert_eq!(crc32(&two), 2);
    }

    #[test]
    fn test_decompress_skips_existing_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("5.src.lua");
        fs::write(&source, b"return 5").expect("write");
        job(Direction::Compress).run(&source).expect("compress");

        fs::write(&source, b"keep me").expect("overwrite source");
        let report = job(Direction::Decompress)
            .run(&dir.path().join("5.lua"))
            .expect("run");
        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed, 0);
        assert_eq!(fs::read(&source).expect("read"), b"keep me");

        let config = SpoofConfig {
            overwrite_existing: true,
            ..SpoofConfig::default()
        };
        let report = BatchJob::new(Direction::Decompress, &config)
            .expect("job")
            .run(&dir.path().join("5.lua"))
            .expect("run");
        assert_eq!(report.processed, 1);
        assert!(fs::read(&source).expect("read").starts_with(b"return 5"));
    }

    #[test]
    fn test_non_matching_file_is_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("init.lua");
        fs::write(&source, b"return {}").expect("write");

        let report = job(Direction::Compress).run(&source).expect("run");
        assert_eq!(report.skipped, 1);
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 1);
    }

    #[test]
    fn test_oversized_checksum_is_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("99999999999.src.lua"), b"x").expect("write");

        let report = job(Direction::Compress).run(dir.path()).expect("run");
        assert_eq!(report.skipped, 1);
        assert!(!dir.path().join("99999999999.lua").exists());
    }

    #[test]
    fn test_corrupt_container_fails_and_cleans_up() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("8.lua"), b"not a container").expect("write");
        fs::write(dir.path().join("9.src.lua"), b"return 9").expect("write");
        job(Direction::Compress)
            .run(&dir.path().join("9.src.lua"))
            .expect("compress");
        fs::remove_file(dir.path().join("9.src.lua")).expect("remove");

        let report = job(Direction::Decompress).run(dir.path()).expect("run");
        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
        assert!(!dir.path().join("8.src.lua").exists());
        assert!(dir.path().join("9.src.lua").exists());
    }

    #[test]
    fn test_file_never_written_over_itself() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("5.lua.z");
        fs::write(&source, b"return 5").expect("write");

        let config = SpoofConfig {
            source_suffix: ".lua".to_string(),
            output_suffix: ".lua.z".to_string(),
            ..SpoofConfig::default()
        };
        let report = BatchJob::new(Direction::Compress, &config)
            .expect("job")
            .run(&source)
            .expect("run");

        assert_eq!(
            report,
            BatchReport {
                processed: 0,
                skipped: 1,
                failed: 0
            }
        );
        assert_eq!(fs::read(&source).expect("read"), b"return 5");
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(job(Direction::Compress).run(&dir.path().join("nope")).is_err());
    }
}
