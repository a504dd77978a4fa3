use anyhow::Context;
use luaspoof_format::{ContainerHeader, HEADER_LEN, crc32, decompress_to_vec, read_header};
use serde::Serialize;
use std::fs;

use crate::output::{
    OutputStyle, create_table, format_crc, format_error, format_success, header_cell,
    numeric_cell, print_section_header, regular_cell, to_json,
};
use crate::{InspectArgs, OutputFormat};

/// Everything `inspect` reports about a container
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub asserted_checksum: u32,
    pub lzma_properties: u8,
    pub dict_size: u32,
    /// `None` while the size field still holds the placeholder
    pub recorded_size: Option<u64>,
    pub stream_size: u64,
    pub decoded_size: Option<u64>,
    pub decoded_checksum: Option<u32>,
    pub checksum_matches: Option<bool>,
    pub decode_error: Option<String>,
}

impl InspectReport {
    /// Parse the header, then try decoding the body
    ///
    /// A body that fails to decode is reported rather than treated as an error,
    /// so damaged containers can still be examined.
    pub fn from_container(container: &[u8]) -> anyhow::Result<Self> {
        let header = read_header(container)?;
        let mut report = Self::from_header(&header, container.len());

        match decompress_to_vec(container) {
            Ok(payload) => {
                let crc = crc32(&payload);
                report.decoded_size = Some(payload.len() as u64);
                report.decoded_checksum = Some(crc);
                report.checksum_matches = Some(crc == header.asserted_checksum);
            }
            Err(e) => report.decode_error = Some(e.to_string()),
        }

        Ok(report)
    }

    fn from_header(header: &ContainerHeader, container_len: usize) -> Self {
        Self {
            asserted_checksum: header.asserted_checksum,
            lzma_properties: header.lzma_properties,
            dict_size: header.dict_size,
            recorded_size: header
                .has_known_size()
                .then_some(header.uncompressed_size),
            stream_size: container_len.saturating_sub(HEADER_LEN) as u64,
            decoded_size: None,
            decoded_checksum: None,
            checksum_matches: None,
            decode_error: None,
        }
    }
}

pub fn handle(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let container =
        fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let report = InspectReport::from_container(&container)
        .with_context(|| format!("inspecting {}", args.file.display()))?;

    if let Some(json) = to_json(&report, format)? {
        println!("{json}");
        return Ok(());
    }

    let style = OutputStyle::new();
    print_section_header(&format!("Container {}", args.file.display()), &style);

    let mut table = create_table();
    table.set_header(vec![header_cell("Field", &style), header_cell("Value", &style)]);
    table.add_row(vec![
        regular_cell("Asserted CRC32"),
        numeric_cell(&format_crc(report.asserted_checksum)),
    ]);
    table.add_row(vec![
        regular_cell("LZMA properties"),
        numeric_cell(&format!("0x{:02x}", report.lzma_properties)),
    ]);
    table.add_row(vec![
        regular_cell("Dictionary size"),
        numeric_cell(&report.dict_size.to_string()),
    ]);
    table.add_row(vec![
        regular_cell("Recorded size"),
        numeric_cell(
            &report
                .recorded_size
                .map_or_else(|| "unknown".to_string(), |size| size.to_string()),
        ),
    ]);
    table.add_row(vec![
        regular_cell("Stream size"),
        numeric_cell(&report.stream_size.to_string()),
    ]);
    if let (Some(size), Some(crc)) = (report.decoded_size, report.decoded_checksum) {
        table.add_row(vec![regular_cell("Decoded size"), numeric_cell(&size.to_string())]);
        table.add_row(vec![regular_cell("Decoded CRC32"), numeric_cell(&format_crc(crc))]);
    }
    println!("{table}");

    match (report.checksum_matches, &report.decode_error) {
        (Some(true), _) => println!("{}", format_success("✓ Checksum matches", &style)),
        (Some(false), _) => {
            println!("{}", format_error("✗ Checksum does not match", &style));
        }
        (None, Some(e)) => {
            println!("{}", format_error(&format!("✗ Decode failed: {e}"), &style));
        }
        (None, None) => {}
    }

    Ok(())
}
