// src/process/clean.rs
use csv::{ByteRecord, StringRecord, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::error::CleanError;
use crate::process::{
    identifier::AbnRule,
    read_lossy, tolerant_reader,
    utils::{is_blank_record, open_input, staging_path},
};
use crate::schema::compare_header;

/// Default number of emitted rows between progress lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Per-file settings for [`CsvNormalizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanOptions {
    /// Width every data row is forced to. Overridden by the header's width when they disagree.
    pub expected_columns: usize,
    /// Stop after emitting this many data rows.
    pub max_rows: Option<u64>,
    /// Drop rows whose identifier field is not an ABN.
    pub identifier: Option<AbnRule>,
    /// Column names the header is checked against; mismatches are only logged.
    pub column_names: Option<Vec<String>>,
    pub progress_interval: u64,
}

impl CleanOptions {
    pub fn new(expected_columns: usize) -> Self {
        Self {
            expected_columns,
            max_rows: None,
            identifier: None,
            column_names: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_max_rows(mut self, max_rows: Option<u64>) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_identifier(mut self, rule: Option<AbnRule>) -> Self {
        self.identifier = rule;
        self
    }

    pub fn with_column_names(mut self, names: Option<Vec<String>>) -> Self {
        self.column_names = names;
        self
    }

    pub fn with_progress_interval(mut self, every: u64) -> Self {
        self.progress_interval = every;
        self
    }
}

/// Counters for a single cleaning run. Diagnostic only, never persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    /// Records parsed from the input, header and blank lines included.
    pub records_read: u64,
    /// Data rows written to the output (header excluded).
    pub data_rows: u64,
    pub padded_rows: u64,
    pub truncated_rows: u64,
    pub skipped_invalid_id: u64,
    /// Records the parser rejected outright; never emitted.
    pub malformed_rows: u64,
    /// Records kept after replacing invalid UTF-8 bytes with U+FFFD.
    pub reencoded_rows: u64,
    pub blank_rows: u64,
    /// Width actually enforced, after any header override.
    pub expected_columns: usize,
    /// True when the loop stopped on the row ceiling, including when the input
    /// happened to end exactly at that row.
    pub ceiling_reached: bool,
}

/// Streams one delimited file into a shape-valid copy.
///
/// Memory use is one record buffer plus the writer's buffer, independent of input size.
#[derive(Debug, Clone)]
pub struct CsvNormalizer {
    options: CleanOptions,
}

impl CsvNormalizer {
    pub fn new(options: CleanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    /// Clean `input` into `output`.
    ///
    /// Rows go to `<output>.partial` first, which is renamed onto `output` only after
    /// the writer is flushed and synced. On error the staging file is left behind.
    #[tracing::instrument(
        level = "info",
        skip(self, input, output),
        fields(input = %input.as_ref().display())
    )]
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<CleanStats, CleanError> {
        let input = input.as_ref();
        let output = output.as_ref();
        let opts = &self.options;
        let start = Instant::now();

        info!(
            output = %output.display(),
            expected_columns = opts.expected_columns,
            max_rows = ?opts.max_rows,
            "starting clean"
        );

        let mut rdr = tolerant_reader(open_input(input)?);
        let mut stats = CleanStats::default();
        let mut raw = ByteRecord::new();
        let mut record = StringRecord::new();

        // 1) header: first non-blank record. A parse failure here is fatal so a
        //    data row is never promoted to header.
        let header = loop {
            match read_lossy(&mut rdr, &mut raw, &mut record) {
                Ok(Some(lossy)) => {
                    stats.records_read += 1;
                    if is_blank_record(&record) {
                        stats.blank_rows += 1;
                        continue;
                    }
                    if lossy {
                        warn!("header contains invalid UTF-8; replaced with U+FFFD");
                        stats.reencoded_rows += 1;
                    }
                    break record.clone();
                }
                Ok(None) => return Err(CleanError::EmptyInput(input.to_path_buf())),
                Err(e) => return Err(CleanError::csv(input, e)),
            }
        };

        let mut expected = opts.expected_columns;
        if header.len() != expected {
            warn!(
                header_columns = header.len(),
                configured_columns = expected,
                "header width overrides configured column count for this run"
            );
            expected = header.len();
        }
        stats.expected_columns = expected;

        if let Some(names) = &opts.column_names {
            for mismatch in header_mismatches(&header, names) {
                warn!("header name mismatch: {}", mismatch);
            }
        }

        // 2) open the staging output
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CleanError::io(parent, e))?;
        }
        let staging = staging_path(output);
        let file = File::create(&staging).map_err(|e| CleanError::io(&staging, e))?;
        let mut wtr = WriterBuilder::new().from_writer(BufWriter::new(file));
        wtr.write_record(&header)
            .map_err(|e| CleanError::csv(&staging, e))?;

        // 3) data rows
        loop {
            if let Some(max) = opts.max_rows {
                if stats.data_rows >= max {
                    stats.ceiling_reached = true;
                    info!(max_rows = max, "row ceiling reached; stopping");
                    break;
                }
            }

            let lossy = match read_lossy(&mut rdr, &mut raw, &mut record) {
                Ok(Some(lossy)) => lossy,
                Ok(None) => break,
                Err(e) if e.is_io_error() => return Err(CleanError::csv(input, e)),
                Err(e) => {
                    debug!(error = %e, "skipping malformed record");
                    stats.malformed_rows += 1;
                    continue;
                }
            };
            stats.records_read += 1;

            if is_blank_record(&record) {
                stats.blank_rows += 1;
                continue;
            }

            if let Some(rule) = &opts.identifier {
                if !rule.accepts(&record) {
                    stats.skipped_invalid_id += 1;
                    continue;
                }
            }

            if lossy {
                stats.reencoded_rows += 1;
            }
            write_normalized(&mut wtr, &record, expected, &mut stats)
                .map_err(|e| CleanError::csv(&staging, e))?;
            stats.data_rows += 1;

            if opts.progress_interval > 0 && stats.data_rows % opts.progress_interval == 0 {
                info!(rows = stats.data_rows, "progress");
            }
        }

        // 4) flush, sync, publish
        wtr.flush().map_err(|e| CleanError::io(&staging, e))?;
        let buf = wtr.into_inner().map_err(|e| {
            CleanError::io(&staging, io::Error::new(e.error().kind(), e.error().to_string()))
        })?;
        let file = buf
            .into_inner()
            .map_err(|e| CleanError::io(&staging, e.into_error()))?;
        file.sync_all().map_err(|e| CleanError::io(&staging, e))?;
        drop(file);
        fs::rename(&staging, output).map_err(|e| CleanError::io(output, e))?;

        info!(
            rows = stats.data_rows,
            padded = stats.padded_rows,
            truncated = stats.truncated_rows,
            malformed = stats.malformed_rows,
            elapsed = ?start.elapsed(),
            "finished clean"
        );
        if stats.reencoded_rows > 0 {
            warn!(
                reencoded = stats.reencoded_rows,
                "rows with invalid UTF-8 kept with U+FFFD replacements"
            );
        }
        if stats.skipped_invalid_id > 0 {
            warn!(
                skipped = stats.skipped_invalid_id,
                "skipped rows due to invalid ABN format"
            );
        }

        Ok(stats)
    }
}

/// Clean one file with the given options. See [`CsvNormalizer::run`].
pub fn clean_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &CleanOptions,
) -> Result<CleanStats, CleanError> {
    CsvNormalizer::new(options.clone()).run(input, output)
}

/// Pad with empty fields or truncate so exactly `width` fields are written.
fn write_normalized<W: Write>(
    wtr: &mut Writer<W>,
    record: &StringRecord,
    width: usize,
    stats: &mut CleanStats,
) -> csv::Result<()> {
    let len = record.len();
    if len < width {
        stats.padded_rows += 1;
    } else if len > width {
        stats.truncated_rows += 1;
    }
    let padding = std::iter::repeat("").take(width.saturating_sub(len));
    wtr.write_record(record.iter().take(width).chain(padding))
}

fn header_mismatches(header: &StringRecord, names: &[String]) -> Vec<String> {
    let got: Vec<&str> = header.iter().collect();
    compare_header(&got, names)
}
