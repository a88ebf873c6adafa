// src/process/profile.rs
use csv::{ByteRecord, StringRecord};
use prettytable::{format, Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::CleanError;
use crate::process::{
    read_lossy, tolerant_reader,
    utils::{is_blank_record, open_input},
};

/// Longest digit string still treated as an integer column.
const MAX_INTEGER_LEN: usize = 19;

/// Inferred shape of a column, used to pick loader column types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    Integer { min: f64, max: f64 },
    Numeric { min: f64, max: f64 },
    Text { max_len: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub max_len: usize,
    pub missing: u64,
    pub kind: ColumnKind,
}

/// Schema report for one delimited file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub path: PathBuf,
    pub rows: u64,
    pub malformed_rows: u64,
    /// Rows read with invalid UTF-8 bytes replaced by U+FFFD.
    #[serde(default)]
    pub reencoded_rows: u64,
    pub columns: Vec<ColumnProfile>,
    /// First rows, keyed positionally by the header.
    pub samples: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct ColumnAcc {
    max_len: usize,
    missing: u64,
    min: Option<f64>,
    max: Option<f64>,
    has_decimal: bool,
    saw_text: bool,
}

impl ColumnAcc {
    fn observe(&mut self, value: Option<&str>) {
        let v = match value.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.missing += 1;
                return;
            }
        };
        self.max_len = self.max_len.max(v.chars().count());

        match v.parse::<f64>() {
            Ok(n) if n.is_finite() => {
                self.min = Some(self.min.map_or(n, |m| m.min(n)));
                self.max = Some(self.max.map_or(n, |m| m.max(n)));
                if v.contains('.') {
                    self.has_decimal = true;
                }
            }
            _ => self.saw_text = true,
        }
    }

    fn kind(&self) -> ColumnKind {
        match (self.saw_text, self.min, self.max) {
            (false, Some(min), Some(max)) if self.has_decimal => ColumnKind::Numeric { min, max },
            (false, Some(min), Some(max)) if self.max_len <= MAX_INTEGER_LEN => {
                ColumnKind::Integer { min, max }
            }
            _ => ColumnKind::Text {
                max_len: self.max_len,
            },
        }
    }
}

/// Stream `path` and report per-column length, missing counts and numeric ranges.
///
/// Values beyond the header width are ignored; absent values count as missing.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn profile_csv<P: AsRef<Path>>(path: P, sample_rows: usize) -> Result<Profile, CleanError> {
    let path = path.as_ref();
    let mut rdr = tolerant_reader(open_input(path)?);
    let mut raw = ByteRecord::new();
    let mut record = StringRecord::new();
    let mut header: Option<Vec<String>> = None;
    let mut accs: Vec<ColumnAcc> = Vec::new();
    let mut samples = Vec::with_capacity(sample_rows);
    let mut rows = 0u64;
    let mut malformed_rows = 0u64;
    let mut reencoded_rows = 0u64;

    loop {
        let lossy = match read_lossy(&mut rdr, &mut raw, &mut record) {
            Ok(Some(lossy)) => lossy,
            Ok(None) => break,
            // before the header every failure is fatal, so no data row becomes the header
            Err(e) if e.is_io_error() || header.is_none() => {
                return Err(CleanError::csv(path, e))
            }
            Err(e) => {
                debug!(error = %e, "skipping malformed record");
                malformed_rows += 1;
                continue;
            }
        };
        if is_blank_record(&record) {
            continue;
        }
        if lossy {
            reencoded_rows += 1;
        }

        if header.is_none() {
            let names: Vec<String> = record.iter().map(str::to_string).collect();
            accs = names.iter().map(|_| ColumnAcc::default()).collect();
            header = Some(names);
            continue;
        }

        rows += 1;
        if samples.len() < sample_rows {
            samples.push(record.iter().take(accs.len()).map(str::to_string).collect());
        }
        for (idx, acc) in accs.iter_mut().enumerate() {
            acc.observe(record.get(idx));
        }
    }

    let names = header.ok_or_else(|| CleanError::EmptyInput(path.to_path_buf()))?;
    info!(rows, columns = names.len(), "profiled");

    let columns = names
        .into_iter()
        .zip(accs.iter())
        .map(|(name, acc)| ColumnProfile {
            name,
            max_len: acc.max_len,
            missing: acc.missing,
            kind: acc.kind(),
        })
        .collect();

    Ok(Profile {
        path: path.to_path_buf(),
        rows,
        malformed_rows,
        reencoded_rows,
        columns,
        samples,
    })
}

/// Box-drawn summary table, one line per column.
pub fn render_profile(profile: &Profile) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.add_row(Row::new(vec![
        Cell::new("Column").style_spec("bFg"),
        Cell::new("Type").style_spec("bFg"),
        Cell::new("Max Len").style_spec("bFg"),
        Cell::new("Missing").style_spec("bFg"),
        Cell::new("Min").style_spec("bFg"),
        Cell::new("Max").style_spec("bFg"),
    ]));

    for col in &profile.columns {
        let (ty, min, max) = match &col.kind {
            ColumnKind::Integer { min, max } => ("Integer", min.to_string(), max.to_string()),
            ColumnKind::Numeric { min, max } => ("Numeric", min.to_string(), max.to_string()),
            ColumnKind::Text { max_len } => {
                let ty = if *max_len == 0 { "Empty" } else { "Text" };
                (ty, String::new(), String::new())
            }
        };
        table.add_row(Row::new(vec![
            Cell::new(&col.name),
            Cell::new(ty),
            Cell::new(&col.max_len.to_string()).style_spec("r"),
            Cell::new(&col.missing.to_string()).style_spec("r"),
            Cell::new(&min).style_spec("r"),
            Cell::new(&max).style_spec("r"),
        ]));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(content: &str) -> Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        Ok(tmp)
    }

    #[test]
    fn classifies_integer_numeric_and_text_columns() -> Result<()> {
        let tmp = fixture(
            "abn,legal_name,postcode,score\n\
             11000000948,ACME PTY LTD,2000,1.5\n\
             11000000949,,3000,-2\n\
             11000000950,BETA,,0.25\n",
        )?;

        let profile = profile_csv(tmp.path(), 2)?;

        assert_eq!(profile.rows, 3);
        assert_eq!(profile.samples.len(), 2);
        let by_name = |n: &str| profile.columns.iter().find(|c| c.name == n).unwrap();

        assert_eq!(
            by_name("abn").kind,
            ColumnKind::Integer {
                min: 11000000948.0,
                max: 11000000950.0
            }
        );
        assert_eq!(
            by_name("legal_name").kind,
            ColumnKind::Text { max_len: 12 }
        );
        assert_eq!(by_name("legal_name").missing, 1);
        assert_eq!(by_name("postcode").missing, 1);
        assert_eq!(
            by_name("score").kind,
            ColumnKind::Numeric { min: -2.0, max: 1.5 }
        );
        Ok(())
    }

    #[test]
    fn ragged_rows_count_absent_values_as_missing() -> Result<()> {
        let tmp = fixture("abn,name_type,name\n11000000948\n11000000949,BN,X,extra\n")?;

        let profile = profile_csv(tmp.path(), 5)?;

        assert_eq!(profile.columns.len(), 3);
        assert_eq!(profile.columns[1].missing, 1);
        assert_eq!(profile.columns[2].missing, 1);
        assert_eq!(profile.samples[1], vec!["11000000949", "BN", "X"]);
        Ok(())
    }

    #[test]
    fn long_digit_strings_are_text() -> Result<()> {
        let tmp = fixture("id\n12345678901234567890\n")?;
        let profile = profile_csv(tmp.path(), 0)?;
        assert_eq!(profile.columns[0].kind, ColumnKind::Text { max_len: 20 });
        Ok(())
    }

    #[test]
    fn empty_file_is_reported() -> Result<()> {
        let tmp = fixture("")?;
        let err = profile_csv(tmp.path(), 1).unwrap_err();
        assert!(matches!(err, CleanError::EmptyInput(_)));
        Ok(())
    }

    #[test]
    fn invalid_utf8_rows_are_profiled_not_dropped() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"abn,legal_name\n11000000948,CAF\xc9 PTY LTD\n11000000949,ACME\n")?;
        tmp.flush()?;

        let profile = profile_csv(tmp.path(), 2)?;

        assert_eq!(profile.rows, 2);
        assert_eq!(profile.malformed_rows, 0);
        assert_eq!(profile.reencoded_rows, 1);
        assert_eq!(profile.samples[0][1], "CAF\u{fffd} PTY LTD");
        assert_eq!(profile.columns[1].missing, 0);
        Ok(())
    }

    #[test]
    fn renders_one_line_per_column() -> Result<()> {
        let tmp = fixture("a,b\n1,x\n")?;
        let profile = profile_csv(tmp.path(), 1)?;
        let table = render_profile(&profile);
        assert_eq!(table.len(), 3);
        Ok(())
    }
}
