// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// SQL column type used by the loader-facing DDL.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Text,
    Varchar(u32),
}

/// A single column definition of a loaded table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn new(name: &str, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            sql_type,
            nullable,
        }
    }
}

/// Positional description of a cleaned CSV file and the relational table it loads into.
///
/// Column order is the CSV field order; the cleaner only relies on the count,
/// the loader relies on names and types.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnSpec>,
    /// Index of the column carrying the ABN, if any.
    pub identifier_column: Option<usize>,
}

impl TableSchema {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Compare a parsed header against the descriptor. See [`compare_header`].
    pub fn header_mismatches<S: AsRef<str>>(&self, header: &[S]) -> Vec<String> {
        compare_header(header, &self.column_names())
    }
}

/// Compare header names against expected names, case-insensitively and ignoring
/// surrounding whitespace.
///
/// Returns one human-readable line per disagreeing position. Advisory only:
/// the cleaner never rejects a file for a naming mismatch.
pub fn compare_header<S: AsRef<str>, N: AsRef<str>>(header: &[S], expected: &[N]) -> Vec<String> {
    let mut out = Vec::new();
    for idx in 0..header.len().max(expected.len()) {
        let got = header.get(idx).map(|s| s.as_ref().trim());
        let want = expected.get(idx).map(|n| n.as_ref());
        match (got, want) {
            (Some(g), Some(w)) if g.eq_ignore_ascii_case(w) => {}
            (Some(g), Some(w)) => {
                out.push(format!("column {}: header `{}`, expected `{}`", idx, g, w))
            }
            (Some(g), None) => out.push(format!("column {}: unexpected header `{}`", idx, g)),
            (None, Some(w)) => out.push(format!("column {}: missing `{}`", idx, w)),
            (None, None) => {}
        }
    }
    out
}
