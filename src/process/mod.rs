// src/process/mod.rs
use csv::{ByteRecord, Reader, ReaderBuilder, StringRecord, Trim};
use std::{borrow::Cow, io::Read};

pub mod clean;
pub mod identifier;
pub mod profile;
pub mod utils;

pub use clean::{clean_csv, CleanOptions, CleanStats, CsvNormalizer, DEFAULT_PROGRESS_INTERVAL};
pub use identifier::{is_abn, AbnRule};
pub use profile::{profile_csv, render_profile, ColumnKind, ColumnProfile, Profile};

/// Reader settings shared by the cleaner and the profiler.
///
/// - no header handling: the first record is read like any other
/// - flexible: rows may disagree on field count
/// - every field trimmed
///
/// Quotes are only special at the start of a field, so stray quotes inside a
/// value are kept literally. Empty lines never produce a record.
pub fn tolerant_reader<R: Read>(rdr: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // keep this so records with different field-counts work
        .trim(Trim::All)
        .from_reader(rdr)
}

/// Read the next record, decoding each field as UTF-8 with invalid bytes replaced by U+FFFD.
///
/// Returns `None` at end of input, otherwise whether any field needed replacement.
/// `raw` is scratch space reused between calls.
pub fn read_lossy<R: Read>(
    rdr: &mut Reader<R>,
    raw: &mut ByteRecord,
    record: &mut StringRecord,
) -> csv::Result<Option<bool>> {
    if !rdr.read_byte_record(raw)? {
        return Ok(None);
    }
    let mut lossy = false;
    record.clear();
    for field in raw.iter() {
        let text = String::from_utf8_lossy(field);
        lossy |= matches!(text, Cow::Owned(_));
        record.push_field(&text);
    }
    record.trim();
    Ok(Some(lossy))
}
