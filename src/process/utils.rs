use csv::StringRecord;
use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use crate::error::CleanError;

/// Drop every whitespace character, including the ones inside the value.
pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A line holding nothing but whitespace parses as a single empty field.
pub fn is_blank_record(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).map_or(true, str::is_empty)
}

/// Open `path` for buffered reading, mapping a missing file to [`CleanError::InputNotFound`].
pub fn open_input(path: &Path) -> Result<BufReader<File>, CleanError> {
    if !path.is_file() {
        return Err(CleanError::InputNotFound(path.to_path_buf()));
    }
    match File::open(path) {
        Ok(f) => Ok(BufReader::new(f)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CleanError::InputNotFound(path.to_path_buf()))
        }
        Err(e) => Err(CleanError::io(path, e)),
    }
}

/// Sibling of `output` that receives rows until the run completes: `<name>.partial`.
pub fn staging_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output".into());
    name.push(".partial");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_inner_and_unicode_whitespace() {
        assert_eq!(strip_whitespace(" 11 000\t000 948 "), "11000000948");
        assert_eq!(strip_whitespace("51\u{a0}824\u{a0}753\u{a0}556"), "51824753556");
    }

    #[test]
    fn blank_record_detection() {
        assert!(is_blank_record(&StringRecord::from(vec![""])));
        assert!(!is_blank_record(&StringRecord::from(vec!["", ""])));
        assert!(!is_blank_record(&StringRecord::from(vec!["x"])));
    }

    #[test]
    fn staging_path_sits_next_to_output() {
        assert_eq!(
            staging_path(Path::new("/data/entities_cleaned.csv")),
            PathBuf::from("/data/entities_cleaned.csv.partial")
        );
    }

    #[test]
    fn open_input_reports_missing_file() {
        let err = open_input(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, CleanError::InputNotFound(_)));
    }
}
