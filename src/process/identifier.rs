use csv::StringRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::process::utils::strip_whitespace;

/// Exactly 11 ASCII digits. `\d` would also admit non-ASCII digits.
static ABN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{11}$").expect("static ABN pattern"));

/// Row filter applied to files whose rows are keyed by an ABN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbnRule {
    /// Field holding the ABN candidate.
    pub column: usize,
}

impl Default for AbnRule {
    fn default() -> Self {
        Self { column: 0 }
    }
}

impl AbnRule {
    pub fn new(column: usize) -> Self {
        Self { column }
    }

    /// True when the candidate field exists and, with all whitespace removed, is 11 digits.
    pub fn accepts(&self, record: &StringRecord) -> bool {
        record.get(self.column).map_or(false, is_abn)
    }
}

/// `"11 000 000 948"` is an ABN; `"123"` and `"1100000094A"` are not.
pub fn is_abn(candidate: &str) -> bool {
    ABN_RE.is_match(&strip_whitespace(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_spaced_and_plain_abns() {
        assert!(is_abn("11000000948"));
        assert!(is_abn("11 000 000 948"));
        assert!(is_abn(" 51 824 753 556 "));
    }

    #[test]
    fn rejects_wrong_length_or_non_digits() {
        assert!(!is_abn(""));
        assert!(!is_abn("123"));
        assert!(!is_abn("110000009481"));
        assert!(!is_abn("1100000094A"));
        // Arabic-Indic digits are not ABN digits.
        assert!(!is_abn("١١٠٠٠٠٠٠٩٤٨"));
    }

    #[test]
    fn rule_reads_configured_column() {
        let rec = StringRecord::from(vec!["x", "11 000 000 948"]);
        assert!(!AbnRule::default().accepts(&rec));
        assert!(AbnRule::new(1).accepts(&rec));
        assert!(!AbnRule::new(5).accepts(&rec));
    }
}
