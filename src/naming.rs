//! Centralized filename parsing for the `NNNN Name` convention.
//!
//! Documents, dashboard assets and section folders all follow the same
//! naming pattern: an optional leading numeric word that controls ordering,
//! separated by whitespace from a human-readable name:
//!
//! - `0001 Quarterly Report` → ordered first, shown as "Quarterly Report"
//! - `20 Charts/` → section titled "Charts"
//! - `Annual Review` → unordered, shown as is
//!
//! The numeric word exists only to make the filesystem sort the way the
//! author wants. It is never shown to readers.

/// Result of parsing an entry name like `0007 Annual Review`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Numeric prefix if present and followed by text (e.g. `7`).
    pub number: Option<u64>,
    /// Display label: the name with the numeric word removed.
    pub label: String,
}

/// Parse an entry name following the `NNNN Name` convention.
///
/// - `"0007 Annual Review"` → number=Some(7), label="Annual Review"
/// - `"Annual Review"` → number=None, label="Annual Review"
/// - `"42"` → number=None, label="42" (nothing left after the number)
/// - `"  12   Spaced  "` → number=Some(12), label="Spaced"
pub fn parse_entry_name(name: &str) -> ParsedName {
    let trimmed = name.trim();
    if let Some((first, rest)) = trimmed.split_once(char::is_whitespace) {
        let rest = rest.trim();
        if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty() {
            return ParsedName {
                number: first.parse().ok(),
                label: rest.to_string(),
            };
        }
    }
    ParsedName {
        number: None,
        label: trimmed.to_string(),
    }
}

/// Strip a single leading numeric word from a name.
///
/// If the name has no numeric prefix, or nothing remains after removing it,
/// the (trimmed) original is returned.
pub fn strip_numeric_prefix(name: &str) -> String {
    parse_entry_name(name).label
}

/// Zero-pad a counter to `width` digits (`pad_int(7, 3)` → `"007"`).
pub fn pad_int(value: usize, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_multi_word_name() {
        let p = parse_entry_name("0007 Annual Review");
        assert_eq!(p.number, Some(7));
        assert_eq!(p.label, "Annual Review");
    }

    #[test]
    fn unnumbered_name_kept_whole() {
        let p = parse_entry_name("Annual Review");
        assert_eq!(p.number, None);
        assert_eq!(p.label, "Annual Review");
    }

    #[test]
    fn number_only_keeps_original() {
        let p = parse_entry_name("42");
        assert_eq!(p.number, None);
        assert_eq!(p.label, "42");
    }

    #[test]
    fn number_with_trailing_space_keeps_original() {
        assert_eq!(strip_numeric_prefix("42 "), "42");
    }

    #[test]
    fn only_first_numeric_word_is_stripped() {
        assert_eq!(strip_numeric_prefix("10 20 Questions"), "20 Questions");
    }

    #[test]
    fn extra_whitespace_collapsed_at_edges() {
        let p = parse_entry_name("  12   Spaced  ");
        assert_eq!(p.number, Some(12));
        assert_eq!(p.label, "Spaced");
    }

    #[test]
    fn mixed_alphanumeric_prefix_not_stripped() {
        assert_eq!(strip_numeric_prefix("2b Or Not"), "2b Or Not");
    }

    #[test]
    fn dash_prefix_is_not_a_numeric_word() {
        assert_eq!(strip_numeric_prefix("010-Landscapes"), "010-Landscapes");
    }

    #[test]
    fn quarterly_report_example() {
        assert_eq!(
            strip_numeric_prefix("0001 Quarterly Report"),
            "Quarterly Report"
        );
    }

    #[test]
    fn pad_int_widths() {
        assert_eq!(pad_int(7, 3), "007");
        assert_eq!(pad_int(123, 3), "123");
        assert_eq!(pad_int(1234, 3), "1234");
    }
}
