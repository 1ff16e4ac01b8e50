//! Ordering of child names and path listings

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Plain byte-wise ordering
    Lexicographic,
    /// Numeric runs compare by value, like `ls -v`
    #[default]
    Version,
}

impl SortPolicy {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            SortPolicy::Lexicographic => a.cmp(b),
            SortPolicy::Version => version_cmp(a, b),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SortPolicy::Lexicographic => "Lexicographic",
            SortPolicy::Version => "Natural (version numbers)",
        }
    }
}

/// Compares two strings chunk by chunk, alternating text and digit runs.
///
/// Digit runs compare by numeric value (without overflowing on long
/// runs), text runs byte-wise. Strings that only differ in leading zeros
/// fall back to plain ordering so the result stays a total order.
pub fn version_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x, y) {
                    (Chunk::Number(x), Chunk::Number(y)) => numeric_cmp(x, y),
                    (x, y) => x.text().cmp(y.text()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn numeric_cmp(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Text(&'a str),
    Number(&'a str),
}

impl<'a> Chunk<'a> {
    fn text(self) -> &'a str {
        match self {
            Chunk::Text(s) | Chunk::Number(s) => s,
        }
    }
}

/// Splits a string into text and digit runs. The first chunk is always
/// text (possibly empty), so chunks at the same position share a kind.
struct Chunks<'a> {
    rest: &'a str,
    want_digits: bool,
    done: bool,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            rest: s,
            want_digits: false,
            done: false,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        if self.done {
            return None;
        }
        let want_digits = self.want_digits;
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != want_digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        self.want_digits = !want_digits;
        if rest.is_empty() {
            self.done = true;
        }
        Some(if want_digits {
            Chunk::Number(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(policy: SortPolicy, names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort_by(|a, b| policy.compare(a, b));
        names
    }

    #[test]
    fn test_version_orders_numbers_by_value() {
        assert_eq!(
            sorted(SortPolicy::Version, &["a10/", "a9/", "a100/", "a1/"]),
            vec!["a1/", "a9/", "a10/", "a100/"]
        );
    }

    #[test]
    fn test_lexicographic_orders_bytes() {
        assert_eq!(
            sorted(SortPolicy::Lexicographic, &["a10/", "a9/", "a100/", "a1/"]),
            vec!["a1/", "a10/", "a100/", "a9/"]
        );
    }

    #[test]
    fn test_version_mixed_text_and_numbers() {
        assert_eq!(
            sorted(
                SortPolicy::Version,
                &["linux-5.15.0/", "linux-5.4.0/", "linux-5.15.0-rc1/", "README"]
            ),
            vec!["README", "linux-5.4.0/", "linux-5.15.0-rc1/", "linux-5.15.0/"]
        );
    }

    #[test]
    fn test_version_leading_zeros_is_total() {
        assert_eq!(version_cmp("file007", "file7"), "file007".cmp("file7"));
        assert_ne!(version_cmp("file007", "file7"), Ordering::Equal);
        assert_eq!(version_cmp("x", "x"), Ordering::Equal);
    }

    #[test]
    fn test_version_huge_numbers_do_not_overflow() {
        let big = "n99999999999999999999999999999";
        let bigger = "n100000000000000000000000000000";
        assert_eq!(version_cmp(big, bigger), Ordering::Less);
    }

    #[test]
    fn test_numeric_names_before_text() {
        // Text chunk "" sorts before any non-empty text.
        assert_eq!(version_cmp("2020/", "abc/"), Ordering::Less);
        assert_eq!(version_cmp("9/", "10/"), Ordering::Less);
    }

    #[test]
    fn test_default_is_version() {
        assert_eq!(SortPolicy::default(), SortPolicy::Version);
    }
}
