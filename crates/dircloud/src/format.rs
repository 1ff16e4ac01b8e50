//! Text formatting helpers for sizes, HTML and links

/// Formats a byte count with one decimal and a binary unit. In non-disk
/// mode sizes are abstract counts and only get thousands separators.
pub fn human_readable(size: u64, non_disk: bool) -> String {
    if non_disk {
        return thousands_separator(size);
    }

    const JUMP: f64 = 1024.0;
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if size < 1024 {
        return format!("{} bytes", size);
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= JUMP && unit < UNITS.len() {
        value /= JUMP;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit - 1])
}

pub fn thousands_separator(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encodes only the characters that would change the meaning of
/// a path inside a URL. Everything else, including non-ASCII text, is
/// left readable.
pub fn url_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            '"' => out.push_str("%22"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encodes everything but unreserved characters and `/`, for
/// use in header values such as `Location`.
pub fn path_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Encodes a query-string value.
pub fn query_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_readable() {
        assert_eq!(human_readable(0, false), "0 bytes");
        assert_eq!(human_readable(1023, false), "1023 bytes");
        assert_eq!(human_readable(1024, false), "1.0 KB");
        assert_eq!(human_readable(1536, false), "1.5 KB");
        assert_eq!(human_readable(5 * 1024 * 1024, false), "5.0 MB");
        assert_eq!(human_readable(3 * 1024u64.pow(4), false), "3.0 TB");
        assert_eq!(human_readable(2048 * 1024u64.pow(4), false), "2048.0 TB");
    }

    #[test]
    fn test_human_readable_non_disk() {
        assert_eq!(human_readable(1234567, true), "1,234,567");
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(thousands_separator(0), "0");
        assert_eq!(thousands_separator(999), "999");
        assert_eq!(thousands_separator(1000), "1,000");
        assert_eq!(thousands_separator(12345678), "12,345,678");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_url_quote() {
        assert_eq!(url_quote("/what?/a&b/"), "/what%3F/a%26b/");
        assert_eq!(url_quote("/100%/#1"), "/100%25/%231");
        assert_eq!(url_quote("/música/"), "/música/");
    }

    #[test]
    fn test_path_quote() {
        assert_eq!(path_quote("/música/a b+c"), "/m%C3%BAsica/a%20b%2Bc");
    }

    #[test]
    fn test_query_quote() {
        assert_eq!(query_quote("a b&c"), "a+b%26c");
        assert_eq!(query_quote("/srv/du.txt"), "/srv/du.txt");
        assert_eq!(query_quote("é"), "%C3%A9");
    }
}
