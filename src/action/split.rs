//! Splitting captured output into items.

use tokio_util::bytes::Bytes;

/// Record terminator trimmed from whole-output items.
const RECORD_TERMINATOR: u8 = b'\n';

/// Split captured output into an ordered list of items.
///
/// The separator is matched literally. An empty separator makes the whole
/// output a single item, minus one trailing newline. A separator at the very
/// end of the output does not produce a trailing empty item, and empty
/// output produces no items at all.
pub fn split(output: &[u8], separator: &str) -> Vec<Bytes> {
    if output.is_empty() {
        return Vec::new();
    }

    let separator = separator.as_bytes();
    if separator.is_empty() {
        let item = output
            .strip_suffix(&[RECORD_TERMINATOR])
            .unwrap_or(output);
        if item.is_empty() {
            return Vec::new();
        }
        return vec![Bytes::copy_from_slice(item)];
    }

    let mut items = Vec::new();
    let mut rest = output;
    while let Some(pos) = find(rest, separator) {
        items.push(Bytes::copy_from_slice(&rest[..pos]));
        rest = &rest[pos + separator.len()..];
    }
    if !rest.is_empty() {
        items.push(Bytes::copy_from_slice(rest));
    }
    items
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[Bytes]) -> Vec<&str> {
        items
            .iter()
            .map(|item| std::str::from_utf8(item).unwrap())
            .collect()
    }

    #[test]
    fn test_split_on_separator() {
        assert_eq!(strings(&split(b"a|b|c", "|")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_trailing_separator_does_not_add_empty_item() {
        assert_eq!(strings(&split(b"a|b|", "|")), vec!["a", "b"]);
        assert_eq!(strings(&split(b"line1\nline2\n", "\n")), vec!["line1", "line2"]);
    }

    #[test]
    fn test_empty_output_has_no_items() {
        assert!(split(b"", "|").is_empty());
        assert!(split(b"", "").is_empty());
    }

    #[test]
    fn test_inner_empty_items_are_kept() {
        assert_eq!(strings(&split(b"a||b", "|")), vec!["a", "", "b"]);
        assert_eq!(strings(&split(b"|a", "|")), vec!["", "a"]);
    }

    #[test]
    fn test_multi_byte_separator_is_literal() {
        assert_eq!(strings(&split(b"one.*two.*three", ".*")), vec!["one", "two", "three"]);
        assert_eq!(strings(&split(b"a--b-c", "--")), vec!["a", "b-c"]);
    }

    #[test]
    fn test_empty_separator_yields_whole_output() {
        assert_eq!(strings(&split(b"line1\nline2\n", "")), vec!["line1\nline2"]);
        assert_eq!(strings(&split(b"no newline", "")), vec!["no newline"]);
        // Only a single terminator is trimmed.
        assert_eq!(strings(&split(b"text\n\n", "")), vec!["text\n"]);
    }

    #[test]
    fn test_output_without_separator_is_one_item() {
        assert_eq!(strings(&split(b"single", ",")), vec!["single"]);
    }

    #[test]
    fn test_separator_only_output() {
        assert_eq!(strings(&split(b"|", "|")), vec![""]);
        assert!(split(b"\n", "").is_empty());
    }
}
