const ESCAPE: u8 = b'\\';

/// Splits `input` on every occurrence of `separator` not preceded by a backslash.
///
/// Every segment is unescaped (`\<sep>` becomes `<sep>`, then `\\` becomes `\`).
/// The result always holds at least one segment; leading, trailing or
/// adjacent separators produce empty segments.
pub fn split_escaped(input: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![unescape(input, separator)];
    }

    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut segment_start = 0;

    for (pos, _) in input.match_indices(separator) {
        if pos == 0 || bytes[pos - 1] != ESCAPE {
            segments.push(unescape(&input[segment_start..pos], separator));
            segment_start = pos + separator.len();
        }
    }

    segments.push(unescape(&input[segment_start..], separator));
    segments
}

fn unescape(segment: &str, separator: &str) -> String {
    segment
        .replace(&format!("\\{}", separator), separator)
        .replace("\\\\", "\\")
}

/// Replaces typographic quotes with plain ones.
pub fn sanitize(input: &str) -> String {
    input
        .replace(['“', '”'], "\"")
        .replace(['‘', '’'], "'")
}
