mod macros;

pub use macros::*;

/// Convert spaces to hyphens. Remove characters that aren't alphanumerics,
/// underscores, or hyphens. Convert to lowercase. Also strip leading and
/// trailing whitespace.
pub fn slugify(string: &str) -> String {
    let mut output = String::with_capacity(string.len());

    let mut need_dash = false;
    for ch in string.chars() {
        for b in deunicode::deunicode_char(ch).unwrap_or("-").bytes() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => {
                    if need_dash {
                        output.push('-');
                        need_dash = false;
                    }

                    output.push(b.to_ascii_lowercase() as char);
                }
                _ => {
                    // All sequences of characters that aren't alphanumeric or
                    // `_` collapse into one `-`.
                    need_dash = !output.is_empty();
                }
            }
        }
    }

    output
}

/// Strips a leading UTF-8 byte-order mark, if any.
///
/// ```
/// use cardpress::util::strip_bom;
///
/// assert_eq!(strip_bom("\u{feff}name,cost"), "name,cost");
/// assert_eq!(strip_bom("name,cost"), "name,cost");
/// ```
pub fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{feff}').unwrap_or(input)
}
