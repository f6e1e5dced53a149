//! C-string quoting as used by MI in both directions.

/// Quote `text` as an MI c-string, including the surrounding double quotes.
///
/// Backslashes, double quotes and the common control characters are escaped
/// so that the result can be embedded in a single command line.
///
/// ```rust
/// use gdbmi_protocol::quote;
///
/// assert_eq!(quote("say \"hi\"\n"), r#""say \"hi\"\n""#);
/// ```
#[must_use]
pub fn quote(text: &str) -> String
{
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Undo c-string escaping of `raw` (the text between the quotes).
///
/// Invalid UTF-8 produced by octal escapes is replaced lossily.
#[must_use]
pub fn unescape(raw: &str) -> String
{
    String::from_utf8_lossy(&unescape_bytes(raw)).into_owned()
}

/// Byte-level unescape. gdb writes non-ASCII output as octal escapes of the
/// individual UTF-8 bytes, so decoding has to happen on bytes first.
pub(crate) fn unescape_bytes(raw: &str) -> Vec<u8>
{
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        if b != b'\\' || i >= bytes.len() {
            out.push(b);
            continue;
        }
        let escaped = bytes[i];
        i += 1;
        match escaped {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'e' => out.push(0x1b),
            b'0'..=b'7' => {
                let mut value = u32::from(escaped - b'0');
                let mut digits = 1;
                while digits < 3 && i < bytes.len() && (b'0'..=b'7').contains(&bytes[i]) {
                    value = value * 8 + u32::from(bytes[i] - b'0');
                    i += 1;
                    digits += 1;
                }
                out.push(u8::try_from(value & 0xff).unwrap_or(b'?'));
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_quote_escapes()
    {
        assert_eq!(quote(r"C:\dir"), r#""C:\\dir""#);
        assert_eq!(quote("a\tb"), r#""a\tb""#);
        assert_eq!(quote(""), r#""""#);
    }

    #[test]
    fn test_unescape_reverses_quote()
    {
        let original = "line one\n\"two\"\t\\three\r";
        let quoted = quote(original);
        assert_eq!(unescape(&quoted[1..quoted.len() - 1]), original);
    }

    #[test]
    fn test_unescape_trailing_backslash_is_literal()
    {
        assert_eq!(unescape("abc\\"), "abc\\");
    }

    #[test]
    fn test_unescape_octal()
    {
        assert_eq!(unescape(r"\101\102"), "AB");
        assert_eq!(unescape(r"\0"), "\0");
    }
}
