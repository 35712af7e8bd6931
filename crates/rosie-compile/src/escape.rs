//! Escape-sequence decoding.
//!
//! Literals, strings, and character sets share one decoder but differ in
//! which punctuation escapes they accept and in the message prefix a bad
//! escape is reported with. Decoding produces bytes, not text: `\xHH`
//! inserts a raw byte, and `\uHHHH` inserts the UTF-8 encoding of a BMP
//! codepoint. Codepoint escapes beyond the BMP are not implemented and
//! decode as errors.

use crate::error::CompileError;
use crate::utf8::utf8_encode;

/// Which construct the text came from; selects the extra escapes and the
/// diagnostic prefix.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EscapeContext {
    Literal,
    String,
    Charset,
}

impl EscapeContext {
    fn bad(self, seq: impl Into<String>) -> CompileError {
        let seq = seq.into();
        match self {
            EscapeContext::Literal => CompileError::BadLiteralEscape(seq),
            EscapeContext::String => CompileError::BadStringEscape(seq),
            EscapeContext::Charset => CompileError::BadCharsetEscape(seq),
        }
    }
}

/// Decode the escapes in `text` to bytes.
pub fn unescape(text: &str, ctx: EscapeContext) -> Result<Vec<u8>, CompileError> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let esc = chars.next().ok_or_else(|| ctx.bad(""))?;
        match esc {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            't' => out.push(0x09),
            'n' => out.push(0x0A),
            'v' => out.push(0x0B),
            'f' => out.push(0x0C),
            'r' => out.push(0x0D),
            '\\' => out.push(b'\\'),
            '"' => out.push(b'"'),
            '\'' => out.push(b'\''),
            '[' | ']' | '^' | '-' if ctx == EscapeContext::Charset => out.push(esc as u8),
            'x' => out.push(hex_escape(&mut chars, 2, ctx, 'x')? as u8),
            'u' => {
                let cp = hex_escape(&mut chars, 4, ctx, 'u')?;
                out.extend_from_slice(&utf8_encode(cp));
            }
            // \UHHHHHHHH would address codepoints beyond the BMP; not
            // implemented, reported as a bad escape.
            other => return Err(ctx.bad(other.to_string())),
        }
    }
    Ok(out)
}

fn hex_escape(
    chars: &mut std::str::Chars<'_>,
    digits: u32,
    ctx: EscapeContext,
    intro: char,
) -> Result<u32, CompileError> {
    let mut seq = intro.to_string();
    let mut value: u32 = 0;
    for _ in 0..digits {
        let c = chars.next().ok_or_else(|| ctx.bad(seq.clone()))?;
        seq.push(c);
        let d = c.to_digit(16).ok_or_else(|| ctx.bad(seq.clone()))?;
        value = value * 16 + d;
    }
    Ok(value)
}

/// One character-set element (a list member or a range endpoint).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CharsetItem {
    /// A single byte; ranges over these are byte ranges.
    Byte(u8),
    /// A codepoint above `0x7F`; ranges over these are codepoint ranges.
    Codepoint(u32),
}

/// Decode a charset element, which must denote exactly one byte or one
/// codepoint.
pub fn charset_item(text: &str) -> Result<Option<CharsetItem>, CompileError> {
    let bytes = unescape(text, EscapeContext::Charset)?;
    if bytes.len() == 1 {
        return Ok(Some(CharsetItem::Byte(bytes[0])));
    }
    match std::str::from_utf8(&bytes) {
        Ok(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Some(CharsetItem::Codepoint(c as u32))),
                _ => Ok(None),
            }
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(unescape("abc", EscapeContext::Literal).unwrap(), b"abc");
    }

    #[test]
    fn common_escapes_decode() {
        assert_eq!(
            unescape("a\\tb\\nc\\\\", EscapeContext::Literal).unwrap(),
            b"a\tb\nc\\"
        );
    }

    #[test]
    fn hex_escape_inserts_raw_byte() {
        assert_eq!(
            unescape("\\x00\\xff", EscapeContext::Literal).unwrap(),
            vec![0x00, 0xFF]
        );
    }

    #[test]
    fn unicode_escape_encodes_utf8() {
        assert_eq!(
            unescape("\\u00e9", EscapeContext::Literal).unwrap(),
            "é".as_bytes()
        );
        assert_eq!(
            unescape("\\u4e00", EscapeContext::String).unwrap(),
            "一".as_bytes()
        );
    }

    #[test]
    fn bad_escape_uses_context_prefix() {
        assert_eq!(
            unescape("\\q", EscapeContext::Literal),
            Err(CompileError::BadLiteralEscape("q".into()))
        );
        assert_eq!(
            unescape("\\q", EscapeContext::String),
            Err(CompileError::BadStringEscape("q".into()))
        );
        assert_eq!(
            unescape("\\q", EscapeContext::Charset),
            Err(CompileError::BadCharsetEscape("q".into()))
        );
    }

    #[test]
    fn beyond_bmp_escape_is_rejected() {
        assert!(matches!(
            unescape("\\U0001F600", EscapeContext::Literal),
            Err(CompileError::BadLiteralEscape(_))
        ));
    }

    #[test]
    fn charset_punctuation_escapes() {
        assert_eq!(unescape("\\]", EscapeContext::Charset).unwrap(), b"]");
        assert_eq!(unescape("\\-", EscapeContext::Charset).unwrap(), b"-");
        // Outside a charset these are not escapes.
        assert!(unescape("\\]", EscapeContext::Literal).is_err());
    }

    #[test]
    fn truncated_hex_escape_is_rejected() {
        assert!(matches!(
            unescape("\\x4", EscapeContext::Literal),
            Err(CompileError::BadLiteralEscape(_))
        ));
        assert!(matches!(
            unescape("\\u00", EscapeContext::Charset),
            Err(CompileError::BadCharsetEscape(_))
        ));
    }

    #[test]
    fn charset_items_classify_bytes_and_codepoints() {
        assert_eq!(charset_item("a").unwrap(), Some(CharsetItem::Byte(b'a')));
        assert_eq!(
            charset_item("\\x7f").unwrap(),
            Some(CharsetItem::Byte(0x7F))
        );
        assert_eq!(
            charset_item("\\u00e9").unwrap(),
            Some(CharsetItem::Codepoint(0xE9))
        );
        assert_eq!(
            charset_item("é").unwrap(),
            Some(CharsetItem::Codepoint(0xE9))
        );
        assert_eq!(charset_item("ab").unwrap(), None);
    }
}
