//! Named character classes and charset composition.
//!
//! The locale table is the byte-oriented POSIX class set in the C locale;
//! the surface language resolves `[:name:]` against it. Classes lower to
//! ordered choices of byte ranges.

use rosie_peg::{alt, any_byte, byte_range, negation, seq, Pexp};

/// Look up a named class from the locale table.
pub fn named_charset(name: &str) -> Option<Pexp> {
    let ranges: &[(u8, u8)] = match name {
        "alpha" => &[(b'A', b'Z'), (b'a', b'z')],
        "digit" => &[(b'0', b'9')],
        "alnum" => &[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')],
        "upper" => &[(b'A', b'Z')],
        "lower" => &[(b'a', b'z')],
        "xdigit" => &[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')],
        // HT LF VT FF CR and space
        "space" => &[(0x09, 0x0D), (0x20, 0x20)],
        "blank" => &[(0x09, 0x09), (0x20, 0x20)],
        "cntrl" => &[(0x00, 0x1F), (0x7F, 0x7F)],
        "punct" => &[(0x21, 0x2F), (0x3A, 0x40), (0x5B, 0x60), (0x7B, 0x7E)],
        "graph" => &[(0x21, 0x7E)],
        "print" => &[(0x20, 0x7E)],
        _ => return None,
    };
    Some(alt(ranges
        .iter()
        .map(|&(lo, hi)| byte_range(lo, hi))
        .collect()))
}

/// "Any byte minus `p`": succeeds on exactly one byte when `p` would not
/// match at the cursor.
pub fn complement(p: Pexp) -> Pexp {
    seq(negation(p), any_byte())
}
