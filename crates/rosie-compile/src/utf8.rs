//! Codepoint-interval to PEG lowering.
//!
//! Given `0 <= N <= M <= 0x10FFFF`, [`codepoint_range`] produces a PEG
//! expression matching exactly the well-formed UTF-8 encodings of the
//! codepoints in `[N,M]`. The interval is decomposed into a tree of byte
//! ranges: equal-length endpoints recurse byte-by-byte into a low fringe, a
//! full middle, and a high fringe; mixed-length endpoints become an ordered
//! choice over the per-length pieces. "All sequences of this length with
//! this first byte range" is kept symbolic during decomposition and expanded
//! in a second pass, which applies the restricted second-byte rows (`E0`,
//! `ED`, `F0`, `F4`); a third pass lowers the tree to PEG primitives.
//!
//! Endpoints are assumed valid and are not checked against the surrogate
//! block: callers passing an endpoint in `D800..DFFF` get an expression
//! built from that endpoint's raw encoding bits, which no well-formed input
//! can match. Intervals that merely span the block are safe; the expansion
//! tables keep `ED A0 80 .. ED BF BF` out of the output.

use smallvec::SmallVec;

use rosie_peg::{alt, byte_range, seq, Pexp};

use crate::error::CompileError;

/// Largest valid codepoint.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

/// First codepoint encoded with k bytes, as bytes, for k = 1..4.
const STARTS: [&[u8]; 4] = [
    &[0x00],
    &[0xC2, 0x80],
    &[0xE0, 0xA0, 0x80],
    &[0xF0, 0x90, 0x80, 0x80],
];

/// Last codepoint encoded with k bytes, as bytes, for k = 1..4.
const ENDS: [&[u8]; 4] = [
    &[0x7F],
    &[0xDF, 0xBF],
    &[0xEF, 0xBF, 0xBF],
    &[0xF4, 0x8F, 0xBF, 0xBF],
];

/// Encode a codepoint as UTF-8 by the arithmetic alone; no validity check.
pub fn utf8_encode(cp: u32) -> SmallVec<[u8; 4]> {
    let mut out = SmallVec::new();
    if cp < 0x80 {
        out.push(cp as u8);
    } else if cp < 0x800 {
        out.push(0xC0 | (cp >> 6) as u8);
        out.push(0x80 | (cp & 0x3F) as u8);
    } else if cp < 0x10000 {
        out.push(0xE0 | (cp >> 12) as u8);
        out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
        out.push(0x80 | (cp & 0x3F) as u8);
    } else {
        out.push(0xF0 | (cp >> 18) as u8);
        out.push(0x80 | ((cp >> 12) & 0x3F) as u8);
        out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
        out.push(0x80 | (cp & 0x3F) as u8);
    }
    out
}

/// Decomposition tree. `Full` is the deferred "all `len`-byte sequences
/// whose first byte is in `[lo,hi]`" node the second pass expands.
#[derive(Clone, PartialEq, Eq, Debug)]
enum Node {
    Range(u8, u8),
    Seq(Vec<Node>),
    Choice(Vec<Node>),
    Full { len: usize, lo: u8, hi: u8 },
}

fn choice(mut parts: Vec<Node>) -> Node {
    debug_assert!(!parts.is_empty());
    if parts.len() == 1 {
        parts.pop().unwrap()
    } else {
        Node::Choice(parts)
    }
}

/// Smallest second byte of a `len`-byte sequence starting with `first`.
/// Positions past the second are unrestricted continuations.
fn cont_lo(len: usize, j: usize, first: u8) -> u8 {
    if j == 1 {
        match (len, first) {
            (3, 0xE0) => 0xA0,
            (4, 0xF0) => 0x90,
            _ => 0x80,
        }
    } else {
        0x80
    }
}

/// Largest second byte of a `len`-byte sequence starting with `first`.
fn cont_hi(len: usize, j: usize, first: u8) -> u8 {
    if j == 1 {
        match (len, first) {
            (3, 0xED) => 0x9F,
            (4, 0xF4) => 0x8F,
            _ => 0xBF,
        }
    } else {
        0xBF
    }
}

/// Whether the second-byte row of `first` is restricted.
fn is_special(len: usize, first: u8) -> bool {
    cont_lo(len, 1, first) != 0x80 || cont_hi(len, 1, first) != 0xBF
}

/// `s[from..]` is the smallest tail its first byte admits.
fn is_min_tail(s: &[u8], from: usize) -> bool {
    (from..s.len()).all(|j| s[j] == cont_lo(s.len(), j, s[0]))
}

/// `e[from..]` is the largest tail its first byte admits.
fn is_max_tail(e: &[u8], from: usize) -> bool {
    (from..e.len()).all(|j| e[j] == cont_hi(e.len(), j, e[0]))
}

/// Unconstrained continuation positions `from..len`.
fn free_cont(len: usize, from: usize, first: u8) -> Vec<Node> {
    (from..len)
        .map(|j| Node::Range(cont_lo(len, j, first), cont_hi(len, j, first)))
        .collect()
}

/// Tails at positions `from..` that compare `>= s[from..]`.
fn ge_tail(s: &[u8], from: usize) -> Node {
    let (len, first) = (s.len(), s[0]);
    let last = len - 1;
    if from == last {
        return Node::Range(s[from], cont_hi(len, from, first));
    }
    if is_min_tail(s, from + 1) {
        // Everything from s[from] up is covered whole.
        let mut parts = vec![Node::Range(s[from], cont_hi(len, from, first))];
        parts.extend(free_cont(len, from + 1, first));
        return Node::Seq(parts);
    }
    let mut alts = vec![Node::Seq(vec![
        Node::Range(s[from], s[from]),
        ge_tail(s, from + 1),
    ])];
    if s[from] < cont_hi(len, from, first) {
        let mut parts = vec![Node::Range(s[from] + 1, cont_hi(len, from, first))];
        parts.extend(free_cont(len, from + 1, first));
        alts.push(Node::Seq(parts));
    }
    choice(alts)
}

/// Tails at positions `from..` that compare `<= e[from..]`.
fn le_tail(e: &[u8], from: usize) -> Node {
    let (len, first) = (e.len(), e[0]);
    let last = len - 1;
    if from == last {
        return Node::Range(cont_lo(len, from, first), e[from]);
    }
    if is_max_tail(e, from + 1) {
        let mut parts = vec![Node::Range(cont_lo(len, from, first), e[from])];
        parts.extend(free_cont(len, from + 1, first));
        return Node::Seq(parts);
    }
    let mut alts = Vec::new();
    if e[from] > cont_lo(len, from, first) {
        let mut parts = vec![Node::Range(cont_lo(len, from, first), e[from] - 1)];
        parts.extend(free_cont(len, from + 1, first));
        alts.push(Node::Seq(parts));
    }
    alts.push(Node::Seq(vec![
        Node::Range(e[from], e[from]),
        le_tail(e, from + 1),
    ]));
    choice(alts)
}

/// Equal-length case: all sequences between `s` and `e`, positions before
/// `i` already fixed and equal.
fn same_len(s: &[u8], e: &[u8], i: usize) -> Node {
    let len = s.len();
    let last = len - 1;
    if i == last {
        return Node::Range(s[i], e[i]);
    }
    if s[i] == e[i] {
        return Node::Seq(vec![Node::Range(s[i], s[i]), same_len(s, e, i + 1)]);
    }
    // Up to three parts: low fringe, full middle, high fringe. A fringe
    // that happens to span its whole first-byte block merges into the
    // middle.
    let mut parts = Vec::new();
    let mut mid_lo = s[i];
    let mut mid_hi = e[i];
    if !is_min_tail(s, i + 1) {
        parts.push(Node::Seq(vec![
            Node::Range(s[i], s[i]),
            ge_tail(s, i + 1),
        ]));
        mid_lo = s[i] + 1;
    }
    let high_fringe = !is_max_tail(e, i + 1);
    if high_fringe {
        mid_hi = e[i] - 1;
    }
    if mid_lo <= mid_hi {
        if i == 0 {
            parts.push(Node::Full {
                len,
                lo: mid_lo,
                hi: mid_hi,
            });
        } else {
            let mut mid = vec![Node::Range(mid_lo, mid_hi)];
            mid.extend(free_cont(len, i + 1, s[0]));
            parts.push(Node::Seq(mid));
        }
    }
    if high_fringe {
        parts.push(Node::Seq(vec![
            Node::Range(e[i], e[i]),
            le_tail(e, i + 1),
        ]));
    }
    choice(parts)
}

/// All `|s|`-byte sequences `>= s`.
fn ge_seq(s: &[u8]) -> Node {
    let len = s.len();
    let top = ENDS[len - 1][0];
    if len == 1 {
        return Node::Range(s[0], top);
    }
    if is_min_tail(s, 1) {
        return Node::Full {
            len,
            lo: s[0],
            hi: top,
        };
    }
    let mut parts = vec![Node::Seq(vec![Node::Range(s[0], s[0]), ge_tail(s, 1)])];
    if s[0] < top {
        parts.push(Node::Full {
            len,
            lo: s[0] + 1,
            hi: top,
        });
    }
    choice(parts)
}

/// All `|e|`-byte sequences `<= e`.
fn le_seq(e: &[u8]) -> Node {
    let len = e.len();
    let bottom = STARTS[len - 1][0];
    if len == 1 {
        return Node::Range(bottom, e[0]);
    }
    if is_max_tail(e, 1) {
        return Node::Full {
            len,
            lo: bottom,
            hi: e[0],
        };
    }
    let mut parts = Vec::new();
    if bottom < e[0] {
        parts.push(Node::Full {
            len,
            lo: bottom,
            hi: e[0] - 1,
        });
    }
    parts.push(Node::Seq(vec![Node::Range(e[0], e[0]), le_tail(e, 1)]));
    choice(parts)
}

/// Mixed-length case: the `|s|`-byte tail, the whole intermediate lengths,
/// and the `|e|`-byte head, in order.
fn multi_len(s: &[u8], e: &[u8]) -> Node {
    let mut parts = vec![ge_seq(s)];
    for k in s.len() + 1..e.len() {
        parts.push(Node::Full {
            len: k,
            lo: STARTS[k - 1][0],
            hi: ENDS[k - 1][0],
        });
    }
    parts.push(le_seq(e));
    choice(parts)
}

/// Second pass: expand deferred full-range nodes, honoring the restricted
/// second-byte rows at `E0`, `ED`, `F0`, and `F4`.
fn expand(node: Node) -> Node {
    match node {
        Node::Full { len, lo, hi } => expand_full(len, lo, hi),
        Node::Seq(parts) => Node::Seq(parts.into_iter().map(expand).collect()),
        Node::Choice(parts) => Node::Choice(parts.into_iter().map(expand).collect()),
        leaf => leaf,
    }
}

fn expand_full(len: usize, lo: u8, hi: u8) -> Node {
    if len == 1 {
        return Node::Range(lo, hi);
    }
    let mut parts = Vec::new();
    let mut b = lo;
    while b <= hi {
        if is_special(len, b) {
            let mut row = vec![
                Node::Range(b, b),
                Node::Range(cont_lo(len, 1, b), cont_hi(len, 1, b)),
            ];
            row.extend(free_cont(len, 2, b));
            parts.push(Node::Seq(row));
            b += 1;
        } else {
            let mut run_end = b;
            while run_end < hi && !is_special(len, run_end + 1) {
                run_end += 1;
            }
            let mut row = vec![Node::Range(b, run_end)];
            row.extend(free_cont(len, 1, b));
            parts.push(Node::Seq(row));
            b = run_end + 1;
        }
        if b == 0 {
            break; // u8 wrap; unreachable for hi <= 0xF4
        }
    }
    choice(parts)
}

/// Third pass: lower the tree to PEG primitives.
fn to_pexp(node: &Node) -> Pexp {
    match node {
        Node::Range(lo, hi) => byte_range(*lo, *hi),
        Node::Seq(parts) => {
            let mut pegs = parts.iter().map(to_pexp);
            let first = pegs.next().expect("sequence node is never empty");
            pegs.fold(first, seq)
        }
        Node::Choice(parts) => alt(parts.iter().map(to_pexp).collect()),
        Node::Full { .. } => unreachable!("full-range node survived expansion"),
    }
}

/// Compile the codepoint interval `[n,m]` to a PEG expression.
pub fn codepoint_range(n: u32, m: u32) -> Result<Pexp, CompileError> {
    if n > m {
        return Err(CompileError::Internal(format!(
            "codepoint range out of order: {:#x} > {:#x}",
            n, m
        )));
    }
    if m > MAX_CODEPOINT {
        return Err(CompileError::Internal(format!(
            "codepoint out of range: {:#x}",
            m
        )));
    }
    let s = utf8_encode(n);
    let e = utf8_encode(m);
    let tree = if s.len() == e.len() {
        same_len(&s, &e, 0)
    } else {
        multi_len(&s, &e)
    };
    Ok(to_pexp(&expand(tree)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosie_peg::match_bytes;

    fn accepts(p: &Pexp, bytes: &[u8]) -> bool {
        // Whole-input match: anything shorter is a truncation false positive.
        match_bytes(p, bytes, 0).map(|(end, _)| end) == Some(bytes.len())
    }

    fn accepts_cp(p: &Pexp, cp: u32) -> bool {
        accepts(p, &utf8_encode(cp))
    }

    #[test]
    fn encode_boundaries_match_tables() {
        for (k, (s, e)) in STARTS.iter().zip(ENDS.iter()).enumerate() {
            let lo = [0x00u32, 0x80, 0x800, 0x1_0000][k];
            let hi = [0x7Fu32, 0x7FF, 0xFFFF, 0x10_FFFF][k];
            assert_eq!(&utf8_encode(lo)[..], *s);
            assert_eq!(&utf8_encode(hi)[..], *e);
        }
    }

    #[test]
    fn ascii_range_is_one_byte_range() {
        let p = codepoint_range(0x41, 0x5A).unwrap();
        assert_eq!(p, byte_range(0x41, 0x5A));
    }

    #[test]
    fn single_codepoint_range() {
        let p = codepoint_range(0x4E00, 0x4E00).unwrap();
        assert!(accepts_cp(&p, 0x4E00));
        assert!(!accepts_cp(&p, 0x4E01));
        assert!(!accepts_cp(&p, 0x4DFF));
    }

    #[test]
    fn two_byte_interior_range() {
        let p = codepoint_range(0xE9, 0x151).unwrap();
        for cp in [0xE9, 0xFF, 0x100, 0x151] {
            assert!(accepts_cp(&p, cp), "expected {:#x} to match", cp);
        }
        for cp in [0xE8, 0x152, 0x41] {
            assert!(!accepts_cp(&p, cp), "expected {:#x} not to match", cp);
        }
    }

    #[test]
    fn range_crossing_length_boundary() {
        let p = codepoint_range(0x7E, 0x82).unwrap();
        for cp in 0x7E..=0x82 {
            assert!(accepts_cp(&p, cp), "expected {:#x} to match", cp);
        }
        assert!(!accepts_cp(&p, 0x7D));
        assert!(!accepts_cp(&p, 0x83));
        // The two-byte side must not leak into overlong territory.
        assert!(!accepts(&p, &[0xC0, 0x80]));
    }

    #[test]
    fn range_spanning_surrogate_block_skips_it() {
        let p = codepoint_range(0xD000, 0xE005).unwrap();
        assert!(accepts_cp(&p, 0xD000));
        assert!(accepts_cp(&p, 0xD7FF));
        assert!(accepts_cp(&p, 0xE000));
        assert!(accepts_cp(&p, 0xE005));
        // ED A0 80 is the raw arithmetic encoding of U+D800; the expansion
        // tables keep the surrogate rows out.
        assert!(!accepts(&p, &[0xED, 0xA0, 0x80]));
        assert!(!accepts(&p, &[0xED, 0xBF, 0xBF]));
    }

    #[test]
    fn full_range_is_the_wellformedness_pattern() {
        let p = codepoint_range(0, MAX_CODEPOINT).unwrap();
        for cp in [0u32, 0x41, 0x7F, 0x80, 0x7FF, 0x800, 0xD7FF, 0xE000, 0xFFFF, 0x1_0000, 0x10_FFFF]
        {
            assert!(accepts_cp(&p, cp), "expected {:#x} to match", cp);
        }
        for bad in [
            &[0xC0, 0x80][..],          // overlong
            &[0xC1, 0xBF][..],          // overlong
            &[0xE0, 0x80, 0x80][..],    // overlong
            &[0xED, 0xA0, 0x80][..],    // surrogate
            &[0xF0, 0x80, 0x80, 0x80][..], // overlong
            &[0xF5, 0x80, 0x80, 0x80][..], // beyond U+10FFFF
            &[0x80][..],                // bare continuation
            &[0xE0, 0xA0][..],          // truncated
        ] {
            assert!(!accepts(&p, bad), "expected {:02X?} not to match", bad);
        }
    }

    #[test]
    fn four_byte_edges() {
        let p = codepoint_range(0x1_0000, 0x10_FFFF).unwrap();
        assert!(accepts_cp(&p, 0x1_0000));
        assert!(accepts_cp(&p, 0x10_FFFF));
        assert!(!accepts_cp(&p, 0xFFFF));
        assert!(!accepts(&p, &[0xF4, 0x90, 0x80, 0x80])); // > U+10FFFF
    }

    #[test]
    fn out_of_order_interval_is_internal_error() {
        assert!(matches!(
            codepoint_range(0x100, 0x41),
            Err(CompileError::Internal(_))
        ));
        assert!(matches!(
            codepoint_range(0, 0x110000),
            Err(CompileError::Internal(_))
        ));
    }
}
