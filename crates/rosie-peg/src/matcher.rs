//! Reference matcher.
//!
//! A straightforward recursive interpreter over [`Pexp`]: greedy
//! repetition, ordered choice, and no backtracking past a committed choice
//! branch. It exists so compiled patterns are executable without an
//! external engine; embedders with a production engine can ignore it.

use crate::analysis::fixed_length;
use crate::pexp::Pexp;

/// A capture record: a labeled byte span with sub-captures.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Match {
    pub label: String,
    /// Byte offset of the first matched byte.
    pub start: usize,
    /// Byte offset one past the last matched byte.
    pub end: usize,
    /// Constant text, for captures that carry data instead of a span.
    pub constant: Option<String>,
    pub subs: Vec<Match>,
}

impl Match {
    /// First direct sub-capture with the given label.
    pub fn sub(&self, label: &str) -> Option<&Match> {
        self.subs.iter().find(|m| m.label == label)
    }
}

/// Match `p` against `input`, anchored at `start`.
///
/// On success returns the end position and the captures produced, in the
/// order they completed.
pub fn match_bytes(p: &Pexp, input: &[u8], start: usize) -> Option<(usize, Vec<Match>)> {
    let mut caps = Vec::new();
    let mut grammars = Vec::new();
    let end = exec(p, input, start, &mut grammars, &mut caps)?;
    Some((end, caps))
}

type Rules = [(String, Pexp)];

fn exec<'a>(
    p: &'a Pexp,
    input: &[u8],
    pos: usize,
    grammars: &mut Vec<&'a Rules>,
    caps: &mut Vec<Match>,
) -> Option<usize> {
    match p {
        Pexp::Lit(bytes) => {
            if input[pos.min(input.len())..].starts_with(bytes) {
                Some(pos + bytes.len())
            } else {
                None
            }
        }
        Pexp::ByteRange(lo, hi) => match input.get(pos) {
            Some(b) if *lo <= *b && *b <= *hi => Some(pos + 1),
            _ => None,
        },
        Pexp::Seq(a, b) => {
            let mark = caps.len();
            let mid = exec(a, input, pos, grammars, caps);
            match mid.and_then(|mid| exec(b, input, mid, grammars, caps)) {
                Some(end) => Some(end),
                None => {
                    caps.truncate(mark);
                    None
                }
            }
        }
        Pexp::Alt(parts) => {
            let mark = caps.len();
            for part in parts {
                if let Some(end) = exec(part, input, pos, grammars, caps) {
                    return Some(end);
                }
                caps.truncate(mark);
            }
            None
        }
        Pexp::LookAhead(body) => {
            exec(body, input, pos, grammars, caps)?;
            Some(pos)
        }
        Pexp::LookBehind(body) => {
            // Body length is fixed; enforced at construction.
            let len = fixed_length(body)? as usize;
            if pos < len {
                return None;
            }
            match exec(body, input, pos - len, grammars, caps) {
                Some(end) if end == pos => Some(pos),
                _ => None,
            }
        }
        Pexp::Negation(body) => {
            let mark = caps.len();
            let matched = exec(body, input, pos, grammars, caps).is_some();
            caps.truncate(mark);
            if matched {
                None
            } else {
                Some(pos)
            }
        }
        Pexp::AtLeast(body, n) => {
            let mark = caps.len();
            let mut count: u32 = 0;
            let mut cur = pos;
            loop {
                let round = caps.len();
                match exec(body, input, cur, grammars, caps) {
                    Some(end) if end > cur => {
                        cur = end;
                        count += 1;
                    }
                    _ => {
                        caps.truncate(round);
                        break;
                    }
                }
            }
            if count >= *n {
                Some(cur)
            } else {
                caps.truncate(mark);
                None
            }
        }
        Pexp::AtMost(body, n) => {
            let mut cur = pos;
            for _ in 0..*n {
                let round = caps.len();
                match exec(body, input, cur, grammars, caps) {
                    Some(end) if end > cur => cur = end,
                    _ => {
                        caps.truncate(round);
                        break;
                    }
                }
            }
            Some(cur)
        }
        Pexp::Capture(label, body) => {
            let mut subs = Vec::new();
            let end = exec(body, input, pos, grammars, &mut subs)?;
            caps.push(Match {
                label: label.clone(),
                start: pos,
                end,
                constant: None,
                subs,
            });
            Some(end)
        }
        Pexp::ConstCapture(label, text) => {
            caps.push(Match {
                label: label.clone(),
                start: pos,
                end: pos,
                constant: Some(text.clone()),
                subs: Vec::new(),
            });
            Some(pos)
        }
        Pexp::Grammar { rules, start } => {
            let (_, body) = rules.iter().find(|(n, _)| n == start)?;
            grammars.push(rules);
            let result = exec(body, input, pos, grammars, caps);
            grammars.pop();
            result
        }
        Pexp::V(name) => {
            let rules = *grammars.last()?;
            let (_, body) = rules.iter().find(|(n, _)| n == name)?;
            exec(body, input, pos, grammars, caps)
        }
    }
}
