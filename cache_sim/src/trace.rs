use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{char, u32 as unsigned},
    combinator::{all_consuming, map_res, value, verify},
    error::ErrorKind,
    sequence::tuple,
    IResult,
};
use serde::Serialize;
use thiserror::Error;

use crate::common::{Addr, Operation};

/// one memory reference of the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub op: Operation,
    /// size of the reference in bytes. recorded, not simulated.
    pub size: u32,
    pub addr: Addr,
}

impl TraceEntry {
    pub fn new(op: Operation, size: u32, addr: u32) -> Self {
        Self {
            op,
            size,
            addr: Addr::new(addr),
        }
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Operation::Read => 'R',
            Operation::Write => 'W',
        };
        write!(f, "{op}:{}:{}", self.size, self.addr)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("line {line}: {reason}: `{content}`")]
pub struct TraceParseError {
    /// one-based
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// ordered sequence of references, in file order
#[derive(Debug, Default, Clone)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// `<R|W>:<size>:<hex address>` per line. Blank lines and lines
    /// starting with `#` are skipped.
    pub fn parse(src: &str) -> Result<Self, TraceParseError> {
        let mut entries = Vec::new();
        for (i, raw) in src.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (_, entry) = all_consuming(read_entry)(line).map_err(|e| TraceParseError {
                line: i + 1,
                content: line.to_string(),
                reason: describe_nom_error(e),
            })?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<TraceEntry>> for Trace {
    fn from(entries: Vec<TraceEntry>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceEntry;

    type IntoIter = std::slice::Iter<'a, TraceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn read_op(input: &str) -> IResult<&str, Operation> {
    alt((
        value(Operation::Read, char('R')),
        value(Operation::Write, char('W')),
    ))(input)
}

fn read_size(input: &str) -> IResult<&str, u32> {
    verify(unsigned, |size: &u32| *size > 0)(input)
}

fn read_addr(input: &str) -> IResult<&str, Addr> {
    map_res(take_while_m_n(1, 8, |c: char| c.is_ascii_hexdigit()), |s: &str| {
        u32::from_str_radix(s, 16).map(Addr::new)
    })(input)
}

fn read_entry(input: &str) -> IResult<&str, TraceEntry> {
    let (input, (op, _, size, _, addr)) =
        tuple((read_op, char(':'), read_size, char(':'), read_addr))(input)?;
    Ok((input, TraceEntry { op, size, addr }))
}

pub(crate) fn describe_nom_error(e: nom::Err<nom::error::Error<&str>>) -> String {
    match e {
        nom::Err::Incomplete(_) => "unexpected end of input".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let what = match e.code {
                ErrorKind::Char => "expected `R`, `W` or `:`",
                ErrorKind::Digit => "expected an unsigned integer",
                ErrorKind::Verify => "reference size must be positive",
                ErrorKind::TakeWhileMN | ErrorKind::MapRes => {
                    "address must be 1 to 8 hex digits"
                }
                ErrorKind::MultiSpace => "expected whitespace",
                ErrorKind::Eof => "unexpected trailing characters",
                _ => "unexpected input",
            };
            match e.input.split_whitespace().next() {
                Some(near) => format!("{what} near `{near}`"),
                None => format!("{what} at end of input"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(src: &str) -> TraceParseError {
        Trace::parse(src).unwrap_err()
    }

    #[test]
    fn test_trace_parse() {
        let t = Trace::parse("R:4:00000000\nW:8:1f\n\n# comment\n  r:4:0\n");
        assert_eq!(t.unwrap_err().line, 5);
        let t = Trace::parse("R:4:00000000\nW:8:1f\n\n# comment\n  R:2:DeadBeef  \n").unwrap();
        assert_eq!(
            t.entries(),
            &[
                TraceEntry::new(Operation::Read, 4, 0),
                TraceEntry::new(Operation::Write, 8, 0x1f),
                TraceEntry::new(Operation::Read, 2, 0xDEAD_BEEF),
            ]
        );
    }
    #[test]
    fn test_short_address_is_zero_extended() {
        let t = Trace::parse("R:4:10").unwrap();
        assert_eq!(t.entries()[0].addr.to_string(), "00000010");
        assert_eq!(t.entries()[0].to_string(), "R:4:00000010");
    }
    #[test]
    fn test_trace_parse_errors() {
        let e = parse_err("R:4:0\nX:4:0\n");
        assert_eq!(e.line, 2);
        assert_eq!(e.content, "X:4:0");
        assert!(e.reason.starts_with("expected `R`, `W` or `:`"), "{e}");

        let e = parse_err("R:0:00000000");
        assert!(e.reason.starts_with("reference size must be positive"), "{e}");

        let e = parse_err("R:four:0");
        assert!(e.reason.starts_with("expected an unsigned integer"), "{e}");

        let e = parse_err("R:4:123456789");
        assert!(e.reason.starts_with("unexpected trailing characters"), "{e}");

        let e = parse_err("W:4:xyz");
        assert!(e.reason.starts_with("address must be 1 to 8 hex digits"), "{e}");

        let e = parse_err("R:4");
        assert_eq!(e.reason, "expected `R`, `W` or `:` at end of input");
    }
    #[test]
    fn test_error_message_has_line_context() {
        let e = parse_err("\n\nR;4;0\n");
        assert_eq!(
            e.to_string(),
            "line 3: expected `R`, `W` or `:` near `;4;0`: `R;4;0`"
        );
    }
    #[test]
    fn test_empty_trace() {
        let t = Trace::parse("\n# nothing\n").unwrap();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
    }
}
