use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as decimal},
    combinator::opt,
    sequence::preceded,
};
use std::fmt;

/// Line range of one side of a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u32,
    pub len: u32,
}

/// Parsed `@@ -start,len +start,len @@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old: HunkRange,
    pub new: HunkRange,
}

impl HunkHeader {
    pub fn new(old_start: u32, old_len: u32, new_start: u32, new_len: u32) -> Self {
        Self {
            old: HunkRange {
                start: old_start,
                len: old_len,
            },
            new: HunkRange {
                start: new_start,
                len: new_len,
            },
        }
    }

    /// Parse a hunk header line. Anything after the closing `@@` (the
    /// function context git appends) is ignored.
    pub fn parse(line: &[u8]) -> Option<Self> {
        header(line).ok().map(|(_, header)| header)
    }
}

/// `start` or `start,len`; a missing length means one line.
fn range(input: &[u8]) -> IResult<&[u8], HunkRange> {
    (decimal, opt(preceded(char(','), decimal)))
        .map(|(start, len)| HunkRange {
            start,
            len: len.unwrap_or(1),
        })
        .parse(input)
}

fn header(input: &[u8]) -> IResult<&[u8], HunkHeader> {
    (tag("@@ -"), range, tag(" +"), range, tag(" @@"))
        .map(|(_, old, _, new, _)| HunkHeader { old, new })
        .parse(input)
}

impl fmt::Display for HunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old.start, self.old.len, self.new.start, self.new.len
        )
    }
}
