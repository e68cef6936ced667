use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as line_number},
    combinator::{map, opt},
    sequence::preceded,
};

use crate::patch::SelectionRange;

/// Line coordinates from a `@@ -old[,n] +new[,n] @@` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

impl HunkHeader {
    /// Parse a hunk header line. Anything after the closing `@@` (the
    /// section heading git appends) is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        hunk_header(line).ok().map(|(_, header)| header)
    }
}

/// `<start>[,<count>]`, with the count defaulting to 1 when omitted
fn range(input: &str) -> IResult<&str, (u32, u32)> {
    map(
        (line_number, opt(preceded(char(','), line_number))),
        |(start, count)| (start, count.unwrap_or(1)),
    )
    .parse(input)
}

fn hunk_header(input: &str) -> IResult<&str, HunkHeader> {
    map(
        (tag("@@ -"), range, tag(" +"), range, tag(" @@")),
        |(_, (old_start, old_count), _, (new_start, new_count), _)| HunkHeader {
            old_start,
            old_count,
            new_start,
            new_count,
        },
    )
    .parse(input)
}

/// One `@@ ... @@` block of a single-file unified diff.
///
/// `text` is the exact slice of the source diff covering the header line and
/// every body line up to the next header (or the end of the diff), line
/// terminators included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub text: String,
}

impl DiffHunk {
    pub(crate) fn new(header: HunkHeader, text: String) -> Self {
        Self {
            old_start: header.old_start,
            old_count: header.old_count,
            new_start: header.new_start,
            new_count: header.new_count,
            text,
        }
    }

    /// Last new-side line covered by this hunk.
    ///
    /// A pure deletion (`new_count == 0`) ends one line before it starts, so
    /// this can be negative for a deletion at the top of a file.
    pub fn new_end(&self) -> i64 {
        i64::from(self.new_start) + i64::from(self.new_count) - 1
    }

    /// Whether this hunk touches a zero-based selection.
    ///
    /// Both selection bounds are shifted by one into the diff's one-based
    /// numbering. A selection reaching the first or last line of a hunk takes
    /// the whole hunk.
    pub fn overlaps(&self, selection: &SelectionRange) -> bool {
        i64::from(self.new_start) <= i64::from(selection.end) + 1
            && self.new_end() >= i64::from(selection.start) + 1
    }
}
