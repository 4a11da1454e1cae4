//! Partial patches built from a selected range of diff line records.
//!
//! The selection is cut into hunks at every hunk header, widened with context
//! lines on both outer ends, and every hunk gets a freshly computed header.
//! Lines outside the selection only survive as context when they exist in the
//! version the patch is applied against: the index for [`PatchPurpose::Stage`],
//! the index or working tree (in reverse) for the other purposes.
//!
//! ```
//! use git_weave::diff::parse_records;
//! use git_weave::patch::{PatchPurpose, make_patch};
//!
//! let records = parse_records(b"@@ -1,2 +1,3 @@\n keep\n+first\n+second\n keep too\n").unwrap();
//!
//! // Stage only "+second": "+first" is left out of the patch entirely.
//! let patch = make_patch("f", "f", &records, 3..4, PatchPurpose::Stage, 3)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(
//!     String::from_utf8(patch).unwrap(),
//!     "--- a/f\n+++ b/f\n@@ -1,2 +1,3 @@\n keep\n+second\n keep too\n"
//! );
//! ```

use crate::diff::{HunkHeader, LineRecord};
use crate::parse::ParseError;
use error_set::error_set;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Context lines pulled around a selection unless configured otherwise.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

const NO_NEWLINE: &[u8] = b"\\ No newline at end of file";

error_set! {
    /// Errors from building a patch out of line records
    PatchError := {
        /// A record doesn't start with one of ' ', '+', '-' or '@'
        #[display("Unrecognized diff marker '{marker}' in line record {index}")]
        UnknownMarker { index: usize, marker: char },
        /// A record has no text at all, not even a marker
        #[display("Line record {index} is empty")]
        EmptyLine { index: usize },
        #[display("Selection {start}..{end} is outside the {len} available line records")]
        RangeOutOfBounds { start: usize, end: usize, len: usize },
    }
}

/// What the patch will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchPurpose {
    /// Apply the selected working tree changes to the index.
    Stage,
    /// Take the selected changes back out of the index.
    Unstage,
    /// Revert the selected changes in the working tree.
    Discard,
}

impl PatchPurpose {
    /// Marker of unselected lines that exist in the version being patched
    /// and therefore become context.
    fn context_marker(self) -> u8 {
        match self {
            PatchPurpose::Stage => b'-',
            PatchPurpose::Unstage | PatchPurpose::Discard => b'+',
        }
    }

    /// Side of the diff that exists in the version being patched.
    fn reference_side(self) -> Side {
        match self {
            PatchPurpose::Stage => Side::Old,
            PatchPurpose::Unstage | PatchPurpose::Discard => Side::New,
        }
    }

    /// Whether `git apply` must run with `--reverse`.
    pub fn reverse(self) -> bool {
        !matches!(self, PatchPurpose::Stage)
    }

    /// Whether `git apply` targets the index (`--cached`) rather than the
    /// working tree.
    pub fn cached(self) -> bool {
        !matches!(self, PatchPurpose::Discard)
    }

    /// Flags passed to `git apply` for this purpose.
    pub fn apply_args(self) -> &'static [&'static str] {
        match self {
            PatchPurpose::Stage => &["--cached"],
            PatchPurpose::Unstage => &["--reverse", "--cached"],
            PatchPurpose::Discard => &["--reverse"],
        }
    }
}

impl fmt::Display for PatchPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PatchPurpose::Stage => "stage",
            PatchPurpose::Unstage => "unstage",
            PatchPurpose::Discard => "discard",
        })
    }
}

impl FromStr for PatchPurpose {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stage" => Ok(PatchPurpose::Stage),
            "unstage" => Ok(PatchPurpose::Unstage),
            "discard" => Ok(PatchPurpose::Discard),
            _ => Err(ParseError::UnknownPurpose {
                value: s.to_string(),
            }),
        }
    }
}

/// A line as it will be written into the patch.
#[derive(Debug)]
struct PatchLine<'a> {
    record: &'a LineRecord,
    marker: u8,
    body: Cow<'a, [u8]>,
}

impl<'a> PatchLine<'a> {
    fn verbatim(record: &'a LineRecord, marker: u8) -> Self {
        Self {
            record,
            marker,
            body: Cow::Borrowed(record.text.get(1..).unwrap_or_default()),
        }
    }

    fn context(record: &'a LineRecord) -> Self {
        Self::verbatim(record, b' ')
    }

    /// Copy of `record` under the opposite marker, with a line terminator.
    fn terminated_copy(record: &'a LineRecord, marker: u8) -> Self {
        let mut body = record.text.get(1..).unwrap_or_default().to_vec();
        body.push(b'\n');
        Self {
            record,
            marker,
            body: Cow::Owned(body),
        }
    }

    fn is_change(&self) -> bool {
        matches!(self.marker, b'+' | b'-')
    }
}

/// Which side of the diff a line count or start refers to.
#[derive(Debug, Clone, Copy)]
enum Side {
    Old,
    New,
}

impl Side {
    fn counts(self, marker: u8) -> bool {
        match self {
            Side::Old => marker != b'+',
            Side::New => marker != b'-',
        }
    }

    fn lineno(self, record: &LineRecord) -> Option<u32> {
        let line = record.diff_line?;
        match self {
            Side::Old => line.old_lineno,
            Side::New => line.new_lineno,
        }
    }

    fn other(self) -> Side {
        match self {
            Side::Old => Side::New,
            Side::New => Side::Old,
        }
    }

    fn range(self, header: &HunkHeader) -> (u32, u32) {
        match self {
            Side::Old => (header.old.start, header.old.len),
            Side::New => (header.new.start, header.new.len),
        }
    }
}

#[derive(Debug)]
struct PatchHunk<'a> {
    lines: Vec<PatchLine<'a>>,
}

impl PatchHunk<'_> {
    fn len(&self, side: Side) -> u32 {
        self.lines.iter().filter(|l| side.counts(l.marker)).count() as u32
    }

    fn has_changes(&self) -> bool {
        self.lines.iter().any(PatchLine::is_change)
    }

    /// First line number on the side the patch is applied against.
    ///
    /// Lines counted on that side always carry its line number. A side with
    /// no lines at all (a pure insertion staged without context, say) is
    /// anchored to the closest numbered line before the hunk, or to the
    /// original hunk header, using the zero-length start convention.
    fn reference_start(&self, records: &[LineRecord], side: Side) -> u32 {
        if let Some(n) = self
            .lines
            .iter()
            .filter(|l| side.counts(l.marker))
            .find_map(|l| side.lineno(l.record))
        {
            return n;
        }

        let first = self.lines.first().map_or(0, |l| l.record.index);
        for record in records[..first.min(records.len())].iter().rev() {
            if record.is_hunk_header() {
                let Some(header) = HunkHeader::parse(&record.text) else {
                    break;
                };
                let (start, len) = side.range(&header);
                return if len > 0 { start.saturating_sub(1) } else { start };
            }
            if let Some(n) = side.lineno(record) {
                return n;
            }
        }
        0
    }
}

/// Start of a range as the first line it covers. Zero-length ranges name the
/// line before them.
fn effective_start(start: u32, len: u32) -> i64 {
    if len == 0 {
        i64::from(start) + 1
    } else {
        i64::from(start)
    }
}

/// Distance from the reference side to the other side at the header of the
/// original hunk holding `records[index]`.
fn hunk_offset(records: &[LineRecord], index: usize, reference: Side) -> i64 {
    records
        .get(..=index)
        .unwrap_or_default()
        .iter()
        .rev()
        .find(|record| record.is_hunk_header())
        .and_then(|record| HunkHeader::parse(&record.text))
        .map_or(0, |header| {
            let (start, len) = reference.other().range(&header);
            let (ref_start, ref_len) = reference.range(&header);
            effective_start(start, len) - effective_start(ref_start, ref_len)
        })
}

/// Build a patch from `records[range]`.
///
/// Returns `Ok(None)` when the selection contains nothing to apply: no lines
/// at all, or only context once the surrounding lines are taken into account.
///
/// # Errors
///
/// [`PatchError::RangeOutOfBounds`] for a range that doesn't fit `records`,
/// [`PatchError::UnknownMarker`] / [`PatchError::EmptyLine`] for a record that
/// isn't a well-formed diff line.
pub fn make_patch(
    a_path: &str,
    b_path: &str,
    records: &[LineRecord],
    range: Range<usize>,
    purpose: PatchPurpose,
    context_lines: usize,
) -> Result<Option<Vec<u8>>, PatchError> {
    if range.start > range.end || range.end > records.len() {
        return Err(PatchError::RangeOutOfBounds {
            start: range.start,
            end: range.end,
            len: records.len(),
        });
    }

    let groups = segment(records, range)?;
    let (Some(first), Some(last)) = (groups.first(), groups.last()) else {
        return Ok(None);
    };

    let leading = leading_context(records, first.start, purpose, context_lines)?;
    let trailing = trailing_context(records, last.end, purpose, context_lines)?;

    let mut hunks = groups
        .iter()
        .map(|group| {
            records[group.clone()]
                .iter()
                .map(|record| Ok(PatchLine::verbatim(record, marker_of(record)?)))
                .collect::<Result<Vec<_>, PatchError>>()
                .map(|lines| PatchHunk { lines })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(hunk) = hunks.first_mut() {
        let mut lines = leading;
        lines.append(&mut hunk.lines);
        hunk.lines = lines;
    }
    if let Some(hunk) = hunks.last_mut() {
        hunk.lines.extend(trailing);
    }

    hunks.retain(PatchHunk::has_changes);
    if hunks.is_empty() {
        log::debug!("selection holds only context lines");
        return Ok(None);
    }

    log::debug!("{purpose} patch for {b_path} with {} hunk(s)", hunks.len());
    Ok(Some(serialize(a_path, b_path, records, &hunks, purpose)))
}

/// Split the selection into runs of lines, cutting at hunk headers.
fn segment(
    records: &[LineRecord],
    range: Range<usize>,
) -> Result<Vec<Range<usize>>, PatchError> {
    let mut groups: Vec<Range<usize>> = Vec::new();
    let mut current: Option<Range<usize>> = None;

    for index in range {
        if marker_of(&records[index])? == b'@' {
            groups.extend(current.take());
            continue;
        }
        match current.as_mut() {
            Some(group) => group.end = index + 1,
            None => current = Some(index..index + 1),
        }
    }
    groups.extend(current);

    Ok(groups)
}

fn marker_of(record: &LineRecord) -> Result<u8, PatchError> {
    match record.marker() {
        Some(marker @ (b' ' | b'+' | b'-' | b'@')) => Ok(marker),
        Some(other) => Err(PatchError::UnknownMarker {
            index: record.index,
            marker: char::from(other),
        }),
        None => Err(PatchError::EmptyLine {
            index: record.index,
        }),
    }
}

/// Context before `first`, in file order.
fn leading_context(
    records: &[LineRecord],
    first: usize,
    purpose: PatchPurpose,
    count: usize,
) -> Result<Vec<PatchLine<'_>>, PatchError> {
    let mut lines = Vec::new();
    let mut pulled = 0;

    for record in records[..first].iter().rev() {
        if pulled == count {
            break;
        }
        let marker = marker_of(record)?;
        if marker == b'@' {
            break;
        }
        if marker != b' ' && marker != purpose.context_marker() {
            continue;
        }
        pulled += 1;

        if marker != b' ' && !record.has_newline() {
            // The reference version ends on this line without a newline and
            // the selection appends to it: replace the line by its terminated
            // copy instead of keeping it as context.
            let opposite = if marker == b'-' { b'+' } else { b'-' };
            lines.push(PatchLine::terminated_copy(record, opposite));
            lines.push(PatchLine::verbatim(record, marker));
        } else {
            lines.push(PatchLine::context(record));
        }
    }

    lines.reverse();
    Ok(lines)
}

/// Context from `end` onwards.
fn trailing_context(
    records: &[LineRecord],
    end: usize,
    purpose: PatchPurpose,
    count: usize,
) -> Result<Vec<PatchLine<'_>>, PatchError> {
    let mut lines = Vec::new();

    for record in &records[end..] {
        if lines.len() == count {
            break;
        }
        let marker = marker_of(record)?;
        if marker == b'@' {
            break;
        }
        if marker == b' ' || marker == purpose.context_marker() {
            lines.push(PatchLine::context(record));
        }
    }

    Ok(lines)
}

/// Render `hunks` with recomputed headers.
///
/// The reference side's start comes from the recorded line numbers. The other
/// side follows from it: the offset between both sides at the original hunk
/// header, plus what the hunks already written add or remove.
fn serialize(
    a_path: &str,
    b_path: &str,
    records: &[LineRecord],
    hunks: &[PatchHunk<'_>],
    purpose: PatchPurpose,
) -> Vec<u8> {
    let mut patch = Vec::new();
    patch.extend_from_slice(format!("--- a/{a_path}\n+++ b/{b_path}\n").as_bytes());

    let reference = purpose.reference_side();
    let mut offset = hunks
        .first()
        .and_then(|hunk| hunk.lines.first())
        .map_or(0, |line| hunk_offset(records, line.record.index, reference));

    let mut unterminated = false;
    for hunk in hunks {
        let (ref_len, other_len) = (hunk.len(reference), hunk.len(reference.other()));
        let ref_start = hunk.reference_start(records, reference);
        let mut other_start = effective_start(ref_start, ref_len) + offset;
        if other_len == 0 {
            other_start -= 1;
        }
        let other_start = u32::try_from(other_start).unwrap_or(0);
        offset += i64::from(other_len) - i64::from(ref_len);

        let header = match reference {
            Side::Old => HunkHeader::new(ref_start, ref_len, other_start, other_len),
            Side::New => HunkHeader::new(other_start, other_len, ref_start, ref_len),
        };
        if unterminated {
            end_unterminated(&mut patch);
        }
        patch.extend_from_slice(format!("{header}\n").as_bytes());

        for line in &hunk.lines {
            if unterminated {
                end_unterminated(&mut patch);
            }
            patch.push(line.marker);
            patch.extend_from_slice(&line.body);
            unterminated = !line.body.ends_with(b"\n");
        }
    }

    if !patch.ends_with(b"\n") {
        patch.push(b'\n');
        patch.extend_from_slice(NO_NEWLINE);
    }

    patch
}

fn end_unterminated(patch: &mut Vec<u8>) {
    patch.push(b'\n');
    patch.extend_from_slice(NO_NEWLINE);
    patch.push(b'\n');
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::parse_records;
    use similar_asserts::assert_eq;

    fn patch(
        diff: &str,
        range: Range<usize>,
        purpose: PatchPurpose,
        context: usize,
    ) -> Option<String> {
        let records = parse_records(diff.as_bytes()).unwrap();
        make_patch("f", "f", &records, range, purpose, context)
            .unwrap()
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    const REPLACE: &str = "@@ -1,5 +1,6 @@
 one
 two
-three
+THREE
+extra
 four
 five
";

    const UNTERMINATED: &str = "@@ -1,2 +1,2 @@
 keep
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";

    const TWO_HUNKS: &str = "@@ -1,4 +1,4 @@
 a
-b
+B
 c
 d
@@ -10,3 +10,4 @@
 j
+k
 l
 m
";

    #[test]
    fn header_counts_context_and_changes() {
        let diff = "@@ -10,3 +12,4 @@\n a\n-b\n+c\n+d\n e\n";
        assert_eq!(
            patch(diff, 1..6, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -10,3 +12,4 @@\n a\n-b\n+c\n+d\n e\n"
        );
        // Including the original header changes nothing.
        assert_eq!(
            patch(diff, 0..6, PatchPurpose::Stage, 3),
            patch(diff, 1..6, PatchPurpose::Stage, 3)
        );
    }

    #[test]
    fn stage_turns_outside_deletions_into_context() {
        assert_eq!(
            patch(REPLACE, 5..6, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -1,5 +1,6 @@\n one\n two\n three\n+extra\n four\n five\n"
        );
    }

    #[test]
    fn unstage_turns_outside_additions_into_context() {
        assert_eq!(
            patch(REPLACE, 3..4, PatchPurpose::Unstage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -1,6 +1,5 @@\n one\n two\n-three\n THREE\n extra\n four\n"
        );
    }

    #[test]
    fn discard_uses_the_same_context_as_unstage() {
        assert_eq!(
            patch(REPLACE, 3..4, PatchPurpose::Discard, 3),
            patch(REPLACE, 3..4, PatchPurpose::Unstage, 3)
        );
    }

    #[test]
    fn context_stops_at_requested_count() {
        assert_eq!(
            patch(REPLACE, 4..5, PatchPurpose::Stage, 1).unwrap(),
            "--- a/f\n+++ b/f\n@@ -3,2 +3,3 @@\n three\n+THREE\n four\n"
        );
        assert_eq!(
            patch(REPLACE, 4..5, PatchPurpose::Stage, 0).unwrap(),
            "--- a/f\n+++ b/f\n@@ -3,0 +4,1 @@\n+THREE\n"
        );
    }

    #[test]
    fn rewritten_deletions_keep_result_side_start() {
        // Staging "+X" alone: the index still holds a, b and c.
        let diff = "@@ -1,4 +1,2 @@\n-a\n-b\n-c\n d\n+X\n";
        assert_eq!(
            patch(diff, 5..6, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -2,3 +2,4 @@\n b\n c\n d\n+X\n"
        );
        assert_eq!(
            patch(diff, 5..6, PatchPurpose::Stage, 1).unwrap(),
            "--- a/f\n+++ b/f\n@@ -4,1 +4,2 @@\n d\n+X\n"
        );
    }

    #[test]
    fn rewritten_additions_keep_result_side_start() {
        // Unstaging "-d" alone: the index keeps A and B.
        let diff = "@@ -1,2 +1,3 @@\n+A\n+B\n c\n-d\n";
        assert_eq!(
            patch(diff, 4..5, PatchPurpose::Unstage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -1,4 +1,3 @@\n A\n B\n c\n-d\n"
        );
    }

    #[test]
    fn selection_across_hunks_is_split() {
        assert_eq!(
            patch(TWO_HUNKS, 3..9, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n\
             @@ -1,4 +1,5 @@\n a\n b\n+B\n c\n d\n\
             @@ -10,3 +11,4 @@\n j\n+k\n l\n m\n"
        );
    }

    #[test]
    fn context_only_part_of_a_selection_is_dropped() {
        assert_eq!(
            patch(TWO_HUNKS, 4..9, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -10,3 +10,4 @@\n j\n+k\n l\n m\n"
        );
    }

    #[test]
    fn context_only_selection_is_no_patch() {
        assert_eq!(patch(REPLACE, 1..3, PatchPurpose::Stage, 3), None);
        assert_eq!(patch(TWO_HUNKS, 4..6, PatchPurpose::Unstage, 3), None);
    }

    #[test]
    fn empty_or_header_only_selection_is_no_patch() {
        assert_eq!(patch(REPLACE, 2..2, PatchPurpose::Stage, 3), None);
        assert_eq!(patch(TWO_HUNKS, 6..7, PatchPurpose::Stage, 3), None);
    }

    #[test]
    fn unselected_addition_outside_stage_reference_is_skipped() {
        // Staging "+THREE" alone: "+extra" doesn't exist in the index.
        assert_eq!(
            patch(REPLACE, 4..5, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -1,5 +1,6 @@\n one\n two\n three\n+THREE\n four\n five\n"
        );
    }

    #[test]
    fn missing_final_newline_gets_marker() {
        let diff = UNTERMINATED;
        let result = patch(diff, 2..3, PatchPurpose::Stage, 3).unwrap();
        assert_eq!(
            result,
            "--- a/f\n+++ b/f\n@@ -1,2 +1,1 @@\n keep\n-old\n\\ No newline at end of file"
        );
        assert!(result.ends_with("\n\\ No newline at end of file"));
    }

    #[test]
    fn appending_after_unterminated_line_rewrites_it() {
        let diff = UNTERMINATED;
        assert_eq!(
            patch(diff, 3..4, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -1,2 +1,3 @@\n keep\n-old\n\\ No newline at end of file\n\
             +old\n+new\n\\ No newline at end of file"
        );
    }

    #[test]
    fn pure_insertion_without_context_anchors_to_header() {
        let diff = "@@ -0,0 +1,2 @@\n+first\n+second\n";
        assert_eq!(
            patch(diff, 2..3, PatchPurpose::Stage, 3).unwrap(),
            "--- a/f\n+++ b/f\n@@ -0,0 +1,1 @@\n+second\n"
        );
    }

    #[test]
    fn unknown_marker_is_an_error() {
        let mut records = parse_records(REPLACE.as_bytes()).unwrap();
        records[4].text = b"*THREE\n".to_vec();

        let result = make_patch("f", "f", &records, 4..5, PatchPurpose::Stage, 3);
        assert!(matches!(
            result,
            Err(PatchError::UnknownMarker {
                index: 4,
                marker: '*'
            })
        ));
    }

    #[test]
    fn empty_record_in_pulled_context_is_an_error() {
        let mut records = parse_records(REPLACE.as_bytes()).unwrap();
        records[2].text.clear();

        let result = make_patch("f", "f", &records, 4..5, PatchPurpose::Stage, 3);
        assert!(matches!(result, Err(PatchError::EmptyLine { index: 2 })));
    }

    #[test]
    fn out_of_bounds_range_is_an_error() {
        let records = parse_records(REPLACE.as_bytes()).unwrap();
        let result = make_patch("f", "f", &records, 3..99, PatchPurpose::Stage, 3);
        assert!(matches!(
            result,
            Err(PatchError::RangeOutOfBounds {
                start: 3,
                end: 99,
                len: 8
            })
        ));
    }

    #[test]
    fn paths_go_into_file_header() {
        let records = parse_records(REPLACE.as_bytes()).unwrap();
        let bytes = make_patch(
            "old/name.txt",
            "new/name.txt",
            &records,
            3..4,
            PatchPurpose::Stage,
            0,
        )
        .unwrap()
        .unwrap();
        assert!(bytes.starts_with(b"--- a/old/name.txt\n+++ b/new/name.txt\n@@ "));
    }

    #[test]
    fn purpose_flags() {
        assert_eq!(PatchPurpose::Stage.apply_args(), &["--cached"][..]);
        assert_eq!(PatchPurpose::Unstage.apply_args(), &["--reverse", "--cached"][..]);
        assert_eq!(PatchPurpose::Discard.apply_args(), &["--reverse"][..]);
        assert!(!PatchPurpose::Stage.reverse());
        assert!(PatchPurpose::Discard.reverse() && !PatchPurpose::Discard.cached());
    }

    #[test]
    fn purpose_parses_case_insensitively() {
        assert_eq!("Stage".parse::<PatchPurpose>().unwrap(), PatchPurpose::Stage);
        assert_eq!(" discard ".parse::<PatchPurpose>().unwrap(), PatchPurpose::Discard);
        assert!(matches!(
            "commit".parse::<PatchPurpose>(),
            Err(ParseError::UnknownPurpose { .. })
        ));
        assert_eq!(PatchPurpose::Unstage.to_string(), "unstage");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use crate::diff::parse_records;
    use proptest::prelude::*;

    const DIFF: &str = "@@ -1,6 +1,7 @@
 alpha
-beta
-gamma
+BETA
+GAMMA
+delta
 epsilon
 zeta
 eta
@@ -20,4 +21,3 @@
 twenty
-twenty-one
 twenty-two
 twenty-three
@@ -40,0 +40,2 @@
+forty-a
+forty-b
";

    fn arb_purpose() -> impl Strategy<Value = PatchPurpose> {
        prop_oneof![
            Just(PatchPurpose::Stage),
            Just(PatchPurpose::Unstage),
            Just(PatchPurpose::Discard),
        ]
    }

    /// Recount every hunk of a rendered patch and compare with its header.
    fn check_headers(patch: &str) -> Result<(), TestCaseError> {
        let mut lines = patch.lines().skip(2).peekable();
        let mut hunks = 0;
        while let Some(line) = lines.next() {
            let header = HunkHeader::parse(line.as_bytes());
            prop_assert!(header.is_some(), "expected hunk header, got {:?}", line);
            let header = header.unwrap();
            hunks += 1;

            let (mut old, mut new, mut changes) = (0, 0, 0);
            while let Some(body) = lines.next_if(|l| !l.starts_with("@@")) {
                match body.as_bytes().first() {
                    Some(b' ') => {
                        old += 1;
                        new += 1;
                    }
                    Some(b'-') => {
                        old += 1;
                        changes += 1;
                    }
                    Some(b'+') => {
                        new += 1;
                        changes += 1;
                    }
                    Some(b'\\') => {}
                    other => prop_assert!(false, "unexpected line start {:?}", other),
                }
            }
            prop_assert_eq!(header.old.len, old);
            prop_assert_eq!(header.new.len, new);
            prop_assert!(changes > 0);
        }
        prop_assert!(hunks > 0);
        Ok(())
    }

    proptest! {
        /// Any selection yields either no patch or one whose headers match its lines
        #[test]
        fn headers_match_hunk_bodies(
            start in 0..19usize,
            len in 0..19usize,
            purpose in arb_purpose(),
            context in 0..5usize
        ) {
            let records = parse_records(DIFF.as_bytes()).unwrap();
            let end = (start + len).min(records.len());
            let start = start.min(end);

            let result = make_patch("f", "f", &records, start..end, purpose, context).unwrap();
            if let Some(bytes) = result {
                let text = String::from_utf8(bytes).unwrap();
                prop_assert!(text.starts_with("--- a/f\n+++ b/f\n@@ -"));
                check_headers(&text)?;
            }
        }

        /// Every selected change line ends up in the patch unchanged
        #[test]
        fn selected_changes_survive(
            start in 0..19usize,
            len in 1..19usize,
            purpose in arb_purpose()
        ) {
            let records = parse_records(DIFF.as_bytes()).unwrap();
            let end = (start + len).min(records.len());
            let start = start.min(end);

            let selected: Vec<&LineRecord> = records[start..end]
                .iter()
                .filter(|r| matches!(r.marker(), Some(b'+' | b'-')))
                .collect();
            let result = make_patch("f", "f", &records, start..end, purpose, 3).unwrap();

            prop_assert_eq!(result.is_some(), !selected.is_empty());
            if let Some(bytes) = result {
                let text = String::from_utf8(bytes).unwrap();
                for record in selected {
                    let line = String::from_utf8_lossy(&record.text);
                    prop_assert!(text.contains(line.as_ref()), "missing {:?} in\n{}", line, text);
                }
            }
        }
    }
}
