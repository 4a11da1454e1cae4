//! Unified diff lines as records for the patch engine.
//!
//! [`parse_records`] turns `git diff` output for one file into the flat
//! [`LineRecord`] sequence a UI displays and the [`patch`](crate::patch)
//! engine selects from.

use error_set::error_set;

pub mod file;
pub mod hunk;
pub mod line;

pub use file::parse_records;
pub use hunk::{HunkHeader, HunkRange};
pub use line::{DiffLine, LineRecord, Origin};

error_set! {
    /// Errors from reading `git diff` output into line records
    DiffParseError := {
        #[display("Invalid hunk header on line {line}: '{header}'")]
        InvalidHunkHeader { line: usize, header: String },
        #[display("Unexpected line {line} inside a hunk: '{text}'")]
        UnexpectedLine { line: usize, text: String },
        #[display("Diff covers more than one file (second file starts on line {line})")]
        MultipleFiles { line: usize },
    }
}

/// Render records the way `git-weave diff` shows them: record index, old and
/// new line numbers, then the raw line.
pub fn format_records(records: &[LineRecord]) -> String {
    records.iter().map(|record| format!("{record}\n")).collect()
}
