use serde::Serialize;
use std::fmt;

/// Kind of change a diff line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Origin {
    Context,
    Addition,
    Deletion,
}

impl Origin {
    /// The marker byte a unified diff uses for this kind of line.
    pub fn marker(self) -> u8 {
        match self {
            Origin::Context => b' ',
            Origin::Addition => b'+',
            Origin::Deletion => b'-',
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b' ' => Some(Origin::Context),
            b'+' => Some(Origin::Addition),
            b'-' => Some(Origin::Deletion),
            _ => None,
        }
    }
}

/// Structured view of a diff line: its origin and where it sits in the old
/// and new versions of the file.
///
/// Additions have no old line number, deletions no new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub origin: Origin,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
}

/// One physical line of a rendered unified diff.
///
/// `text` keeps the marker byte and the original line terminator, if any.
/// Hunk headers are records too, with no `diff_line`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRecord {
    pub text: Vec<u8>,
    pub diff_line: Option<DiffLine>,
    /// Byte offset of this line in the rendered document.
    pub cursor: usize,
    /// `(hunk index, line index within the hunk)`; the header is line 0.
    pub hunk_pos: (usize, usize),
    /// Position in the whole record sequence.
    pub index: usize,
}

impl LineRecord {
    /// First byte of the text: `' '`, `'+'`, `'-'` or `'@'` for well-formed input.
    pub fn marker(&self) -> Option<u8> {
        self.text.first().copied()
    }

    pub fn is_hunk_header(&self) -> bool {
        self.marker() == Some(b'@')
    }

    pub fn has_newline(&self) -> bool {
        self.text.last() == Some(&b'\n')
    }

    /// Line content without marker and terminator.
    pub fn content(&self) -> &[u8] {
        let body = self.text.get(1..).unwrap_or_default();
        body.strip_suffix(b"\n").unwrap_or(body)
    }
}

impl fmt::Display for LineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(&self.text);
        match self.diff_line {
            Some(DiffLine {
                old_lineno,
                new_lineno,
                ..
            }) => {
                let number = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_default();
                write!(
                    f,
                    "{:<5} {:>5} {:>5}  {}",
                    self.index,
                    number(old_lineno),
                    number(new_lineno),
                    text.trim_end_matches('\n')
                )
            }
            None => write!(
                f,
                "{:<5}              {}",
                self.index,
                text.trim_end_matches('\n')
            ),
        }
    }
}
