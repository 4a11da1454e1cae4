use super::DiffParseError;
use super::hunk::HunkHeader;
use super::line::{DiffLine, LineRecord, Origin};

const NO_NEWLINE_MARKER: u8 = b'\\';

/// Parse `git diff` output for a single file into line records.
///
/// File headers (`diff --git`, `index`, `---`, `+++`) are skipped. Every hunk
/// header becomes a record of its own, followed by one record per context,
/// addition and deletion line. A `\ No newline at end of file` marker is not
/// kept as a record: it strips the terminator from the line it follows.
///
/// Output with no hunks at all (an empty diff, or `Binary files ... differ`)
/// yields no records.
pub fn parse_records(text: &[u8]) -> Result<Vec<LineRecord>, DiffParseError> {
    let mut records: Vec<LineRecord> = Vec::new();
    let mut cursor = 0usize;
    let mut hunk: Option<usize> = None;
    let mut line_in_hunk = 0usize;
    let mut old_line = 0u32;
    let mut new_line = 0u32;
    let mut seen_file_header = false;

    for (number, raw) in text.split_inclusive(|&b| b == b'\n').enumerate() {
        let line_number = number + 1;

        if raw.starts_with(b"diff --git ") {
            if seen_file_header {
                return Err(DiffParseError::MultipleFiles { line: line_number });
            }
            seen_file_header = true;
            continue;
        }

        if raw.starts_with(b"@@") {
            let header = HunkHeader::parse(raw).ok_or_else(|| DiffParseError::InvalidHunkHeader {
                line: line_number,
                header: String::from_utf8_lossy(raw).trim_end().to_string(),
            })?;
            let index = hunk.map_or(0, |h| h + 1);
            hunk = Some(index);
            line_in_hunk = 0;
            old_line = header.old.start;
            new_line = header.new.start;

            push(&mut records, &mut cursor, raw.to_vec(), None, (index, 0));
            continue;
        }

        // Everything before the first hunk is file header material.
        let Some(hunk_index) = hunk else {
            continue;
        };

        let marker = raw.first().copied().unwrap_or(b'\n');
        if marker == NO_NEWLINE_MARKER {
            if let Some(last) = records.last_mut()
                && last.diff_line.is_some()
                && last.text.last() == Some(&b'\n')
            {
                last.text.pop();
                cursor -= 1;
            }
            continue;
        }

        let Some(origin) = Origin::from_marker(marker) else {
            return Err(DiffParseError::UnexpectedLine {
                line: line_number,
                text: String::from_utf8_lossy(raw).trim_end().to_string(),
            });
        };

        let diff_line = match origin {
            Origin::Context => {
                let line = DiffLine {
                    origin,
                    old_lineno: Some(old_line),
                    new_lineno: Some(new_line),
                };
                old_line += 1;
                new_line += 1;
                line
            }
            Origin::Deletion => {
                let line = DiffLine {
                    origin,
                    old_lineno: Some(old_line),
                    new_lineno: None,
                };
                old_line += 1;
                line
            }
            Origin::Addition => {
                let line = DiffLine {
                    origin,
                    old_lineno: None,
                    new_lineno: Some(new_line),
                };
                new_line += 1;
                line
            }
        };

        line_in_hunk += 1;
        push(
            &mut records,
            &mut cursor,
            raw.to_vec(),
            Some(diff_line),
            (hunk_index, line_in_hunk),
        );
    }

    log::debug!("parsed {} diff line records", records.len());
    Ok(records)
}

fn push(
    records: &mut Vec<LineRecord>,
    cursor: &mut usize,
    text: Vec<u8>,
    diff_line: Option<DiffLine>,
    hunk_pos: (usize, usize),
) {
    let len = text.len();
    records.push(LineRecord {
        text,
        diff_line,
        cursor: *cursor,
        hunk_pos,
        index: records.len(),
    });
    *cursor += len;
}
