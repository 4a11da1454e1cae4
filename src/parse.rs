//! Parsing for line record selections given on the command line.
//!
//! A selection names record indices as printed by `git-weave diff`.
//!
//! # Syntax
//!
//! - `N` - the single record `N`
//! - `N..M` - records `N` up to, but not including, `M`
//! - `N..=M` - records `N` through `M`
//!
//! # Examples
//!
//! ```
//! use git_weave::parse::parse_selection;
//!
//! assert_eq!(parse_selection("4").unwrap(), 4..5);
//! assert_eq!(parse_selection("2..7").unwrap(), 2..7);
//! assert_eq!(parse_selection("2..=7").unwrap(), 2..8);
//! ```

use error_set::error_set;
use std::ops::Range;

error_set! {
    /// Errors from parsing command line values
    ParseError := {
        /// Nothing but whitespace was given
        #[display("Empty selection")]
        EmptySelection,
        /// Index could not be parsed as an unsigned integer
        #[display("Invalid record index '{value}'")]
        InvalidIndex { value: String },
        /// Range has start greater than end
        #[display("Invalid range {start}..{end}: start must be <= end")]
        InvalidRange { start: usize, end: usize },
        /// Patch purpose is not one of stage, unstage or discard
        #[display("Unknown patch purpose '{value}': expected stage, unstage or discard")]
        UnknownPurpose { value: String },
    }
}

/// Parse a record selection into a half-open index range.
///
/// # Errors
///
/// Returns [`ParseError`] if:
/// - The input is empty or whitespace
/// - An index is not a non-negative integer
/// - The start of a range lies past its end
pub fn parse_selection(input: &str) -> Result<Range<usize>, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::EmptySelection);
    }

    let Some((start_str, end_str)) = input.split_once("..") else {
        let index = parse_index(input)?;
        return Ok(index..index + 1);
    };

    let start = parse_index(start_str)?;
    let end = match end_str.strip_prefix('=') {
        Some(inclusive) => parse_index(inclusive)? + 1,
        None => parse_index(end_str)?,
    };
    if start > end {
        return Err(ParseError::InvalidRange { start, end });
    }

    Ok(start..end)
}

fn parse_index(input: &str) -> Result<usize, ParseError> {
    input
        .trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidIndex {
            value: input.to_string(),
        })
}
