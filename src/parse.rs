//! Parsing for `FILE[:N[..M]]` selection arguments.
//!
//! Line numbers are one-based and inclusive, as an editor shows them:
//!
//! - `FILE` - the whole file is a candidate, no lines selected yet
//! - `FILE:N` - line N
//! - `FILE:N..M` - lines N through M
//!
//! ```
//! use git_partial_pr::parse::parse_selection;
//!
//! let sel = parse_selection("src/parser.rs:41..45").unwrap();
//! assert_eq!(sel.file, "src/parser.rs");
//! let range = sel.range.unwrap();
//! assert_eq!((range.start, range.end), (40, 44));
//! ```

use std::num::NonZeroU32;

use error_set::error_set;

use crate::patch::SelectionRange;

error_set! {
    /// Errors from parsing a selection argument
    ParseError := {
        /// File name portion before the colon is empty or whitespace
        #[display("Invalid selection '{input}': file name cannot be empty")]
        EmptyFileName { input: String },
        /// A colon was given with nothing after it
        #[display("Invalid selection '{input}': expected a line or range after ':'")]
        EmptyRange { input: String },
        /// Line number could not be parsed as a valid non-zero u32
        #[display("Invalid line number '{value}'")]
        InvalidLineNumber { value: String },
        /// Range has start greater than end
        #[display("Invalid range {start}..{end}: start must be <= end")]
        InvalidRange { start: u32, end: u32 },
    }
}

/// A file plus the lines picked from it
#[derive(Debug, Clone, PartialEq)]
pub struct FileSelection {
    pub file: String,
    /// Zero-based range; `None` when only a file was named
    pub range: Option<SelectionRange>,
}

/// Parse `FILE`, `FILE:N` or `FILE:N..M`.
///
/// The split happens at the last colon whose suffix looks like a line
/// reference, so paths containing colons still work when a range follows.
///
/// # Errors
///
/// Returns [`ParseError`] if the file name is empty, a line number is zero
/// or not a number, or the range is inverted.
pub fn parse_selection(input: &str) -> Result<FileSelection, ParseError> {
    let (file, range) = match input.rsplit_once(':') {
        Some((file, refs)) if looks_like_range(refs) => (file, Some(refs)),
        _ => (input, None),
    };

    let file = file.trim();
    if file.is_empty() {
        return Err(ParseError::EmptyFileName {
            input: input.to_string(),
        });
    }

    let range = match range.map(str::trim) {
        None => None,
        Some("") => {
            return Err(ParseError::EmptyRange {
                input: input.to_string(),
            });
        }
        Some(refs) => Some(parse_range(refs)?),
    };

    Ok(FileSelection {
        file: file.to_string(),
        range,
    })
}

/// Anything made of digits, dots and whitespace is treated as a line reference
fn looks_like_range(refs: &str) -> bool {
    refs.chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c.is_whitespace())
}

/// Parse `N` or `N..M` into a zero-based range
fn parse_range(input: &str) -> Result<SelectionRange, ParseError> {
    let (start, end) = match input.split_once("..") {
        Some((start, end)) => (parse_line_number(start)?, parse_line_number(end)?),
        None => {
            let line = parse_line_number(input)?;
            (line, line)
        }
    };

    SelectionRange::from_one_based(start, end).ok_or(ParseError::InvalidRange {
        start: start.get(),
        end: end.get(),
    })
}

fn parse_line_number(input: &str) -> Result<NonZeroU32, ParseError> {
    input
        .trim()
        .parse::<NonZeroU32>()
        .map_err(|_| ParseError::InvalidLineNumber {
            value: input.to_string(),
        })
}
