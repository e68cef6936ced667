pub mod file;
pub mod hunk;

pub use file::{FILE_HEADER_LINES, FileDiff, file_header, parse_hunks};
pub use hunk::{DiffHunk, HunkHeader};
