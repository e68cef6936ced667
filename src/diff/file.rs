use super::hunk::{DiffHunk, HunkHeader};

/// Number of leading lines reused verbatim as the patch's file header
/// (`diff --git`, `index`, `--- a/...`, `+++ b/...`). Diffs with a
/// different header shape (new files, mode changes) are not detected.
pub const FILE_HEADER_LINES: usize = 4;

/// A single-file unified diff split into header and hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// The first [`FILE_HEADER_LINES`] lines of the diff, terminators included
    pub header: String,
    /// Hunks in source order (ascending `new_start`)
    pub hunks: Vec<DiffHunk>,
}

impl FileDiff {
    /// Split diff text into its header and hunks.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            header: file_header(text).to_string(),
            hunks: parse_hunks(text),
        }
    }
}

/// The first [`FILE_HEADER_LINES`] lines of `text`, or all of it if shorter.
pub fn file_header(text: &str) -> &str {
    let end = text
        .match_indices('\n')
        .nth(FILE_HEADER_LINES - 1)
        .map(|(i, _)| i + 1)
        .unwrap_or(text.len());
    &text[..end]
}

/// Parse the hunks of a single-file unified diff.
///
/// A header line opens a new hunk and closes the previous one; every other
/// line belongs to the open hunk. Lines before the first header are skipped.
/// Each hunk's `text` is sliced straight out of `text`, so concatenating all
/// of them reproduces the diff from the first header onwards.
pub fn parse_hunks(text: &str) -> Vec<DiffHunk> {
    let mut hunks = Vec::new();
    let mut open: Option<(HunkHeader, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if let Some(header) = HunkHeader::parse(content) {
            if let Some((previous, start)) = open.take() {
                hunks.push(DiffHunk::new(previous, text[start..offset].to_string()));
            }
            open = Some((header, offset));
        }
        offset += line.len();
    }

    if let Some((header, start)) = open {
        hunks.push(DiffHunk::new(header, text[start..].to_string()));
    }

    hunks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const THREE_HUNKS: &str = r#"diff --git a/config.nix b/config.nix
index fa2da6e..41114ff 100644
--- a/config.nix
+++ b/config.nix
@@ -2,0 +3 @@ line 2
+# FIRST INSERTION
@@ -8,0 +10 @@ line 8
+# SECOND INSERTION
@@ -15 +16,0 @@
-removed
"#;

    #[test]
    fn parse_empty_diff() {
        assert!(parse_hunks("").is_empty());
    }

    #[test]
    fn parse_header_only_diff() {
        let diff = "diff --git a/a b/a\nold mode 100644\nnew mode 100755\n";
        assert!(parse_hunks(diff).is_empty());
    }

    #[test]
    fn parse_single_hunk() {
        let diff = r#"diff --git a/flake.nix b/flake.nix
index abc1234..def5678 100644
--- a/flake.nix
+++ b/flake.nix
@@ -136,0 +137 @@
+      debug = true;
"#;
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_start, 136);
        assert_eq!(hunks[0].old_count, 0);
        assert_eq!(hunks[0].new_start, 137);
        assert_eq!(hunks[0].new_count, 1);
        assert_eq!(hunks[0].new_end(), 137);
        assert_eq!(hunks[0].text, "@@ -136,0 +137 @@\n+      debug = true;\n");
    }

    #[test]
    fn parse_multiple_hunks_in_order() {
        let hunks = parse_hunks(THREE_HUNKS);
        assert_eq!(hunks.len(), 3);
        assert_eq!(
            hunks.iter().map(|h| h.new_start).collect::<Vec<_>>(),
            vec![3, 10, 16]
        );
        assert_eq!(hunks[1].text, "@@ -8,0 +10 @@ line 8\n+# SECOND INSERTION\n");
        assert_eq!(hunks[2].text, "@@ -15 +16,0 @@\n-removed\n");
    }

    #[test]
    fn hunk_texts_reassemble_diff_body() {
        let hunks = parse_hunks(THREE_HUNKS);
        let body: String = hunks.iter().map(|h| h.text.as_str()).collect();
        let first = THREE_HUNKS.find("@@ ").unwrap();
        assert_eq!(body, &THREE_HUNKS[first..]);
    }

    #[test]
    fn last_hunk_without_trailing_newline() {
        let diff = "diff --git a/x b/x\nindex 1..2 100644\n--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].text, "@@ -1 +1 @@\n-a\n+b");
    }

    #[test]
    fn no_newline_marker_stays_in_hunk() {
        let diff = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file\n";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 1);
        assert!(hunks[0].text.ends_with("+b\n\\ No newline at end of file\n"));
    }

    #[test]
    fn crlf_headers_are_recognised() {
        let diff = "--- a/x\r\n+++ b/x\r\n@@ -1 +1 @@\r\n-a\r\n+b\r\n";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].text, "@@ -1 +1 @@\r\n-a\r\n+b\r\n");
    }

    #[test]
    fn body_line_resembling_header_is_not_split() {
        let diff = "--- a/x\n+++ b/x\n@@ -1,2 +1,2 @@\n-@@ -9 +9 @@\n+@@ -9,1 +9,1 @@\n context\n";
        assert_eq!(parse_hunks(diff).len(), 1);
    }

    #[test]
    fn file_header_is_first_four_lines() {
        let file = FileDiff::parse(THREE_HUNKS);
        assert_eq!(
            file.header,
            "diff --git a/config.nix b/config.nix\nindex fa2da6e..41114ff 100644\n--- a/config.nix\n+++ b/config.nix\n"
        );
        assert_eq!(file.hunks.len(), 3);
    }

    #[test]
    fn file_header_is_not_validated() {
        // A new-file diff has five header lines; only four are taken.
        let diff = "diff --git a/n b/n\nnew file mode 100644\nindex 0000000..e69de29\n--- /dev/null\n+++ b/n\n@@ -0,0 +1 @@\n+x\n";
        assert_eq!(
            file_header(diff),
            "diff --git a/n b/n\nnew file mode 100644\nindex 0000000..e69de29\n--- /dev/null\n"
        );
    }

    #[test]
    fn file_header_of_short_text() {
        assert_eq!(file_header("only\ntwo"), "only\ntwo");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// A body line that can never be mistaken for a hunk header
    fn arb_body_line() -> impl Strategy<Value = String> {
        (
            prop::sample::select(vec!['+', '-', ' ']),
            prop::collection::vec(prop::char::range(' ', '~'), 0..20),
        )
            .prop_map(|(prefix, chars)| {
                let mut line = String::from(prefix);
                line.extend(chars);
                line
            })
    }

    /// Hunks as (gap before this hunk, new_count, body lines)
    fn arb_hunks() -> impl Strategy<Value = Vec<(u32, u32, Vec<String>)>> {
        prop::collection::vec(
            (
                1..40u32,
                0..6u32,
                prop::collection::vec(arb_body_line(), 1..6),
            ),
            0..8,
        )
    }

    fn render(hunks: &[(u32, u32, Vec<String>)]) -> (String, Vec<u32>) {
        let mut text = String::from(
            "diff --git a/f b/f\nindex 1111111..2222222 100644\n--- a/f\n+++ b/f\n",
        );
        let mut starts = Vec::new();
        let mut next = 1;
        for (gap, count, body) in hunks {
            let start = next + gap;
            starts.push(start);
            text.push_str(&format!("@@ -{start},{count} +{start},{count} @@\n"));
            for line in body {
                text.push_str(line);
                text.push('\n');
            }
            next = start + count;
        }
        (text, starts)
    }

    proptest! {
        /// N ordered hunks parse back as exactly N hunks in the same order
        #[test]
        fn parses_every_hunk_in_order(hunks in arb_hunks()) {
            let (text, starts) = render(&hunks);
            let parsed = parse_hunks(&text);

            prop_assert_eq!(parsed.len(), hunks.len());
            prop_assert_eq!(
                parsed.iter().map(|h| h.new_start).collect::<Vec<_>>(),
                starts
            );
        }

        /// Hunk texts are contiguous slices covering the whole body
        #[test]
        fn hunk_texts_cover_body(hunks in arb_hunks()) {
            let (text, _) = render(&hunks);
            let body: String = parse_hunks(&text).iter().map(|h| h.text.as_str()).collect();
            let header = file_header(&text);

            prop_assert_eq!(format!("{header}{body}"), text);
        }
    }
}
