//! Parsers for machine-readable git output.

/// Paths reported by `git status --porcelain=v1 -z`, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    /// Paths with changes staged in the index
    pub staged: Vec<String>,
    /// Paths modified in the working tree relative to the index
    pub modified: Vec<String>,
    /// Paths deleted from the working tree
    pub deleted: Vec<String>,
    pub untracked: Vec<String>,
}

impl StatusSummary {
    pub fn parse(output: &str) -> Self {
        let mut summary = Self::default();
        let mut entries = output.split('\0').filter(|e| !e.is_empty());

        while let Some(entry) = entries.next() {
            let mut codes = entry.chars();
            let (Some(x), Some(y)) = (codes.next(), codes.next()) else {
                continue;
            };
            let Some(path) = entry.get(3..).map(str::to_string) else {
                continue;
            };

            // Renames and copies carry their source path as a separate entry
            if matches!(x, 'R' | 'C') {
                entries.next();
            }

            if x == '?' && y == '?' {
                summary.untracked.push(path);
                continue;
            }
            if x == '!' {
                continue;
            }
            if x != ' ' {
                summary.staged.push(path.clone());
            }
            match y {
                'M' | 'T' | 'U' => summary.modified.push(path),
                'D' => summary.deleted.push(path),
                _ => {}
            }
        }

        summary
    }

    /// Whether anything besides the index differs from `HEAD`
    pub fn has_worktree_changes(&self) -> bool {
        !self.modified.is_empty() || !self.deleted.is_empty() || !self.untracked.is_empty()
    }

    /// Like [`has_worktree_changes`](Self::has_worktree_changes), ignoring
    /// modifications to `path` itself
    pub fn has_worktree_changes_besides(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./");
        !self.untracked.is_empty()
            || self.modified.iter().any(|p| p != path)
            || self.deleted.iter().any(|p| p != path)
    }
}

/// One line of `git stash list --format=%gd%x00%H%x00%gs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    /// Reflog selector, e.g. `stash@{0}`
    pub reference: String,
    /// Commit id of the stash
    pub oid: String,
    /// Reflog subject, e.g. `On main: temp-stash-for-pr-...`
    pub message: String,
}

impl StashEntry {
    pub fn parse_list(output: &str) -> Vec<Self> {
        output
            .lines()
            .filter_map(|line| {
                let mut fields = line.splitn(3, '\0');
                Some(Self {
                    reference: fields.next()?.to_string(),
                    oid: fields.next()?.to_string(),
                    message: fields.next()?.to_string(),
                })
            })
            .collect()
    }
}

/// Find the stash created under `label`.
///
/// A recorded object id wins; otherwise the first entry whose message contains
/// the label. Entries from other workflows are never matched by position.
pub fn find_stash<'a>(
    entries: &'a [StashEntry],
    label: &str,
    oid: Option<&str>,
) -> Option<&'a StashEntry> {
    oid.and_then(|oid| entries.iter().find(|e| e.oid == oid))
        .or_else(|| entries.iter().find(|e| e.message.contains(label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn parse_status_kinds() {
        let out = "M  staged.rs\0 M edited.rs\0 D gone.rs\0?? notes.txt\0MM both.rs\0";
        let status = StatusSummary::parse(out);
        assert_eq!(status.staged, vec!["staged.rs", "both.rs"]);
        assert_eq!(status.modified, vec!["edited.rs", "both.rs"]);
        assert_eq!(status.deleted, vec!["gone.rs"]);
        assert_eq!(status.untracked, vec!["notes.txt"]);
    }

    #[test]
    fn parse_status_rename_skips_source_path() {
        let out = "R  new name.rs\0old name.rs\0 M other.rs\0";
        let status = StatusSummary::parse(out);
        assert_eq!(status.staged, vec!["new name.rs"]);
        assert_eq!(status.modified, vec!["other.rs"]);
    }

    #[test]
    fn parse_empty_status() {
        let status = StatusSummary::parse("");
        assert_eq!(status, StatusSummary::default());
        assert!(!status.has_worktree_changes());
    }

    #[test]
    fn worktree_changes_besides_selected_path() {
        let status = StatusSummary::parse(" M src/parser.rs\0");
        assert!(status.has_worktree_changes());
        assert!(!status.has_worktree_changes_besides("src/parser.rs"));
        assert!(!status.has_worktree_changes_besides("./src/parser.rs"));

        let status = StatusSummary::parse(" M src/parser.rs\0?? scratch.txt\0");
        assert!(status.has_worktree_changes_besides("src/parser.rs"));
    }

    #[test]
    fn parse_stash_list() {
        let out = "stash@{0}\0aaa111\0On main: wip\nstash@{1}\0bbb222\0On main: temp-stash-for-pr-42\n";
        let entries = StashEntry::parse_list(out);
        assert_eq!(
            entries,
            vec![
                StashEntry {
                    reference: "stash@{0}".to_string(),
                    oid: "aaa111".to_string(),
                    message: "On main: wip".to_string(),
                },
                StashEntry {
                    reference: "stash@{1}".to_string(),
                    oid: "bbb222".to_string(),
                    message: "On main: temp-stash-for-pr-42".to_string(),
                },
            ]
        );
    }

    fn entries() -> Vec<StashEntry> {
        StashEntry::parse_list(
            "stash@{0}\0c0\0On main: wip parser\n\
             stash@{1}\0c1\0On dev: experiment\n\
             stash@{2}\0c2\0On main: temp-stash-for-pr-7f3a\n\
             stash@{3}\0c3\0On main: older work\n",
        )
    }

    #[test]
    fn find_stash_by_label() {
        let entries = entries();
        let found = find_stash(&entries, "temp-stash-for-pr-7f3a", None);
        assert_eq!(found.map(|e| e.reference.as_str()), Some("stash@{2}"));
    }

    #[test]
    fn find_stash_prefers_oid() {
        let entries = entries();
        let found = find_stash(&entries, "temp-stash-for-pr-7f3a", Some("c3"));
        assert_eq!(found.map(|e| e.reference.as_str()), Some("stash@{3}"));
    }

    #[test]
    fn find_stash_falls_back_to_label_when_oid_missing() {
        let entries = entries();
        let found = find_stash(&entries, "temp-stash-for-pr-7f3a", Some("gone"));
        assert_eq!(found.map(|e| e.reference.as_str()), Some("stash@{2}"));
    }

    #[test]
    fn find_stash_miss() {
        assert_eq!(find_stash(&entries(), "temp-stash-for-pr-none", None), None);
    }
}
