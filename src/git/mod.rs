//! The version-control command surface a transition drives.
//!
//! [`Git`] is the seam between the orchestrator and the real `git` binary:
//! [`GitCli`] shells out, while tests substitute a recording fake.

use std::path::Path;

use crate::GitCommandError;

mod cli;
pub mod porcelain;
pub mod remote;

pub use cli::GitCli;
pub use porcelain::{StashEntry, StatusSummary, find_stash};
pub use remote::{RemoteParseError, RemoteRepo, parse_head_branch};

/// How `git apply` should treat a patch file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// `--cached --check`: verify the patch applies to the index
    CachedCheck,
    /// `--cached`: index only
    Cached,
    /// `--3way`: index and working tree, merging around context drift
    ThreeWay,
    /// plain: working tree only
    WorkTree,
}

impl ApplyMode {
    pub fn args(self) -> &'static [&'static str] {
        match self {
            ApplyMode::CachedCheck => &["--cached", "--check"],
            ApplyMode::Cached => &["--cached"],
            ApplyMode::ThreeWay => &["--3way"],
            ApplyMode::WorkTree => &[],
        }
    }
}

/// Git operations used by a transition.
///
/// Every call blocks until the underlying command has finished.
pub trait Git {
    /// Working-tree diff against the index, optionally limited to one path
    fn diff(&self, path: Option<&str>, context: u32) -> Result<String, GitCommandError>;

    /// Index diff against `HEAD`
    fn diff_cached(&self, context: u32) -> Result<String, GitCommandError>;

    fn apply(&self, patch: &Path, mode: ApplyMode) -> Result<(), GitCommandError>;

    fn status(&self) -> Result<StatusSummary, GitCommandError>;

    /// Commit the index
    fn commit(&self, message: &str, no_verify: bool) -> Result<(), GitCommandError>;

    /// Stash working-tree and untracked changes under `label`
    fn stash_push(&self, label: &str) -> Result<(), GitCommandError>;

    fn stash_list(&self) -> Result<Vec<StashEntry>, GitCommandError>;

    /// Pop the entry named by `reference` (e.g. `stash@{2}`)
    fn stash_pop(&self, reference: &str) -> Result<(), GitCommandError>;

    fn reset_hard(&self, rev: &str) -> Result<(), GitCommandError>;

    fn reset_soft(&self, rev: &str) -> Result<(), GitCommandError>;

    /// Reset the index to `HEAD`, leaving the working tree alone
    fn reset_index(&self) -> Result<(), GitCommandError>;

    fn checkout(&self, branch: &str) -> Result<(), GitCommandError>;

    /// Create `branch` at `HEAD` and switch to it
    fn checkout_new_branch(&self, branch: &str) -> Result<(), GitCommandError>;

    fn delete_branch(&self, branch: &str) -> Result<(), GitCommandError>;

    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitCommandError>;

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitCommandError>;

    /// Raw `git remote show <remote>` output
    fn remote_show(&self, remote: &str) -> Result<String, GitCommandError>;

    fn remote_url(&self, remote: &str) -> Result<String, GitCommandError>;

    /// Name of the checked-out branch
    fn current_branch(&self) -> Result<String, GitCommandError>;
}
