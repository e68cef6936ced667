//! Moving a patch from the working tree onto a fresh pull request branch.
//!
//! A transition runs a fixed sequence of [`Stage`]s against the repository.
//! Everything it needs (branch names, stash label, patch file) is worked out
//! before the first mutation. If a stage fails, the undo steps that match how
//! far it got are run and the original error is handed back together with any
//! undo step that failed.

use std::fmt;
use std::path::PathBuf;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::branch::branch_name;
use crate::config::Config;
use crate::diff::parse_hunks;
use crate::git::remote::resolve_base_branch;
use crate::git::{ApplyMode, Git, RemoteRepo, find_stash};
use crate::patch::{Patch, PatchFile, SelectionRange, extract_patch_for_selection};
use crate::{GitCommandError, TransitionError};

mod recovery;
mod stage;

pub use recovery::{RecoveryError, UndoStep};
pub use stage::Stage;
use stage::Progress;

/// Message of the commit that briefly holds the selection while stashing
pub const TEMPORARY_COMMIT_MESSAGE: &str = "temporary commit before stash";

/// Prefix of the label given to the stash of unselected work
pub const STASH_LABEL_PREFIX: &str = "temp-stash-for-pr-";

/// Where the pull request's changes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchSource {
    /// Hunks of one file's working-tree diff that touch `range`
    Selection {
        path: String,
        range: Option<SelectionRange>,
    },
    /// Everything currently staged
    Staged,
}

impl PatchSource {
    pub fn mode(&self) -> PatchMode {
        match self {
            PatchSource::Selection { .. } => PatchMode::Selection,
            PatchSource::Staged => PatchMode::Staged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    Selection,
    Staged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRequest {
    pub source: PatchSource,
    /// Commit message, also the source of the branch name
    pub message: String,
}

/// Everything a transition decided before touching the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionState {
    pub mode: PatchMode,
    /// Branch checked out when the transition started
    pub current_branch: String,
    /// Branch the pull request targets
    pub base_branch: String,
    pub new_branch: String,
    pub stash_label: String,
    /// Whether work outside the patch existed at the start
    pub has_unstaged_changes: bool,
    pub patch_path: PathBuf,
}

/// Result of a completed transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub branch: String,
    pub base_branch: String,
    pub pushed: bool,
    /// Page for opening the pull request, when the remote URL is recognised
    pub pr_url: Option<String>,
    /// Label of a stash that could not be found to pop
    pub stash_left_in_place: Option<String>,
    pub state: TransitionState,
}

/// A failed transition: the error that stopped it, where, and what undoing it left behind
#[derive(Debug)]
pub struct TransitionFailure {
    error: TransitionError,
    failed_at: Stage,
    state: Option<TransitionState>,
    recovery: Vec<RecoveryError>,
}

impl TransitionFailure {
    fn before_mutation(error: TransitionError) -> Self {
        Self {
            error,
            failed_at: Stage::Start,
            state: None,
            recovery: Vec::new(),
        }
    }

    pub fn error(&self) -> &TransitionError {
        &self.error
    }

    pub fn into_error(self) -> TransitionError {
        self.error
    }

    /// Stage that was running when the error occurred
    pub fn failed_at(&self) -> Stage {
        self.failed_at
    }

    /// `None` if the failure happened before the state was settled
    pub fn state(&self) -> Option<&TransitionState> {
        self.state.as_ref()
    }

    /// Undo steps that failed or were skipped
    pub fn recovery(&self) -> &[RecoveryError] {
        &self.recovery
    }
}

impl fmt::Display for TransitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        for err in &self.recovery {
            write!(f, "\nrecovery: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TransitionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Drives one transition against a [`Git`] implementation
pub struct Orchestrator<'a, G: Git> {
    git: &'a G,
    config: &'a Config,
}

impl<'a, G: Git> Orchestrator<'a, G> {
    pub fn new(git: &'a G, config: &'a Config) -> Self {
        Self { git, config }
    }

    /// Run the full transition for `request`.
    ///
    /// On failure the repository is put back the way it was as far as the
    /// undo steps allow; see [`TransitionFailure::recovery`] for what did not
    /// work out.
    #[instrument(skip(self, request), fields(message = %request.message))]
    pub fn run(&self, request: &PrRequest) -> Result<Outcome, TransitionFailure> {
        let (state, patch_file) = self
            .prepare(request)
            .map_err(TransitionFailure::before_mutation)?;
        info!(
            current = %state.current_branch,
            base = %state.base_branch,
            branch = %state.new_branch,
            unstaged = state.has_unstaged_changes,
            "transition prepared"
        );

        let mut progress = Progress::default();
        let mut outcome = Outcome {
            branch: state.new_branch.clone(),
            base_branch: state.base_branch.clone(),
            pushed: false,
            pr_url: None,
            stash_left_in_place: None,
            state: state.clone(),
        };

        if let Err((failed_at, error)) =
            self.advance(request, &state, &patch_file, &mut progress, &mut outcome)
        {
            warn!(stage = %failed_at, error = %error, "transition failed, recovering");
            let recovery =
                recovery::recover(self.git, &state, &progress, failed_at, self.config, patch_file);
            return Err(TransitionFailure {
                error,
                failed_at,
                state: Some(state),
                recovery,
            });
        }

        if let Err(e) = patch_file.remove() {
            warn!(error = %e, "could not remove patch file");
        }
        info!(stage = %Stage::Done, branch = %outcome.branch, "transition complete");
        Ok(outcome)
    }

    /// Settle the transition state and write the patch file without mutating
    /// the repository
    fn prepare(&self, request: &PrRequest) -> Result<(TransitionState, PatchFile), TransitionError> {
        let current_branch = self.git.current_branch()?;

        let username = self
            .config
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(TransitionError::MissingUsername)?;
        let new_branch = branch_name(username, &request.message).ok_or_else(|| {
            TransitionError::InvalidBranchName {
                message: request.message.clone(),
            }
        })?;

        let (patch, has_unstaged_changes) = match &request.source {
            PatchSource::Selection { path, range } => {
                let range = (*range).ok_or(TransitionError::NoSelection)?;
                self.selection_patch(path, range)?
            }
            PatchSource::Staged => self.staged_patch()?,
        };

        let base_branch = resolve_base_branch(
            self.git,
            &self.config.remote,
            &self.config.fallback_base_branch,
        );
        let stash_label = format!("{STASH_LABEL_PREFIX}{}", Uuid::new_v4().simple());
        let patch_file = PatchFile::create(&patch)?;

        let state = TransitionState {
            mode: request.source.mode(),
            current_branch,
            base_branch,
            new_branch,
            stash_label,
            has_unstaged_changes,
            patch_path: patch_file.path().to_path_buf(),
        };
        Ok((state, patch_file))
    }

    fn selection_patch(
        &self,
        path: &str,
        range: SelectionRange,
    ) -> Result<(Patch, bool), TransitionError> {
        let diff = self.git.diff(Some(path), self.config.diff_context)?;
        if diff.trim().is_empty() {
            return Err(TransitionError::EmptyPatch {
                reason: format!("no changes in {path}"),
            });
        }
        let patch = extract_patch_for_selection(&diff, range).ok_or_else(|| {
            TransitionError::EmptyPatch {
                reason: format!("no hunk in {path} touches lines {range}"),
            }
        })?;

        let status = self.git.status()?;
        if !status.staged.is_empty() {
            return Err(TransitionError::StagedChangesPresent {
                paths: status.staged.join(", "),
            });
        }

        let hunks_left_behind = parse_hunks(patch.as_str()).len() < parse_hunks(&diff).len();
        let has_unstaged = hunks_left_behind || status.has_worktree_changes_besides(path);
        Ok((patch, has_unstaged))
    }

    fn staged_patch(&self) -> Result<(Patch, bool), TransitionError> {
        let diff = self.git.diff_cached(self.config.diff_context)?;
        let patch = Patch::from_diff(&diff).ok_or_else(|| TransitionError::EmptyPatch {
            reason: "nothing is staged".to_string(),
        })?;
        let status = self.git.status()?;
        Ok((patch, status.has_worktree_changes()))
    }

    /// Run every stage in order, stopping at the first failure
    fn advance(
        &self,
        request: &PrRequest,
        state: &TransitionState,
        patch_file: &PatchFile,
        progress: &mut Progress,
        outcome: &mut Outcome,
    ) -> Result<(), (Stage, TransitionError)> {
        let git = self.git;
        let patch = patch_file.path();
        let at = |stage: Stage| move |error: TransitionError| (stage, error);

        // PATCH_READY
        if state.mode == PatchMode::Selection {
            git.apply(patch, ApplyMode::CachedCheck)
                .and_then(|()| git.apply(patch, ApplyMode::Cached))
                .map_err(|e| TransitionError::StageFailure {
                    message: e.to_string(),
                })
                .map_err(at(Stage::PatchReady))?;
        }
        progress.complete(Stage::PatchReady);
        info!(stage = %Stage::PatchReady, path = %patch.display(), "patch ready");

        if state.has_unstaged_changes {
            self.stash_unselected(state, progress)
                .map_err(|e| TransitionError::StashFailure {
                    message: e.to_string(),
                })
                .map_err(at(Stage::UnstagedStashed))?;
            progress.parked = true;
            progress.complete(Stage::UnstagedStashed);
            info!(stage = %Stage::UnstagedStashed, label = %state.stash_label, "unselected work stashed");
        } else {
            git.reset_hard("HEAD")
                .map_err(|e| TransitionError::ParkFailure {
                    message: e.to_string(),
                })
                .map_err(at(Stage::SelectionParked))?;
            progress.parked = true;
            progress.complete(Stage::SelectionParked);
            info!(stage = %Stage::SelectionParked, "working tree reset to HEAD");
        }

        self.prepare_branch(state, progress)
            .map_err(|e| TransitionError::BranchPrepFailure {
                base: state.base_branch.clone(),
                branch: state.new_branch.clone(),
                message: e.to_string(),
            })
            .map_err(at(Stage::BranchPrepared))?;
        progress.complete(Stage::BranchPrepared);
        info!(stage = %Stage::BranchPrepared, base = %state.base_branch, branch = %state.new_branch, "branch prepared");

        git.apply(patch, ApplyMode::ThreeWay)
            .map_err(|e| TransitionError::ApplyFailure {
                branch: state.new_branch.clone(),
                message: e.to_string(),
            })
            .map_err(at(Stage::PatchApplied))?;
        progress.complete(Stage::PatchApplied);
        info!(stage = %Stage::PatchApplied, "patch applied");

        git.commit(&request.message, false)
            .map_err(|e| TransitionError::CommitFailure {
                message: e.to_string(),
            })
            .map_err(at(Stage::Committed))?;
        progress.complete(Stage::Committed);
        info!(stage = %Stage::Committed, "changes committed");

        if self.config.push {
            git.push(&self.config.remote, &state.new_branch)
                .map_err(|e| TransitionError::PushFailure {
                    branch: state.new_branch.clone(),
                    message: e.to_string(),
                })
                .map_err(at(Stage::Pushed))?;
            progress.complete(Stage::Pushed);
            outcome.pushed = true;
            outcome.pr_url = self.pull_request_url(&state.new_branch);
            info!(stage = %Stage::Pushed, remote = %self.config.remote, "branch pushed");
        }

        git.checkout(&state.current_branch)
            .map_err(|e| TransitionError::RestoreFailure {
                branch: state.current_branch.clone(),
                message: e.to_string(),
            })
            .map_err(at(Stage::OriginalBranchRestored))?;
        progress.complete(Stage::OriginalBranchRestored);
        info!(stage = %Stage::OriginalBranchRestored, branch = %state.current_branch, "original branch restored");

        if progress.stash_pushed {
            let popped = self
                .pop_stash(state, progress)
                .map_err(|e| TransitionError::StashPopFailure {
                    label: state.stash_label.clone(),
                    message: e.to_string(),
                })
                .map_err(at(Stage::StashPopped))?;
            if popped {
                progress.complete(Stage::StashPopped);
                info!(stage = %Stage::StashPopped, label = %state.stash_label, "stash restored");
            } else {
                warn!(label = %state.stash_label, "stash entry not found, leaving it in place");
                outcome.stash_left_in_place = Some(state.stash_label.clone());
            }
        }

        Ok(())
    }

    /// Commit the selection out of the way, stash the rest, and drop the commit
    fn stash_unselected(
        &self,
        state: &TransitionState,
        progress: &mut Progress,
    ) -> Result<(), GitCommandError> {
        self.git.commit(TEMPORARY_COMMIT_MESSAGE, true)?;
        progress.temporary_commit = true;

        self.git.stash_push(&state.stash_label)?;
        progress.stash_pushed = true;

        let entries = self.git.stash_list()?;
        match find_stash(&entries, &state.stash_label, None) {
            Some(entry) => progress.stash_oid = Some(entry.oid.clone()),
            None => {
                warn!(label = %state.stash_label, "nothing was stashed");
                progress.stash_pushed = false;
            }
        }

        self.git.reset_hard("HEAD~1")?;
        progress.temporary_commit = false;
        Ok(())
    }

    fn prepare_branch(
        &self,
        state: &TransitionState,
        progress: &mut Progress,
    ) -> Result<(), GitCommandError> {
        self.git.checkout(&state.base_branch)?;
        self.git.pull(&self.config.remote, &state.base_branch)?;
        self.git.checkout_new_branch(&state.new_branch)?;
        progress.branch_created = true;
        Ok(())
    }

    /// Pop the transition's stash, returning `false` if it cannot be found
    fn pop_stash(
        &self,
        state: &TransitionState,
        progress: &Progress,
    ) -> Result<bool, GitCommandError> {
        let entries = self.git.stash_list()?;
        let Some(entry) = find_stash(&entries, &state.stash_label, progress.stash_oid.as_deref())
        else {
            return Ok(false);
        };
        self.git.stash_pop(&entry.reference)?;
        Ok(true)
    }

    fn pull_request_url(&self, branch: &str) -> Option<String> {
        let url = match self.git.remote_url(&self.config.remote) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "could not read remote URL");
                return None;
            }
        };
        match RemoteRepo::parse(&url) {
            Ok(repo) => Some(repo.new_pull_request_url(branch)),
            Err(e) => {
                warn!(error = %e, "no pull request URL for this remote");
                None
            }
        }
    }
}
