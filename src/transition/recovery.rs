//! Undo steps for a transition that failed part way.
//!
//! [`plan`] decides which steps apply from what the transition had changed and
//! where it stopped; [`recover`] runs them in order.

use std::fmt;

use tracing::{info, warn};

use super::stage::{Progress, Stage};
use super::{PatchMode, TransitionState};
use crate::config::Config;
use crate::git::{ApplyMode, Git, find_stash};
use crate::patch::PatchFile;

/// One compensating action, listed in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoStep {
    /// `reset --hard HEAD` on the new branch before anything was committed
    DiscardPartialApply,
    RestoreOriginalBranch,
    DeleteNewBranch,
    PopStash,
    /// `reset --soft HEAD~1` over the throwaway commit
    UndoTemporaryCommit,
    /// Put the selected changes back into the original working tree
    ReapplySelection,
    /// Drop the selection from the index again
    UnstageSelection,
    RemovePatchFile,
}

impl UndoStep {
    fn requires_original_branch(self) -> bool {
        matches!(
            self,
            UndoStep::DeleteNewBranch
                | UndoStep::PopStash
                | UndoStep::UndoTemporaryCommit
                | UndoStep::ReapplySelection
                | UndoStep::UnstageSelection
        )
    }
}

impl fmt::Display for UndoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UndoStep::DiscardPartialApply => "discard the partially applied patch",
            UndoStep::RestoreOriginalBranch => "check out the original branch",
            UndoStep::DeleteNewBranch => "delete the new branch",
            UndoStep::PopStash => "restore stashed changes",
            UndoStep::UndoTemporaryCommit => "undo the temporary commit",
            UndoStep::ReapplySelection => "re-apply the selected changes",
            UndoStep::UnstageSelection => "unstage the selected changes",
            UndoStep::RemovePatchFile => "remove the patch file",
        })
    }
}

/// An undo step that failed or could not run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryError {
    pub step: UndoStep,
    pub message: String,
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not {}: {}", self.step, self.message)
    }
}

impl std::error::Error for RecoveryError {}

/// Undo steps for a transition that failed while running `failed`
pub(crate) fn plan(
    state: &TransitionState,
    progress: &Progress,
    failed: Stage,
    config: &Config,
) -> Vec<UndoStep> {
    let committed = progress.committed();
    let mut steps = Vec::new();

    if (Stage::PatchApplied..=Stage::Committed).contains(&failed) {
        steps.push(UndoStep::DiscardPartialApply);
    }
    if (Stage::BranchPrepared..Stage::OriginalBranchRestored).contains(&failed) {
        steps.push(UndoStep::RestoreOriginalBranch);
    }
    if progress.branch_created && !committed && config.delete_branch_on_failure {
        steps.push(UndoStep::DeleteNewBranch);
    }
    if progress.stash_pushed && failed <= Stage::OriginalBranchRestored {
        steps.push(UndoStep::PopStash);
    }
    if progress.temporary_commit {
        steps.push(UndoStep::UndoTemporaryCommit);
    }
    if progress.parked && !committed {
        steps.push(UndoStep::ReapplySelection);
    }
    if state.mode == PatchMode::Selection
        && progress.reached >= Stage::PatchReady
        && !progress.parked
    {
        steps.push(UndoStep::UnstageSelection);
    }
    steps.push(UndoStep::RemovePatchFile);

    steps
}

/// Run the planned undo steps and collect the ones that failed.
///
/// Every step is attempted once. Steps that need the original branch are
/// skipped if checking it out failed, including the success-path checkout.
pub(crate) fn recover(
    git: &impl Git,
    state: &TransitionState,
    progress: &Progress,
    failed: Stage,
    config: &Config,
    patch_file: PatchFile,
) -> Vec<RecoveryError> {
    let mut errors = Vec::new();
    let mut patch_file = Some(patch_file);
    let mut on_original_branch = failed != Stage::OriginalBranchRestored;
    let mut selection_restored = true;

    for step in plan(state, progress, failed, config) {
        if step.requires_original_branch() && !on_original_branch {
            warn!(%step, "skipping undo step, original branch not checked out");
            if step == UndoStep::ReapplySelection {
                selection_restored = false;
            }
            let message = if step == UndoStep::PopStash {
                format!(
                    "stash '{}' left in place, not on original branch '{}'",
                    state.stash_label, state.current_branch
                )
            } else {
                format!("not on original branch '{}'", state.current_branch)
            };
            errors.push(RecoveryError { step, message });
            continue;
        }

        info!(%step, "undoing");
        let result = match step {
            UndoStep::DiscardPartialApply => git.reset_hard("HEAD").map_err(|e| e.to_string()),
            UndoStep::RestoreOriginalBranch => git
                .checkout(&state.current_branch)
                .map_err(|e| e.to_string()),
            UndoStep::DeleteNewBranch => git
                .delete_branch(&state.new_branch)
                .map_err(|e| e.to_string()),
            UndoStep::PopStash => pop_stash(git, state, progress),
            UndoStep::UndoTemporaryCommit => git.reset_soft("HEAD~1").map_err(|e| e.to_string()),
            UndoStep::ReapplySelection => reapply_selection(git, state),
            UndoStep::UnstageSelection => git.reset_index().map_err(|e| e.to_string()),
            UndoStep::RemovePatchFile => match patch_file.take() {
                Some(file) => remove_patch_file(file, selection_restored),
                None => Ok(()),
            },
        };

        if let Err(message) = result {
            warn!(%step, %message, "undo step failed");
            match step {
                UndoStep::RestoreOriginalBranch => on_original_branch = false,
                UndoStep::ReapplySelection => selection_restored = false,
                _ => {}
            }
            errors.push(RecoveryError { step, message });
        }
    }

    errors
}

fn pop_stash(git: &impl Git, state: &TransitionState, progress: &Progress) -> Result<(), String> {
    let entries = match git.stash_list() {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, label = %state.stash_label, "could not list stashes");
            return Ok(());
        }
    };

    match find_stash(&entries, &state.stash_label, progress.stash_oid.as_deref()) {
        Some(entry) => git.stash_pop(&entry.reference).map_err(|e| e.to_string()),
        None => Err(format!("no stash entry labelled '{}'", state.stash_label)),
    }
}

fn reapply_selection(git: &impl Git, state: &TransitionState) -> Result<(), String> {
    let patch = state.patch_path.as_path();
    let applied = match state.mode {
        PatchMode::Selection => git.apply(patch, ApplyMode::WorkTree),
        PatchMode::Staged => git
            .apply(patch, ApplyMode::Cached)
            .and_then(|()| git.apply(patch, ApplyMode::WorkTree)),
    };
    applied.map_err(|e| e.to_string())
}

/// Remove the patch file, or keep it when it is the only copy of the selection
fn remove_patch_file(file: PatchFile, selection_restored: bool) -> Result<(), String> {
    if selection_restored {
        return file.remove().map_err(|e| e.to_string());
    }
    match file.keep() {
        Ok(path) => Err(format!(
            "kept {} since the selection could not be re-applied",
            path.display()
        )),
        Err(e) => Err(e.to_string()),
    }
}
