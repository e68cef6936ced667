use std::fmt;

/// Steps of a transition, in the order they run.
///
/// Optional stages are skipped when they do not apply, so `Ord` reflects
/// sequence position, not a count of completed steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Nothing mutated yet
    #[default]
    Start,
    /// Patch is on disk and, in selection mode, staged in the index
    PatchReady,
    /// Unselected work is stashed and the working tree matches `HEAD`
    UnstagedStashed,
    /// No unselected work existed; the working tree was reset to `HEAD`
    SelectionParked,
    /// The new branch exists, cut from the freshly pulled base
    BranchPrepared,
    PatchApplied,
    Committed,
    Pushed,
    OriginalBranchRestored,
    StashPopped,
    Done,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::PatchReady => "patch-ready",
            Stage::UnstagedStashed => "unstaged-stashed",
            Stage::SelectionParked => "selection-parked",
            Stage::BranchPrepared => "branch-prepared",
            Stage::PatchApplied => "patch-applied",
            Stage::Committed => "committed",
            Stage::Pushed => "pushed",
            Stage::OriginalBranchRestored => "original-branch-restored",
            Stage::StashPopped => "stash-popped",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a transition has changed so far, as recovery needs to know it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    /// Highest stage completed
    pub reached: Stage,
    /// The throwaway commit exists and has not been reset away
    pub temporary_commit: bool,
    /// A stash entry was created under the transition's label
    pub stash_pushed: bool,
    pub stash_oid: Option<String>,
    /// The selection was removed from the original branch's working tree
    pub parked: bool,
    pub branch_created: bool,
}

impl Progress {
    pub fn complete(&mut self, stage: Stage) {
        self.reached = stage;
    }

    pub fn committed(&self) -> bool {
        self.reached >= Stage::Committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_by_sequence() {
        assert!(Stage::Start < Stage::PatchReady);
        assert!(Stage::UnstagedStashed < Stage::SelectionParked);
        assert!(Stage::SelectionParked < Stage::BranchPrepared);
        assert!(Stage::Pushed < Stage::OriginalBranchRestored);
        assert!(Stage::StashPopped < Stage::Done);
    }

    #[test]
    fn committed_tracks_reached_stage() {
        let mut progress = Progress::default();
        progress.complete(Stage::PatchApplied);
        assert!(!progress.committed());
        progress.complete(Stage::Committed);
        assert!(progress.committed());
        progress.complete(Stage::OriginalBranchRestored);
        assert!(progress.committed());
    }
}
