use error_set::error_set;

pub mod branch;
pub mod config;
pub mod diff;
pub mod git;
pub mod parse;
pub mod patch;
pub mod transition;

pub use config::{Config, ConfigError};
pub use git::{Git, GitCli};
pub use parse::ParseError;
pub use patch::{Patch, SelectionRange};
pub use transition::{
    Orchestrator, Outcome, PatchMode, PatchSource, PrRequest, RecoveryError, Stage,
    TransitionFailure, TransitionState, UndoStep,
};

error_set! {
    /// Top-level error for reading a selection out of the working tree
    PartialPrError := {
        #[display("No changes found in {file}")]
        NoChanges { file: String },
        #[display("No hunk in {file} touches lines {selection}")]
        NothingSelected { file: String, selection: String },
    } || GitCommandError

    /// Errors that end a pull request transition
    TransitionError := {
        #[display("No lines selected")]
        NoSelection,
        #[display("Nothing to include in the pull request: {reason}")]
        EmptyPatch { reason: String },
        #[display("The index already has staged changes ({paths}); commit or unstage them first, or use --staged")]
        StagedChangesPresent { paths: String },
        #[display("Cannot derive a branch name from '{message}'")]
        InvalidBranchName { message: String },
        #[display("No username configured; pass --username or set `username` in the config file")]
        MissingUsername,
        #[display("Failed to stage the selected hunks: {message}")]
        StageFailure { message: String },
        #[display("Failed to set aside unstaged changes: {message}")]
        StashFailure { message: String },
        #[display("Failed to clear the working tree before switching branches: {message}")]
        ParkFailure { message: String },
        #[display("Failed to prepare branch '{branch}' from '{base}': {message}")]
        BranchPrepFailure { base: String, branch: String, message: String },
        #[display("Patch does not apply on '{branch}': {message}")]
        ApplyFailure { branch: String, message: String },
        #[display("Failed to commit: {message}")]
        CommitFailure { message: String },
        #[display("Failed to push '{branch}': {message}")]
        PushFailure { branch: String, message: String },
        #[display("Failed to check out original branch '{branch}': {message}")]
        RestoreFailure { branch: String, message: String },
        #[display("Failed to restore stashed changes '{label}': {message}")]
        StashPopFailure { label: String, message: String },
    } || GitCommandError || PatchFileError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
    }

    /// Errors from the temporary patch file
    PatchFileError := {
        #[display("Failed to create temporary patch file: {message}")]
        CreateFailed { message: String },
        #[display("Failed to write patch to {path}: {message}")]
        WriteFailed { path: String, message: String },
        #[display("Failed to remove patch file {path}: {message}")]
        RemoveFailed { path: String, message: String },
        #[display("Failed to keep patch file {path}: {message}")]
        KeepFailed { path: String, message: String },
    }
}

/// Main interface for git-partial-pr operations
pub struct PartialPr<'a> {
    repo_path: &'a str,
}

impl<'a> PartialPr<'a> {
    /// Create a new PartialPr for the given repository path
    pub fn new(repo_path: &'a str) -> Self {
        Self { repo_path }
    }

    /// Build the patch a selection would carry, without touching the repository
    ///
    /// # Examples
    /// ```no_run
    /// # use git_partial_pr::{PartialPr, SelectionRange};
    /// let partial = PartialPr::new(".");
    /// let patch = partial
    ///     .extract("src/parser.rs", SelectionRange::new(40, 40).unwrap(), 3)
    ///     .unwrap();
    /// print!("{patch}");
    /// ```
    pub fn extract(
        &self,
        file: &str,
        selection: SelectionRange,
        context: u32,
    ) -> Result<Patch, PartialPrError> {
        let diff = GitCli::new(self.repo_path).diff(Some(file), context)?;

        if diff.trim().is_empty() {
            return Err(PartialPrError::NoChanges {
                file: file.to_string(),
            });
        }

        patch::extract_patch_for_selection(&diff, selection).ok_or_else(|| {
            PartialPrError::NothingSelected {
                file: file.to_string(),
                selection: selection.to_string(),
            }
        })
    }

    /// Move the requested changes onto a new branch and commit them there
    ///
    /// # Examples
    /// ```no_run
    /// # use git_partial_pr::{Config, PartialPr, PatchSource, PrRequest, SelectionRange};
    /// let config = Config {
    ///     username: Some("alice".to_string()),
    ///     ..Config::default()
    /// };
    /// let request = PrRequest {
    ///     source: PatchSource::Selection {
    ///         path: "src/parser.rs".to_string(),
    ///         range: SelectionRange::new(40, 44),
    ///     },
    ///     message: "Fix off-by-one in parser".to_string(),
    /// };
    /// let outcome = PartialPr::new(".").create(&config, &request).unwrap();
    /// println!("{}", outcome.branch);
    /// ```
    pub fn create(
        &self,
        config: &Config,
        request: &PrRequest,
    ) -> Result<Outcome, TransitionFailure> {
        Orchestrator::new(&GitCli::new(self.repo_path), config).run(request)
    }
}
