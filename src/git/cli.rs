use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::{ApplyMode, Git, StashEntry, StatusSummary};
use crate::GitCommandError;

/// [`Git`] implemented by running the `git` binary against one repository
#[derive(Debug, Clone, Copy)]
pub struct GitCli<'a> {
    repo_path: &'a str,
}

impl<'a> GitCli<'a> {
    pub fn new(repo_path: &'a str) -> Self {
        Self { repo_path }
    }

    /// Run `git -C <repo> <args>` and return stdout
    fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<String, GitCommandError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let command = args.join(" ");
        debug!(repo = self.repo_path, %command, "running git");

        let output = Command::new("git")
            .arg("-C")
            .arg(self.repo_path)
            .args(&args)
            .output()
            .map_err(|e| GitCommandError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // `apply --3way` and `pull` report some failures on stdout
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(GitCommandError::ExitError {
                command,
                stderr: detail.to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            command,
            message: e.to_string(),
        })
    }
}

impl Git for GitCli<'_> {
    fn diff(&self, path: Option<&str>, context: u32) -> Result<String, GitCommandError> {
        let unified = format!("-U{context}");
        let mut args = vec!["diff", "--no-ext-diff", "--no-color", unified.as_str()];
        if let Some(path) = path {
            args.extend(["--", path]);
        }
        self.run(&args)
    }

    fn diff_cached(&self, context: u32) -> Result<String, GitCommandError> {
        let unified = format!("-U{context}");
        self.run(&[
            "diff",
            "--cached",
            "--no-ext-diff",
            "--no-color",
            unified.as_str(),
        ])
    }

    fn apply(&self, patch: &Path, mode: ApplyMode) -> Result<(), GitCommandError> {
        let patch = patch.display().to_string();
        let mut args = vec!["apply"];
        args.extend(mode.args());
        args.push(&patch);
        self.run(&args).map(drop)
    }

    fn status(&self) -> Result<StatusSummary, GitCommandError> {
        self.run(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .map(|out| StatusSummary::parse(&out))
    }

    fn commit(&self, message: &str, no_verify: bool) -> Result<(), GitCommandError> {
        let mut args = vec!["commit", "-q", "-m", message];
        if no_verify {
            args.push("--no-verify");
        }
        self.run(&args).map(drop)
    }

    fn stash_push(&self, label: &str) -> Result<(), GitCommandError> {
        self.run(&["stash", "push", "-q", "--include-untracked", "-m", label])
            .map(drop)
    }

    fn stash_list(&self) -> Result<Vec<StashEntry>, GitCommandError> {
        self.run(&["stash", "list", "--format=%gd%x00%H%x00%gs"])
            .map(|out| StashEntry::parse_list(&out))
    }

    fn stash_pop(&self, reference: &str) -> Result<(), GitCommandError> {
        self.run(&["stash", "pop", "-q", reference]).map(drop)
    }

    fn reset_hard(&self, rev: &str) -> Result<(), GitCommandError> {
        self.run(&["reset", "-q", "--hard", rev]).map(drop)
    }

    fn reset_soft(&self, rev: &str) -> Result<(), GitCommandError> {
        self.run(&["reset", "-q", "--soft", rev]).map(drop)
    }

    fn reset_index(&self) -> Result<(), GitCommandError> {
        self.run(&["reset", "-q"]).map(drop)
    }

    fn checkout(&self, branch: &str) -> Result<(), GitCommandError> {
        self.run(&["checkout", "-q", branch]).map(drop)
    }

    fn checkout_new_branch(&self, branch: &str) -> Result<(), GitCommandError> {
        self.run(&["checkout", "-q", "-b", branch]).map(drop)
    }

    fn delete_branch(&self, branch: &str) -> Result<(), GitCommandError> {
        self.run(&["branch", "-q", "-D", branch]).map(drop)
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitCommandError> {
        self.run(&["pull", "-q", "--ff-only", remote, branch]).map(drop)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitCommandError> {
        self.run(&["push", "-q", "-u", remote, branch]).map(drop)
    }

    fn remote_show(&self, remote: &str) -> Result<String, GitCommandError> {
        self.run(&["remote", "show", remote])
    }

    fn remote_url(&self, remote: &str) -> Result<String, GitCommandError> {
        self.run(&["remote", "get-url", remote])
            .map(|out| out.trim().to_string())
    }

    fn current_branch(&self) -> Result<String, GitCommandError> {
        self.run(&["symbolic-ref", "--short", "HEAD"])
            .map(|out| out.trim().to_string())
    }
}
