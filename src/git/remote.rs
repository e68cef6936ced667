//! Remote introspection: default branch lookup and hosting URLs.

use error_set::error_set;
use tracing::{debug, warn};

use super::Git;

error_set! {
    /// Errors from interpreting remote metadata
    RemoteParseError := {
        #[display("Unrecognised remote URL '{url}': expected git@host:org/repo.git or https://host/org/repo.git")]
        UnrecognizedUrl { url: String },
    }
}

/// Hosting coordinates parsed from a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    pub host: String,
    pub org: String,
    pub repo: String,
}

impl RemoteRepo {
    /// Parse an SSH-style (`git@host:org/repo.git`) or HTTPS-style
    /// (`https://host/org/repo.git`) remote URL.
    pub fn parse(url: &str) -> Result<Self, RemoteParseError> {
        let url = url.trim();
        let unrecognized = || RemoteParseError::UnrecognizedUrl {
            url: url.to_string(),
        };

        let (host, path) = if let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        {
            let (authority, path) = rest.split_once('/').ok_or_else(unrecognized)?;
            // drop any `user[:token]@` credentials
            let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
            (host, path)
        } else if let Some((user_host, path)) = url.split_once(':') {
            let (_, host) = user_host.split_once('@').ok_or_else(unrecognized)?;
            (host, path)
        } else {
            return Err(unrecognized());
        };

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let (org, repo) = path.split_once('/').ok_or_else(unrecognized)?;

        if host.is_empty() || org.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(unrecognized());
        }

        Ok(Self {
            host: host.to_string(),
            org: org.to_string(),
            repo: repo.to_string(),
        })
    }

    /// The hosting provider's "open a pull request" page for `branch`
    pub fn new_pull_request_url(&self, branch: &str) -> String {
        format!(
            "https://{}/{}/{}/pull/new/{}",
            self.host, self.org, self.repo, branch
        )
    }
}

/// Extract the `HEAD branch:` value from `git remote show` output.
///
/// Returns `None` when the line is absent or the remote's HEAD is unknown.
pub fn parse_head_branch(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("HEAD branch:"))
        .map(str::trim)
        .filter(|branch| !branch.is_empty() && *branch != "(unknown)")
        .map(str::to_string)
}

/// Resolve the branch a pull request should target, falling back to
/// `fallback` when the remote cannot be queried or its answer cannot be read.
pub fn resolve_base_branch(git: &impl Git, remote: &str, fallback: &str) -> String {
    match git.remote_show(remote) {
        Ok(output) => match parse_head_branch(&output) {
            Some(branch) => {
                debug!(remote, %branch, "resolved remote default branch");
                branch
            }
            None => {
                warn!(remote, fallback, "remote did not report a HEAD branch");
                fallback.to_string()
            }
        },
        Err(e) => {
            warn!(remote, fallback, error = %e, "could not query remote default branch");
            fallback.to_string()
        }
    }
}
