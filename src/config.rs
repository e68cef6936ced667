//! User settings, read from `~/.config/git-partial-pr/config.toml`.
//!
//! Every field is optional; a missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use error_set::error_set;
use serde::Deserialize;
use tracing::debug;

error_set! {
    /// Errors from loading the configuration file
    ConfigError := {
        #[display("Failed to read config file {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to parse config file {path}: {message}")]
        ParseFailed { path: String, message: String },
        #[display("Invalid value for `{field}`: {message}")]
        InvalidValue { field: String, message: String },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Prefix for generated branch names
    pub username: Option<String>,
    /// Remote that hosts the base branch and receives the push
    pub remote: String,
    /// Base branch used when the remote does not report its HEAD
    pub fallback_base_branch: String,
    /// Lines of context around each hunk in the extracted patch
    pub diff_context: u32,
    /// Push the new branch after committing
    pub push: bool,
    /// Delete the new branch if the transition fails before committing
    pub delete_branch_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            remote: "origin".to_string(),
            fallback_base_branch: "main".to_string(),
            diff_context: 3,
            push: true,
            delete_branch_on_failure: true,
        }
    }
}

impl Config {
    /// Load from `path` if given, otherwise from [`default_path`].
    ///
    /// An explicit path must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| read_failed(path, &e))?;
        let config = Self::parse(&contents).map_err(|e| match e {
            ConfigError::ParseFailed { message, .. } => ConfigError::ParseFailed {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML contents
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::ParseFailed {
            path: "<input>".to_string(),
            message: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.diff_context == 0 {
            return Err(ConfigError::InvalidValue {
                field: "diff_context".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "remote".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.fallback_base_branch.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fallback_base_branch".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// `<config_dir>/git-partial-pr/config.toml`, if the platform has a config dir
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("git-partial-pr").join("config.toml"))
}

fn read_failed(path: &Path, e: &io::Error) -> ConfigError {
    ConfigError::ReadFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.username, None);
        assert_eq!(config.remote, "origin");
        assert_eq!(config.fallback_base_branch, "main");
        assert_eq!(config.diff_context, 3);
        assert!(config.push);
        assert!(config.delete_branch_on_failure);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
username = "alice"
fallback_base_branch = "develop"
push = false
"#,
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                username: Some("alice".to_string()),
                fallback_base_branch: "develop".to_string(),
                push: false,
                ..Config::default()
            }
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = Config::parse("usrname = \"alice\"\n");
        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn zero_context_is_rejected() {
        let result = Config::parse("diff_context = 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field, .. }) if field == "diff_context"
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username = \"bob\"\nremote = \"upstream\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.username.as_deref(), Some("bob"));
        assert_eq!(config.remote, "upstream");
    }

    #[test]
    fn parse_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "push = \"sometimes\"").unwrap();

        match Config::load_from(file.path()) {
            Err(ConfigError::ParseFailed { path, .. }) => {
                assert_eq!(path, file.path().display().to_string());
            }
            other => panic!("expected ParseFailed, got {other:?}"),
        }
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }
}
