//! Error taxonomy and process exit-code mapping
//!
//! Nothing here is retried or silently recovered: the first failure aborts
//! the running subcommand and surfaces with the failing step, its exit code,
//! and captured stderr where available.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{ConfigError, CONFIG_FILE_NAME};
use crate::exitcode;

/// Everything that can abort a subcommand invocation.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("no {file} found in the current or any parent directory; create one next to your service definition", file = CONFIG_FILE_NAME)]
    ConfigMissing,

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The external program could not be launched at all. Distinct from a
    /// launched program exiting non-zero.
    #[error("failed to start '{program}': {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A launched program exited non-zero.
    #[error("{step} failed with exit code {exit_code}{detail}", detail = stderr_note(.stderr))]
    CommandFailed {
        step: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("no image digest (@sha256:) found in push output")]
    DigestNotFound,

    #[error("invalid environment variable '{0}': expected KEY=VALUE")]
    InvalidEnvVar(String),

    #[error("preset '{0}' not found in {file}", file = CONFIG_FILE_NAME)]
    PresetNotFound(String),

    #[error("rendered manifest not found: {file}", file = .0.display())]
    ManifestNotFound(PathBuf),

    #[error("no build workspace root above {dir} (expected WORKSPACE, WORKSPACE.bazel, or MODULE.bazel)", dir = .0.display())]
    WorkspaceRootNotFound(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for subcommand operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Process exit status for this failure; zero is reserved for full
    /// success.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ConfigMissing | AppError::Config(_) => exitcode::CONFIG,
            AppError::ProcessStart { .. } => exitcode::UNAVAILABLE,
            AppError::CommandFailed { .. } => exitcode::SOFTWARE,
            AppError::DigestNotFound
            | AppError::InvalidEnvVar(_)
            | AppError::PresetNotFound(_) => exitcode::DATAERR,
            AppError::ManifestNotFound(_) | AppError::WorkspaceRootNotFound(_) => {
                exitcode::NOINPUT
            }
            AppError::Io { .. } => exitcode::IOERR,
        }
    }
}

fn stderr_note(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", stderr.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_command_failure_with_stderr_then_message_carries_it() {
        let err = AppError::CommandFailed {
            step: "push".to_string(),
            exit_code: 1,
            stderr: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "push failed with exit code 1: denied");
    }

    #[test]
    fn given_command_failure_without_stderr_then_message_clean() {
        let err = AppError::CommandFailed {
            step: "build".to_string(),
            exit_code: 2,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "build failed with exit code 2");
    }

    #[test]
    fn given_errors_then_exit_codes_map_to_sysexits() {
        assert_eq!(AppError::ConfigMissing.exit_code(), exitcode::CONFIG);
        assert_eq!(AppError::DigestNotFound.exit_code(), exitcode::DATAERR);
    }
}
