//! Error taxonomy for the build driver.
//!
//! Everything is carried through `anyhow::Result`; these typed errors sit at
//! the bottom of the chain so `main` can pick the right exit status.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for a target name that is not in the table.
pub const EXIT_UNKNOWN_TARGET: u8 = 2;

#[derive(Debug, Error)]
pub enum BuildError {
    /// An external program exited non-zero.
    #[error("'{program}' failed (exit code {code})")]
    ToolFailed { program: String, code: i32 },

    /// An external program could not be started at all.
    #[error("failed to execute '{program}'. Is it installed?")]
    ToolNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no such target: '{0}' (run 'bosua-build help' for the list)")]
    UnknownTarget(String),

    /// A copy or merge input does not exist.
    #[error("missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// The output directory is a path `clean` must never delete.
    #[error("refusing to clean {}: {reason}", .path.display())]
    UnsafeClean { path: PathBuf, reason: &'static str },

    #[error("{0} preflight check(s) failed")]
    PreflightFailed(usize),
}

impl BuildError {
    /// Process exit status this error maps to.
    pub fn exit_code(&self) -> u8 {
        match self {
            // Codes outside 1..=255 (signals, Windows NTSTATUS) collapse to 1.
            BuildError::ToolFailed { code, .. } => u8::try_from(*code)
                .ok()
                .filter(|c| *c != 0)
                .unwrap_or(1),
            BuildError::UnknownTarget(_) => EXIT_UNKNOWN_TARGET,
            _ => 1,
        }
    }
}

/// Exit status for an error chain: the first `BuildError` found decides,
/// anything else is a plain failure.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .map(BuildError::exit_code)
        .unwrap_or(1)
}
