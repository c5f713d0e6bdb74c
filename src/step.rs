//! Build steps: the units a target's sequence is made of.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::process::Cmd;
use crate::target::Target;

/// One unit of work in a target's sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print a status line.
    Status(String),
    /// Invoke an external program.
    Tool(Cmd),
    /// Create a directory (and parents) if absent.
    EnsureDir(PathBuf),
    /// Copy a built binary to its fixed artifact path.
    Copy { from: PathBuf, to: PathBuf },
    /// Merge per-architecture binaries into one universal binary.
    Merge {
        tool: String,
        inputs: Vec<PathBuf>,
        output: PathBuf,
    },
    /// Print the size of an artifact.
    ReportSize(PathBuf),
    /// Remove a directory recursively; absent is fine.
    RemoveDir(PathBuf),
    /// Run another target's full sequence.
    Run(Target),
    /// List the files of a directory with their sizes.
    ListArtifacts(PathBuf),
    /// Write `SHA256SUMS` for the files of a directory.
    WriteChecksums(PathBuf),
    /// Print the usage text.
    Usage,
    /// Print a final success line.
    Done(String),
}

impl Step {
    /// The merge invocation for a `Merge` step.
    pub fn merge_cmd(tool: &str, inputs: &[PathBuf], output: &Path) -> Cmd {
        let mut cmd = Cmd::new(tool).arg("-create").arg("-output").arg_path(output);
        for input in inputs {
            cmd = cmd.arg_path(input);
        }
        cmd
    }

    /// External program this step invokes, if any.
    pub fn program(&self) -> Option<&str> {
        match self {
            Step::Tool(cmd) => Some(cmd.program()),
            Step::Merge { tool, .. } => Some(tool),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Status(text) => write!(f, "echo {:?}", text),
            Step::Tool(cmd) => write!(f, "{}", cmd),
            Step::EnsureDir(dir) => write!(f, "mkdir -p {}", dir.display()),
            Step::Copy { from, to } => write!(f, "cp {} {}", from.display(), to.display()),
            Step::Merge {
                tool,
                inputs,
                output,
            } => write!(f, "{}", Step::merge_cmd(tool, inputs, output)),
            Step::ReportSize(path) => write!(f, "size {}", path.display()),
            Step::RemoveDir(dir) => write!(f, "rm -rf {}", dir.display()),
            Step::Run(target) => write!(f, "run {}", target),
            Step::ListArtifacts(dir) => write!(f, "list {}", dir.display()),
            Step::WriteChecksums(dir) => write!(f, "sha256 {}/*", dir.display()),
            Step::Usage => write!(f, "usage"),
            Step::Done(text) => write!(f, "echo {:?}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_display() {
        let step = Step::Merge {
            tool: "lipo".into(),
            inputs: vec!["a/bosua".into(), "b/bosua".into()],
            output: "dist/bosua-universal".into(),
        };
        assert_eq!(
            step.to_string(),
            "lipo -create -output dist/bosua-universal a/bosua b/bosua"
        );
        assert_eq!(step.program(), Some("lipo"));
    }

    #[test]
    fn test_fs_steps_have_no_program() {
        assert_eq!(Step::EnsureDir("dist".into()).program(), None);
        assert_eq!(Step::Run(Target::Linux).to_string(), "run linux");
    }
}
