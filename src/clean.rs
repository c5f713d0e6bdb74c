//! Build artifact cleaning.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path};

use crate::error::BuildError;

/// Remove the output directory. Returns whether anything was removed.
///
/// An absent path is not an error. A plain file or symlink at the path is
/// removed as-is. Directories that contain the current directory or the
/// workspace are refused before anything is deleted.
pub fn clean_outputs(output_dir: &Path, workspace: &Path) -> Result<bool> {
    let meta = match fs::symlink_metadata(output_dir) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!("Nothing to clean ({} does not exist).", output_dir.display());
            return Ok(false);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect {}", output_dir.display()))
        }
    };

    if !meta.is_dir() {
        println!("Removing {}...", output_dir.display());
        fs::remove_file(output_dir)
            .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
        println!("Clean complete.");
        return Ok(true);
    }

    ensure_safe_to_remove(output_dir, workspace)?;

    println!("Removing {}...", output_dir.display());
    fs::remove_dir_all(output_dir)
        .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
    println!("Clean complete.");
    Ok(true)
}

fn refuse(path: &Path, reason: &'static str) -> anyhow::Error {
    BuildError::UnsafeClean {
        path: path.to_path_buf(),
        reason,
    }
    .into()
}

/// Refuse `.`, `/`, the current directory, the workspace, and any of their
/// ancestors.
fn ensure_safe_to_remove(output_dir: &Path, workspace: &Path) -> Result<()> {
    if output_dir
        .components()
        .all(|c| matches!(c, Component::CurDir))
    {
        return Err(refuse(output_dir, "it is the current directory"));
    }

    let target = output_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", output_dir.display()))?;

    if target.parent().is_none() {
        return Err(refuse(output_dir, "it is the filesystem root"));
    }

    let cwd = env::current_dir()
        .and_then(|d| d.canonicalize())
        .context("Failed to resolve the current directory")?;
    if cwd.starts_with(&target) {
        return Err(refuse(output_dir, "it contains the current directory"));
    }

    // An unresolvable workspace cannot be inside the output directory.
    if let Ok(workspace) = workspace.canonicalize() {
        if workspace.starts_with(&target) {
            return Err(refuse(output_dir, "it contains the workspace"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn assert_refused(result: Result<bool>) {
        let err = result.unwrap_err();
        let build_err = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(build_err, BuildError::UnsafeClean { .. }), "{:#}", err);
    }

    /// A fake workspace with a manifest, plus a workspace path to pass in.
    fn workspace(tmp: &TempDir) -> std::path::PathBuf {
        let ws = tmp.path().join("bosua");
        fs::create_dir_all(&ws).unwrap();
        fs::write(ws.join("Cargo.toml"), "[workspace]\n").unwrap();
        ws
    }

    /// Run `f` with the current directory set to `dir`.
    fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        let out = f();
        env::set_current_dir(previous).unwrap();
        out
    }

    #[test]
    fn test_clean_removes_tree() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let dist = tmp.path().join("dist");
        fs::create_dir_all(dist.join("nested")).unwrap();
        fs::write(dist.join("nested/bosua"), "bin").unwrap();

        assert!(clean_outputs(&dist, &ws).unwrap());
        assert!(!dist.exists());
        assert!(ws.join("Cargo.toml").exists());
    }

    #[test]
    fn test_clean_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        assert!(!clean_outputs(&tmp.path().join("dist"), &ws).unwrap());
    }

    #[test]
    fn test_clean_removes_plain_file() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let dist = tmp.path().join("dist");
        fs::write(&dist, "not a directory").unwrap();

        assert!(clean_outputs(&dist, &ws).unwrap());
        assert!(!dist.exists());
    }

    #[test]
    #[serial]
    fn test_clean_refuses_dot() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        in_dir(&ws, || assert_refused(clean_outputs(Path::new("."), Path::new("."))));
        in_dir(&ws, || assert_refused(clean_outputs(Path::new("./."), &ws)));
        assert!(ws.join("Cargo.toml").exists());
    }

    #[test]
    #[serial]
    fn test_clean_refuses_current_dir() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        let other = tmp.path().join("elsewhere");
        fs::create_dir_all(&other).unwrap();
        fs::write(other.join("keep"), "x").unwrap();

        in_dir(&other, || assert_refused(clean_outputs(&other, &ws)));
        assert!(other.join("keep").exists());
    }

    #[test]
    fn test_clean_refuses_root() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        assert_refused(clean_outputs(Path::new("/"), &ws));
    }

    #[test]
    fn test_clean_refuses_workspace() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        assert_refused(clean_outputs(&ws, &ws));
        assert!(ws.join("Cargo.toml").exists());
    }

    #[test]
    fn test_clean_refuses_workspace_ancestor() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        assert_refused(clean_outputs(tmp.path(), &ws));
        assert_refused(clean_outputs(&ws.join(".."), &ws));
        assert!(ws.join("Cargo.toml").exists());
    }
}
