//! Output directory operations: copying artifacts, sizes, listing, checksums.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::BuildError;

/// Checksum file written next to the artifacts.
pub const CHECKSUM_FILE: &str = "SHA256SUMS";

/// An artifact found in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the output directory, with `/` separators.
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Fail with `MissingArtifact` unless `path` is an existing file.
pub fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(BuildError::MissingArtifact(path.to_path_buf()).into());
    }
    Ok(())
}

/// Copy a built binary to its artifact path, replacing any previous one.
pub fn copy_artifact(from: &Path, to: &Path) -> Result<u64> {
    require_file(from)?;
    let bytes = fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    tracing::debug!(from = %from.display(), to = %to.display(), bytes, "copied artifact");
    Ok(bytes)
}

/// Size in bytes of an existing artifact.
pub fn artifact_size(path: &Path) -> Result<u64> {
    require_file(path)?;
    let meta = fs::metadata(path)
        .with_context(|| format!("Failed to read size of {}", path.display()))?;
    Ok(meta.len())
}

/// Human-readable byte count, binary units.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Files under `dir`, sorted by name. The checksum file is not an artifact.
///
/// A missing directory yields an empty list.
pub fn list_artifacts(dir: &Path) -> Result<Vec<Artifact>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name == CHECKSUM_FILE {
            continue;
        }
        let size = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?
            .len();
        artifacts.push(Artifact {
            name,
            path: entry.path().to_path_buf(),
            size,
        });
    }
    Ok(artifacts)
}

/// Print an artifact table.
pub fn print_artifacts(dir: &Path, artifacts: &[Artifact]) {
    println!("\nArtifacts in {}:", dir.display());
    if artifacts.is_empty() {
        println!("  (none)");
        return;
    }
    let width = artifacts.iter().map(|a| a.name.len()).max().unwrap_or(0);
    for artifact in artifacts {
        println!(
            "  {:<width$}  {:>10}",
            artifact.name,
            human_size(artifact.size),
            width = width
        );
    }
}

/// SHA256 of a file, lowercase hex.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {} for hashing", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write `SHA256SUMS` in `sha256sum` format for every artifact in `dir`.
pub fn write_checksums(dir: &Path) -> Result<PathBuf> {
    let mut content = String::new();
    for artifact in list_artifacts(dir)? {
        let hash = sha256_file(&artifact.path)?;
        content.push_str(&format!("{}  {}\n", hash, artifact.name));
    }
    let out = dir.join(CHECKSUM_FILE);
    fs::write(&out, content).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(out)
}
