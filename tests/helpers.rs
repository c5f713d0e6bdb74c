//! Shared test utilities for bosua-build tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use bosua_build::process::RecordingRunner;
use bosua_build::target::{
    Platform, LINUX_ARM64, LINUX_X86_64, MACOS_ARM64, MACOS_HOST, MACOS_X86_64, WINDOWS_X86_64,
};
use bosua_build::{Config, Orchestrator};

/// Every platform a target can compile for.
pub const ALL_PLATFORMS: [Platform; 6] = [
    MACOS_HOST,
    MACOS_X86_64,
    MACOS_ARM64,
    LINUX_X86_64,
    LINUX_ARM64,
    WINDOWS_X86_64,
];

/// Test environment with a fake bosua workspace and an output directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Fake bosua cargo workspace
    pub workspace: PathBuf,
    /// Output directory (not created up front)
    pub dist: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let workspace = temp_dir.path().join("bosua");
        let dist = temp_dir.path().join("dist");
        fs::create_dir_all(&workspace).expect("Failed to create workspace dir");

        Self {
            _temp_dir: temp_dir,
            workspace,
            dist,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            dist_dir: self.dist.clone(),
            workspace: self.workspace.clone(),
            ..Config::default()
        }
    }

    pub fn orchestrator(&self, runner: RecordingRunner) -> Orchestrator<RecordingRunner> {
        Orchestrator::new(self.config(), runner)
    }

    /// Write a fake compiled binary where cargo would leave it.
    pub fn fake_build(&self, platform: Platform, content: &str) -> PathBuf {
        let path = platform.built_binary(&self.config());
        fs::create_dir_all(path.parent().expect("binary path has a parent"))
            .expect("Failed to create target dir");
        fs::write(&path, content).expect("Failed to write fake binary");
        path
    }

    /// Fake compiled binaries for every platform.
    pub fn fake_all_builds(&self) {
        for platform in ALL_PLATFORMS {
            self.fake_build(platform, platform.bin);
        }
    }

    pub fn artifact(&self, name: &str) -> PathBuf {
        self.dist.join(name)
    }
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.is_file(), "Expected file to exist: {}", path.display());
}

/// Assert that a path does not exist.
pub fn assert_not_exists(path: &Path) {
    assert!(!path.exists(), "Expected path to be absent: {}", path.display());
}

/// Program and first argument of every recorded call, e.g. `cargo build`.
pub fn call_heads(runner: &RecordingRunner) -> Vec<String> {
    runner
        .calls()
        .iter()
        .map(|c| match c.get_args().first() {
            Some(first) => format!("{} {}", c.program(), first),
            None => c.program().to_string(),
        })
        .collect()
}

/// The `--target` value of every recorded compile, in order.
pub fn compiled_triples(runner: &RecordingRunner) -> Vec<String> {
    runner
        .calls()
        .iter()
        .filter(|c| c.get_args().first().map(String::as_str) == Some("build"))
        .filter_map(|c| {
            let args = c.get_args();
            args.iter()
                .position(|a| a == "--target")
                .and_then(|i| args.get(i + 1))
                .cloned()
        })
        .collect()
}
