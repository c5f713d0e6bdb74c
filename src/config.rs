//! Configuration management for bosua-build.
//!
//! Values come from, in increasing precedence: built-in defaults, a `.env`
//! file, environment variables, and CLI flags (applied by `main`).

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_IMAGE_NAME: &str = "bosua";
pub const DEFAULT_IMAGE_TAG: &str = "latest";
pub const DEFAULT_TARGET: &str = "release";

/// Environment variables read by [`Config::load`].
pub const ENV_KEYS: &[&str] = &[
    "BOSUA_DIST_DIR",
    "BOSUA_IMAGE_NAME",
    "BOSUA_IMAGE_TAG",
    "BOSUA_DEFAULT_TARGET",
    "BOSUA_WORKSPACE",
    "BOSUA_CARGO",
    "BOSUA_CONTAINER_ENGINE",
    "BOSUA_MERGE_TOOL",
];

/// Resolved build configuration. Immutable for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where artifacts are collected (default: dist)
    pub dist_dir: PathBuf,
    /// Container image repository name
    pub image_name: String,
    /// Container image tag
    pub image_tag: String,
    /// Target run when none is given on the command line
    pub default_target: String,
    /// The bosua cargo workspace that gets compiled (default: .)
    pub workspace: PathBuf,
    /// Compiler driver, e.g. `cargo` or `cross`
    pub cargo: String,
    /// Container engine, e.g. `docker` or `podman`
    pub container_engine: String,
    /// Universal binary merge tool
    pub merge_tool: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            image_tag: DEFAULT_IMAGE_TAG.to_string(),
            default_target: DEFAULT_TARGET.to_string(),
            workspace: PathBuf::from("."),
            cargo: "cargo".to_string(),
            container_engine: "docker".to_string(),
            merge_tool: "lipo".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    ///
    /// A missing `.env` is fine; variables already set in the environment
    /// win over the file.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => eprintln!("[WARN] Ignoring unreadable .env: {}", e),
        }

        let vars: HashMap<String, String> = ENV_KEYS
            .iter()
            .filter_map(|key| env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        Self::from_vars(&vars)
    }

    /// Build a config from a variable map, falling back to defaults.
    /// Empty values count as unset.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let defaults = Self::default();

        Self {
            dist_dir: get("BOSUA_DIST_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dist_dir),
            image_name: get("BOSUA_IMAGE_NAME").unwrap_or(defaults.image_name),
            image_tag: get("BOSUA_IMAGE_TAG").unwrap_or(defaults.image_tag),
            default_target: get("BOSUA_DEFAULT_TARGET").unwrap_or(defaults.default_target),
            workspace: get("BOSUA_WORKSPACE")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace),
            cargo: get("BOSUA_CARGO").unwrap_or(defaults.cargo),
            container_engine: get("BOSUA_CONTAINER_ENGINE").unwrap_or(defaults.container_engine),
            merge_tool: get("BOSUA_MERGE_TOOL").unwrap_or(defaults.merge_tool),
        }
    }

    /// Full image reference for a tag suffix, e.g. `bosua:latest-arm64`.
    pub fn image_ref(&self, suffix: &str) -> String {
        format!("{}:{}{}", self.image_name, self.image_tag, suffix)
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  BOSUA_DIST_DIR:         {}", self.dist_dir.display());
        println!("  BOSUA_IMAGE_NAME:       {}", self.image_name);
        println!("  BOSUA_IMAGE_TAG:        {}", self.image_tag);
        println!("  BOSUA_DEFAULT_TARGET:   {}", self.default_target);
        println!("  BOSUA_WORKSPACE:        {}", self.workspace.display());
        println!("  BOSUA_CARGO:            {}", self.cargo);
        println!("  BOSUA_CONTAINER_ENGINE: {}", self.container_engine);
        println!("  BOSUA_MERGE_TOOL:       {}", self.merge_tool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&HashMap::new());
        assert_eq!(config, Config::default());
        assert_eq!(config.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.default_target, "release");
        assert_eq!(config.image_ref(""), "bosua:latest");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(&vars(&[
            ("BOSUA_DIST_DIR", "/tmp/out"),
            ("BOSUA_IMAGE_NAME", "ghcr.io/me/bosua"),
            ("BOSUA_IMAGE_TAG", "v1.2.0"),
            ("BOSUA_DEFAULT_TARGET", "linux"),
            ("BOSUA_CONTAINER_ENGINE", "podman"),
        ]));

        assert_eq!(config.dist_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.default_target, "linux");
        assert_eq!(config.container_engine, "podman");
        assert_eq!(config.image_ref("-arm64"), "ghcr.io/me/bosua:v1.2.0-arm64");
        assert_eq!(config.cargo, "cargo");
    }

    #[test]
    fn test_empty_value_falls_back() {
        let config = Config::from_vars(&vars(&[("BOSUA_IMAGE_TAG", "  ")]));
        assert_eq!(config.image_tag, DEFAULT_IMAGE_TAG);
    }

    #[test]
    #[serial]
    fn test_load_reads_environment() {
        env::set_var("BOSUA_DIST_DIR", "release-out");
        env::set_var("BOSUA_MERGE_TOOL", "llvm-lipo");
        let config = Config::load();
        env::remove_var("BOSUA_DIST_DIR");
        env::remove_var("BOSUA_MERGE_TOOL");

        assert_eq!(config.dist_dir, PathBuf::from("release-out"));
        assert_eq!(config.merge_tool, "llvm-lipo");
    }
}
