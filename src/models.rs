//! Core data types for the plugin build orchestrator.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Value of `KDECI_INTERNAL_USE_CCACHE` that enables the compiler launcher.
pub const CCACHE_ENABLED_VALUE: &str = "True";

/// Inputs handed to the orchestrator by the CI environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Root of the job's persistent cache (`KDECI_CACHE_PATH`)
    pub cache_path: PathBuf,
    /// Passed through verbatim as `CMAKE_BUILD_TYPE`
    pub build_type: String,
    /// Route compilers through the configured launcher
    pub use_ccache: bool,
}

impl BuildSettings {
    /// Interpret the raw ccache flag; only the exact string `True` enables it.
    pub fn parse_ccache_flag(value: &str) -> bool {
        value == CCACHE_ENABLED_VALUE
    }
}

/// Directory names and toolchain choices that shape a build.
///
/// Every field has a default matching the CI layout, so an override file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// CMake generator passed with `-G`
    pub generator: String,
    /// Build tree, relative to the working directory
    pub build_dir: String,
    /// Install prefix, relative to the working directory
    pub install_dir: String,
    /// Plugin source tree, relative to the working directory
    pub source_dir: String,
    /// Download cache, relative to the cache path
    pub deps_cache_subdir: String,
    /// Program used as C/C++ compiler launcher when ccache is enabled
    pub compiler_launcher: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            generator: "Ninja".to_string(),
            build_dir: "_build_plugins".to_string(),
            install_dir: "_install".to_string(),
            source_dir: "3rdparty_plugins".to_string(),
            deps_cache_subdir: "krita-deps".to_string(),
            compiler_launcher: "ccache".to_string(),
        }
    }
}

/// Absolute paths used during one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub work_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_dir: PathBuf,
    pub source_dir: PathBuf,
    pub deps_cache_dir: PathBuf,
}

impl BuildLayout {
    /// Resolve all paths against the working directory and cache root.
    pub fn resolve(work_dir: &Path, cache_path: &Path, config: &LayoutConfig) -> Self {
        BuildLayout {
            work_dir: work_dir.to_path_buf(),
            build_dir: work_dir.join(&config.build_dir),
            install_dir: work_dir.join(&config.install_dir),
            source_dir: work_dir.join(&config.source_dir),
            deps_cache_dir: cache_path.join(&config.deps_cache_subdir),
        }
    }
}

/// Rendered commands of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub configure: String,
    pub build: String,
    pub jobs: usize,
}
