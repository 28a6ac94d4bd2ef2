//! Configuration module for the plugin build orchestrator.
//!
//! The CI job hands its inputs over through environment variables. Reading
//! goes through the [`Environment`] trait so the same code path serves the
//! real process environment and in-memory maps in tests.
//!
//! # Module Structure
//!
//! - `loader`: Loads optional layout overrides from a JSON file

pub mod loader;

use crate::error::ConfigError;
use crate::models::{BuildSettings, LayoutConfig};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Root of the job's persistent cache.
pub const CACHE_PATH_VAR: &str = "KDECI_CACHE_PATH";
/// Build type passed through to CMake.
pub const BUILD_TYPE_VAR: &str = "KDECI_BUILD_TYPE";
/// Compiler launcher toggle, enabled only by the literal `True`.
pub const USE_CCACHE_VAR: &str = "KDECI_INTERNAL_USE_CCACHE";
/// Optional path to a JSON file with [`LayoutConfig`] overrides.
pub const CONFIG_FILE_VAR: &str = "KDECI_PLUGINS_CONFIG";
/// When set, commands are printed but not executed.
pub const DRY_RUN_VAR: &str = "KDECI_DRY_RUN";
/// Log verbosity for the console logger.
pub const LOG_LEVEL_VAR: &str = "KDECI_LOG_LEVEL";

/// Source of configuration variables.
///
/// Values are raw OS strings: a cache path only has to be a valid path, not
/// valid UTF-8.
pub trait Environment {
    /// Read a variable without consuming it.
    fn get(&self, key: &str) -> Option<OsString>;

    /// Read a variable and remove it so child processes do not inherit it.
    fn take(&mut self, key: &str) -> Option<OsString>;
}

/// The real process environment.
///
/// `take` mutates the process environment, so it must only be called while
/// the process is still single-threaded (before the async runtime starts).
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }

    fn take(&mut self, key: &str) -> Option<OsString> {
        let value = std::env::var_os(key)?;
        std::env::remove_var(key);
        Some(value)
    }
}

/// In-memory environment, used by tests and embedders.
#[derive(Debug, Default, Clone)]
pub struct MapEnvironment {
    vars: HashMap<String, OsString>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl AsRef<OsStr>) -> Self {
        self.vars.insert(key.to_string(), value.as_ref().to_os_string());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).cloned()
    }

    fn take(&mut self, key: &str) -> Option<OsString> {
        self.vars.remove(key)
    }
}

fn take_required(env: &mut dyn Environment, key: &str) -> Result<OsString, ConfigError> {
    env.take(key)
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

/// Read a variable that is only meaningful as text, such as a log level.
pub fn get_utf8(env: &dyn Environment, key: &str) -> Option<String> {
    env.get(key).and_then(|value| value.into_string().ok())
}

/// Consume the three required CI variables.
///
/// All of them are read before any filesystem work happens, so a malformed
/// environment fails the run without touching the build tree. The cache path
/// is taken as-is: an empty value puts the dependency cache under the
/// working directory, and non-UTF-8 bytes are kept.
pub fn load_settings(env: &mut dyn Environment) -> Result<BuildSettings, ConfigError> {
    let cache_path = take_required(env, CACHE_PATH_VAR)?;
    let use_ccache = take_required(env, USE_CCACHE_VAR)?;
    let build_type = take_required(env, BUILD_TYPE_VAR)?
        .into_string()
        .map_err(|raw| ConfigError::InvalidValue {
            name: BUILD_TYPE_VAR.to_string(),
            reason: format!("not valid UTF-8: {}", raw.to_string_lossy()),
        })?;

    let settings = BuildSettings {
        cache_path: PathBuf::from(cache_path),
        build_type,
        use_ccache: use_ccache
            .to_str()
            .map(BuildSettings::parse_ccache_flag)
            .unwrap_or(false),
    };

    log::debug!(
        "[Config] cache_path={} build_type={} use_ccache={}",
        settings.cache_path.display(),
        settings.build_type,
        settings.use_ccache
    );

    Ok(settings)
}

/// Layout overrides from `KDECI_PLUGINS_CONFIG`, or the CI defaults.
pub fn load_layout_config(env: &dyn Environment) -> Result<LayoutConfig, ConfigError> {
    match env.get(CONFIG_FILE_VAR) {
        Some(path) => {
            let path = PathBuf::from(path);
            log::info!("[Config] Loading layout overrides from {}", path.display());
            loader::load_layout_from_file(&path)
        }
        None => Ok(LayoutConfig::default()),
    }
}

pub fn dry_run_requested(env: &dyn Environment) -> bool {
    env.get(DRY_RUN_VAR).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> MapEnvironment {
        MapEnvironment::new()
            .with(CACHE_PATH_VAR, "/cache")
            .with(BUILD_TYPE_VAR, "RelWithDebInfo")
            .with(USE_CCACHE_VAR, "True")
    }

    #[test]
    fn test_load_settings_consumes_variables() {
        let mut env = full_env();
        let settings = load_settings(&mut env).unwrap();

        assert_eq!(settings.cache_path, PathBuf::from("/cache"));
        assert_eq!(settings.build_type, "RelWithDebInfo");
        assert!(settings.use_ccache);
        assert!(!env.contains(CACHE_PATH_VAR));
        assert!(!env.contains(BUILD_TYPE_VAR));
        assert!(!env.contains(USE_CCACHE_VAR));
    }

    #[test]
    fn test_missing_variable_is_fatal() {
        for missing in [CACHE_PATH_VAR, BUILD_TYPE_VAR, USE_CCACHE_VAR] {
            let mut env = full_env();
            env.take(missing);
            match load_settings(&mut env) {
                Err(ConfigError::MissingVariable(name)) => assert_eq!(name, missing),
                other => panic!("Expected missing {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn test_ccache_other_values_disable() {
        let mut env = full_env().with(USE_CCACHE_VAR, "False");
        assert!(!load_settings(&mut env).unwrap().use_ccache);
    }

    #[test]
    fn test_empty_cache_path_is_accepted() {
        let mut env = full_env().with(CACHE_PATH_VAR, "");
        let settings = load_settings(&mut env).unwrap();

        assert_eq!(settings.cache_path, PathBuf::new());
        assert_eq!(
            settings.cache_path.join("krita-deps"),
            PathBuf::from("krita-deps")
        );
        assert!(!env.contains(CACHE_PATH_VAR));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_cache_path_is_kept() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/cache/\xffdeps");
        let mut env = full_env().with(CACHE_PATH_VAR, raw);
        let settings = load_settings(&mut env).unwrap();

        assert_eq!(settings.cache_path.as_os_str(), raw);
        assert!(!env.contains(CACHE_PATH_VAR));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_build_type_is_invalid() {
        use std::os::unix::ffi::OsStrExt;

        let mut env = full_env().with(BUILD_TYPE_VAR, OsStr::from_bytes(b"Rel\xff"));
        match load_settings(&mut env) {
            Err(ConfigError::InvalidValue { name, .. }) => assert_eq!(name, BUILD_TYPE_VAR),
            other => panic!("Expected invalid build type, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_ccache_flag_disables() {
        use std::os::unix::ffi::OsStrExt;

        let mut env = full_env().with(USE_CCACHE_VAR, OsStr::from_bytes(b"True\xff"));
        assert!(!load_settings(&mut env).unwrap().use_ccache);
    }

    #[test]
    fn test_get_utf8() {
        let env = MapEnvironment::new().with(LOG_LEVEL_VAR, "debug");
        assert_eq!(get_utf8(&env, LOG_LEVEL_VAR).as_deref(), Some("debug"));
        assert_eq!(get_utf8(&env, DRY_RUN_VAR), None);
    }

    #[test]
    fn test_layout_defaults_without_override() {
        let env = MapEnvironment::new();
        assert_eq!(load_layout_config(&env).unwrap(), LayoutConfig::default());
        assert!(!dry_run_requested(&env));
    }

    #[test]
    fn test_dry_run_flag() {
        let env = MapEnvironment::new().with(DRY_RUN_VAR, "1");
        assert!(dry_run_requested(&env));
    }
}
