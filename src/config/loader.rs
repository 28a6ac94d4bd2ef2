//! Layout override file loader.

use crate::error::ConfigError;
use crate::models::LayoutConfig;
use std::fs;
use std::path::Path;

/// Load layout overrides from a JSON file.
pub fn load_layout_from_file(path: &Path) -> Result<LayoutConfig, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config: LayoutConfig = serde_json::from_str(&content).map_err(ConfigError::InvalidJson)?;
    validate_layout(&config)?;

    Ok(config)
}

/// Validate config path (.json extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            name: super::CONFIG_FILE_VAR.to_string(),
            reason: "configuration path cannot be empty".to_string(),
        });
    }

    match path.extension() {
        Some(ext) if ext == "json" => Ok(()),
        Some(ext) => Err(ConfigError::InvalidValue {
            name: super::CONFIG_FILE_VAR.to_string(),
            reason: format!(
                "configuration file must have .json extension, got .{}",
                ext.to_string_lossy()
            ),
        }),
        None => Err(ConfigError::InvalidValue {
            name: super::CONFIG_FILE_VAR.to_string(),
            reason: "configuration file must have .json extension".to_string(),
        }),
    }
}

/// Reject overrides that would leave a command without a required word.
fn validate_layout(config: &LayoutConfig) -> Result<(), ConfigError> {
    let fields = [
        ("generator", &config.generator),
        ("build_dir", &config.build_dir),
        ("install_dir", &config.install_dir),
        ("source_dir", &config.source_dir),
        ("deps_cache_subdir", &config.deps_cache_subdir),
        ("compiler_launcher", &config.compiler_launcher),
    ];

    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: name.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_layout_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("layout.json");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, r#"{{ "build_dir": "_out", "compiler_launcher": "sccache" }}"#).unwrap();

        let config = load_layout_from_file(&path).expect("Failed to load layout");
        assert_eq!(config.build_dir, "_out");
        assert_eq!(config.compiler_launcher, "sccache");
        assert_eq!(config.generator, "Ninja");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_layout_from_file(&temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_layout_from_file(&path),
            Err(ConfigError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_wrong_extension() {
        let result = validate_config_path(Path::new("layout.toml"));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_empty_override_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("layout.json");
        fs::write(&path, r#"{ "generator": "  " }"#).unwrap();
        match load_layout_from_file(&path) {
            Err(ConfigError::InvalidValue { name, .. }) => assert_eq!(name, "generator"),
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
