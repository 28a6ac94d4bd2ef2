//! Preparation: dependency cache and build tree setup.

use crate::error::BuildError;
use std::fs;
use std::path::Path;

/// Create the dependency download cache; an existing directory is left alone.
pub fn ensure_cache_dir(path: &Path) -> Result<(), BuildError> {
    if path.is_dir() {
        log::debug!("[Workspace] Dependency cache present: {}", path.display());
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| {
        BuildError::PreparationFailed(format!(
            "Failed to create dependency cache {}: {}",
            path.display(),
            e
        ))
    })?;
    log::info!("[Workspace] Created dependency cache: {}", path.display());
    Ok(())
}

/// Remove the build tree if present and recreate it empty.
///
/// Every configure starts from a clean tree; stale CMake caches from an
/// earlier run never survive this call.
pub fn reset_build_dir(path: &Path) -> Result<(), BuildError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            log::info!("[Workspace] Removing previous build tree: {}", path.display());
            fs::remove_dir_all(path).map_err(|e| prep_error("remove", path, e))?;
        }
        Ok(_) => {
            log::warn!(
                "[Workspace] Build path is not a directory, replacing it: {}",
                path.display()
            );
            fs::remove_file(path).map_err(|e| prep_error("remove", path, e))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(prep_error("inspect", path, e)),
    }

    fs::create_dir_all(path).map_err(|e| prep_error("create", path, e))?;
    log::info!("[Workspace] Build tree ready: {}", path.display());
    Ok(())
}

fn prep_error(action: &str, path: &Path, e: std::io::Error) -> BuildError {
    BuildError::PreparationFailed(format!(
        "Failed to {} build directory {}: {}",
        action,
        path.display(),
        e
    ))
}
