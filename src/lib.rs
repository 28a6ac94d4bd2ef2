//! KDE CI plugin tooling
//!
//! Two independent pieces share this crate:
//! - **orchestrator**: configures and builds the third-party plugin tree with
//!   CMake, driven by the CI job's environment (`build-plugins` binary)
//! - **extension**: the host-application extension contract and the
//!   Export Layers extension that plugs into it
//!
//! Supporting modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Build settings and layout types
//! - **config**: Environment and override-file configuration
//! - **logging**: Console backend for the `log` facade
//! - **host**: Actions, windows and localization as seen by extensions

// Core foundational modules
pub mod error;
pub mod models;

pub mod config;
pub mod logging;

// Build orchestration: workspace preparation, command construction, execution
pub mod orchestrator;

// Host application contract and extensions
pub mod extension;
pub mod host;

// Re-export the log crate for macro usage (`log_info!`, `log_parsed!`)
pub use log;

pub use logging::initialize_logging;

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{BuildError, ConfigError, ExtensionError, RunError};

pub use models::{BuildLayout, BuildReport, BuildSettings, LayoutConfig};

pub use config::{Environment, MapEnvironment, ProcessEnvironment};

pub use orchestrator::{
    build_command, configure_command, BuildPhaseState, CommandRunner, DryRunRunner,
    PluginBuild, ShellCommand, ShellRunner,
};

pub use extension::{Extension, ExportLayersExtension, LayerExportDelegate, PluginHost};

pub use host::{Action, ActionRegistry, Translator, Window};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
