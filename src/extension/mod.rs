//! Extension lifecycle as driven by the host application.
//!
//! The host constructs an extension, calls [`Extension::setup`], then
//! [`Extension::create_actions`] with the active window. After that the
//! extension only runs when one of its actions is triggered.

pub mod export_layers;

use crate::error::ExtensionError;
use crate::host::{ActionRegistry, Translator, Window};

pub use export_layers::{ExportLayersExtension, LayerExportDelegate};

/// A plugin loaded into the host application.
pub trait Extension: Send {
    /// Name used in host diagnostics.
    fn name(&self) -> &str;

    /// Called once after construction, before any window exists.
    fn setup(&mut self);

    /// Called once per load with the active window to register actions.
    fn create_actions(&mut self, window: &mut dyn Window);
}

/// Minimal host: owns the action registry and the loaded extensions.
pub struct PluginHost {
    registry: ActionRegistry,
    extensions: Vec<Box<dyn Extension>>,
}

impl PluginHost {
    pub fn new(translator: Translator) -> Self {
        PluginHost {
            registry: ActionRegistry::new(translator),
            extensions: Vec::new(),
        }
    }

    /// Run the load sequence for one extension: `setup`, then `create_actions`.
    pub fn load(&mut self, mut extension: Box<dyn Extension>) {
        log::info!("[Host] Loading extension '{}'", extension.name());
        extension.setup();
        extension.create_actions(&mut self.registry);
        self.extensions.push(extension);
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ActionRegistry {
        &mut self.registry
    }

    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Fire an action the way a menu click would.
    ///
    /// Errors from the extension are logged here and returned to the caller,
    /// which plays the part of the host's own error display.
    pub fn trigger(&self, action_id: &str) -> Result<(), ExtensionError> {
        let action = self
            .registry
            .get(action_id)
            .ok_or_else(|| ExtensionError::UnknownAction(action_id.to_string()))?;

        if !action.is_enabled() {
            return Err(ExtensionError::ActionDisabled(action_id.to_string()));
        }

        let Some(callback) = action.trigger_handle() else {
            log::debug!("[Host] Action '{}' has no binding", action_id);
            return Ok(());
        };

        callback().map_err(|e| {
            log::error!("[Host] Action '{}' failed: {}", action_id, e);
            e
        })
    }
}
