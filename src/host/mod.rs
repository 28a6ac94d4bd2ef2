//! Host application contract: actions, windows and localization.
//!
//! These are the pieces an extension sees of the image editor. The editor
//! owns every [`Action`]; extensions only create them through a [`Window`]
//! and bind a trigger callback.

use crate::error::ExtensionError;
use std::fmt;
use std::sync::Arc;

/// Menu the host places script actions under unless told otherwise.
pub const DEFAULT_MENU_LOCATION: &str = "tools/scripts";

/// Host-supplied localization function.
pub type Translator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Callback run synchronously when an action fires.
pub type TriggerCallback = Arc<dyn Fn() -> Result<(), ExtensionError> + Send + Sync>;

/// Translator for hosts without message catalogs.
pub fn identity_translator() -> Translator {
    Arc::new(|text: &str| text.to_string())
}

/// A named, labelled, triggerable command in the host's menus.
pub struct Action {
    id: String,
    text: String,
    tool_tip: String,
    menu_location: String,
    enabled: bool,
    trigger: Option<TriggerCallback>,
}

impl Action {
    pub fn new(id: &str, text: &str, menu_location: &str) -> Self {
        Action {
            id: id.to_string(),
            text: text.to_string(),
            tool_tip: String::new(),
            menu_location: menu_location.to_string(),
            enabled: true,
            trigger: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tool_tip(&self) -> &str {
        &self.tool_tip
    }

    pub fn menu_location(&self) -> &str {
        &self.menu_location
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn set_tool_tip(&mut self, tool_tip: &str) {
        self.tool_tip = tool_tip.to_string();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Bind the trigger callback. An action has at most one binding; binding
    /// again replaces the previous callback.
    pub fn connect_triggered(&mut self, callback: TriggerCallback) {
        if self.trigger.is_some() {
            log::debug!("[Host] Rebinding trigger for action '{}'", self.id);
        }
        self.trigger = Some(callback);
    }

    pub fn is_connected(&self) -> bool {
        self.trigger.is_some()
    }

    /// A clone of the bound callback, so it can be invoked without holding
    /// a borrow of the registry.
    pub fn trigger_handle(&self) -> Option<TriggerCallback> {
        self.trigger.clone()
    }

    /// Fire the action. Unbound actions do nothing.
    pub fn trigger(&self) -> Result<(), ExtensionError> {
        if !self.enabled {
            return Err(ExtensionError::ActionDisabled(self.id.clone()));
        }
        match &self.trigger {
            Some(callback) => callback(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("tool_tip", &self.tool_tip)
            .field("menu_location", &self.menu_location)
            .field("enabled", &self.enabled)
            .field("connected", &self.trigger.is_some())
            .finish()
    }
}

/// The active application window handed to extensions during registration.
pub trait Window {
    /// Create (or return the existing) action with this id.
    fn create_action(&mut self, id: &str, text: &str, menu_location: &str) -> &mut Action;

    /// Localization function for labels and tooltips.
    fn translator(&self) -> Translator;
}

/// Actions owned by the host for the lifetime of the application.
pub struct ActionRegistry {
    actions: Vec<Action>,
    translator: Translator,
}

impl ActionRegistry {
    pub fn new(translator: Translator) -> Self {
        ActionRegistry {
            actions: Vec::new(),
            translator,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.id.as_str()).collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new(identity_translator())
    }
}

impl Window for ActionRegistry {
    fn create_action(&mut self, id: &str, text: &str, menu_location: &str) -> &mut Action {
        match self.actions.iter().position(|a| a.id == id) {
            Some(index) => {
                log::debug!("[Host] Action '{}' already registered, updating label", id);
                let action = &mut self.actions[index];
                action.set_text(text);
                action
            }
            None => {
                log::info!("[Host] Registered action '{}' under {}", id, menu_location);
                self.actions.push(Action::new(id, text, menu_location));
                let last = self.actions.len() - 1;
                &mut self.actions[last]
            }
        }
    }

    fn translator(&self) -> Translator {
        Arc::clone(&self.translator)
    }
}
