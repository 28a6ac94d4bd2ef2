//! Export Layers extension.
//!
//! Registers one `export_layers` action. Each trigger builds a fresh
//! delegate and runs its `initialize`, which owns the actual export UI.
//! Overlapping triggers are rejected while a run is in progress.

use super::Extension;
use crate::error::ExtensionError;
use crate::host::{TriggerCallback, Window, DEFAULT_MENU_LOCATION};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub const ACTION_ID: &str = "export_layers";
pub const ACTION_TEXT: &str = "Export Layers";
pub const ACTION_TOOL_TIP: &str = "Plugin to export layers from a document.";

/// The helper that performs the user-facing export feature.
pub trait LayerExportDelegate: Send {
    fn initialize(&mut self) -> Result<(), ExtensionError>;
}

/// Builds a new delegate for every trigger.
pub type DelegateFactory = Arc<dyn Fn() -> Box<dyn LayerExportDelegate> + Send + Sync>;

struct ExportLayersState {
    factory: DelegateFactory,
    busy: AtomicBool,
    delegate: Mutex<Option<Box<dyn LayerExportDelegate>>>,
    runs: AtomicU64,
}

impl ExportLayersState {
    fn delegate_slot(&self) -> MutexGuard<'_, Option<Box<dyn LayerExportDelegate>>> {
        // A panicking delegate must not wedge the action for the rest of the session.
        match self.delegate.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn initialize(&self) -> Result<(), ExtensionError> {
        let _busy = BusyGuard::acquire(&self.busy)
            .ok_or_else(|| ExtensionError::AlreadyRunning(ACTION_ID.to_string()))?;

        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("[ExportLayers] Starting run #{}", run);

        let mut delegate = (self.factory)();
        match delegate.initialize() {
            Ok(()) => {
                *self.delegate_slot() = Some(delegate);
                Ok(())
            }
            Err(e) => {
                log::warn!("[ExportLayers] Run #{} failed: {}", run, e);
                *self.delegate_slot() = None;
                Err(e)
            }
        }
    }
}

/// Clears the busy flag when the run ends, on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Extension that wires the `export_layers` action to a delegate factory.
pub struct ExportLayersExtension {
    state: Arc<ExportLayersState>,
}

impl ExportLayersExtension {
    pub fn new(factory: DelegateFactory) -> Self {
        ExportLayersExtension {
            state: Arc::new(ExportLayersState {
                factory,
                busy: AtomicBool::new(false),
                delegate: Mutex::new(None),
                runs: AtomicU64::new(0),
            }),
        }
    }

    /// Trigger entry point: create a delegate and run it.
    pub fn initialize(&self) -> Result<(), ExtensionError> {
        self.state.initialize()
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy.load(Ordering::Acquire)
    }

    pub fn has_delegate(&self) -> bool {
        self.state.delegate_slot().is_some()
    }

    /// Number of runs started so far.
    pub fn runs(&self) -> u64 {
        self.state.runs.load(Ordering::SeqCst)
    }

    fn trigger_callback(&self) -> TriggerCallback {
        let state = Arc::clone(&self.state);
        Arc::new(move || state.initialize())
    }
}

impl Extension for ExportLayersExtension {
    fn name(&self) -> &str {
        ACTION_ID
    }

    fn setup(&mut self) {}

    fn create_actions(&mut self, window: &mut dyn Window) {
        let tr = window.translator();
        let callback = self.trigger_callback();
        let action = window.create_action(ACTION_ID, &tr(ACTION_TEXT), DEFAULT_MENU_LOCATION);
        action.set_tool_tip(&tr(ACTION_TOOL_TIP));
        action.connect_triggered(callback);
    }
}
