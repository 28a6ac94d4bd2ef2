//! Build phase tracking.
//!
//! - `BuildPhaseState`: discrete phases of one orchestrator run
//! - `OrchestrationState`: current phase plus timing and failure detail

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Discrete states in the plugin build lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildPhaseState {
    /// Cache directory and clean build tree
    Preparation,

    /// External tool configure step
    Configuration,

    /// External tool build-all step
    Building,

    Completed,

    Failed,
}

impl BuildPhaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPhaseState::Preparation => "preparation",
            BuildPhaseState::Configuration => "configuration",
            BuildPhaseState::Building => "building",
            BuildPhaseState::Completed => "completed",
            BuildPhaseState::Failed => "failed",
        }
    }

    /// Phases reachable from this one. Runs are never retried, so `Failed`
    /// and `Completed` are terminal.
    pub fn valid_next_phases(&self) -> Vec<BuildPhaseState> {
        match self {
            BuildPhaseState::Preparation => {
                vec![BuildPhaseState::Configuration, BuildPhaseState::Failed]
            }
            BuildPhaseState::Configuration => {
                vec![BuildPhaseState::Building, BuildPhaseState::Failed]
            }
            BuildPhaseState::Building => vec![BuildPhaseState::Completed, BuildPhaseState::Failed],
            BuildPhaseState::Completed | BuildPhaseState::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, next: BuildPhaseState) -> bool {
        self.valid_next_phases().contains(&next)
    }
}

/// Snapshot of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationState {
    pub phase: BuildPhaseState,
    pub started_at: DateTime<Local>,
    pub last_update: DateTime<Local>,
    /// Phase that was active when the run failed
    pub failed_in: Option<BuildPhaseState>,
    pub error: Option<String>,
}

impl OrchestrationState {
    pub fn new() -> Self {
        let now = Local::now();
        OrchestrationState {
            phase: BuildPhaseState::Preparation,
            started_at: now,
            last_update: now,
            failed_in: None,
            error: None,
        }
    }

    /// Move to `next`, returning an error for transitions the lifecycle forbids.
    pub fn transition_to(&mut self, next: BuildPhaseState) -> Result<(), String> {
        if !self.phase.can_transition_to(next) {
            return Err(format!(
                "Invalid phase transition: {} -> {}",
                self.phase.as_str(),
                next.as_str()
            ));
        }

        crate::log_parsed!(
            "[Orchestrator] [PHASE] {} -> {}",
            self.phase.as_str(),
            next.as_str()
        );
        self.phase = next;
        self.last_update = Local::now();
        Ok(())
    }

    /// Record a failure in the current phase.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.phase.can_transition_to(BuildPhaseState::Failed) {
            self.failed_in = Some(self.phase);
            self.phase = BuildPhaseState::Failed;
        }
        self.error = Some(error.into());
        self.last_update = Local::now();
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            BuildPhaseState::Completed | BuildPhaseState::Failed
        )
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.last_update - self.started_at
    }
}

impl Default for OrchestrationState {
    fn default() -> Self {
        Self::new()
    }
}
