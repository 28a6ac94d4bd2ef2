//! Build Orchestration: 3-phase plugin build pipeline (Preparation -> Configuration -> Building).
//!
//! Protocol lines (`## RUNNING: ...`) go to stdout where the CI log parser
//! expects them; diagnostics go through the `log` facade.

pub mod command;
pub mod executor;
pub mod state;
pub mod workspace;

use std::path::Path;
use std::sync::Arc;

pub use command::{build_command, configure_command, launcher_env, ShellCommand};
pub use executor::{CommandRunner, DryRunRunner, ShellRunner};
pub use state::{BuildPhaseState, OrchestrationState};
pub use workspace::{ensure_cache_dir, reset_build_dir};

use crate::error::BuildError;
use crate::models::{BuildLayout, BuildReport, BuildSettings, LayoutConfig};

/// Printed before each external command.
pub const RUNNING_PREFIX: &str = "## RUNNING: ";
/// Printed when the configure step fails.
pub const CONFIGURE_FAILED_MESSAGE: &str = "## Failed to configure plugins";
/// Printed when the build step fails.
pub const BUILD_FAILED_MESSAGE: &str = "## Failed to build plugins";

/// One configure-then-build run of the plugin tree.
pub struct PluginBuild {
    settings: BuildSettings,
    layout: BuildLayout,
    config: LayoutConfig,
    runner: Arc<dyn CommandRunner>,
    jobs: usize,
    state: OrchestrationState,
}

impl PluginBuild {
    /// Create a run using every available processor.
    pub fn new(
        settings: BuildSettings,
        work_dir: &Path,
        config: LayoutConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let layout = BuildLayout::resolve(work_dir, &settings.cache_path, &config);
        PluginBuild {
            settings,
            layout,
            config,
            runner,
            jobs: num_cpus::get(),
            state: OrchestrationState::new(),
        }
    }

    /// Override the parallelism handed to the external tool.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn state(&self) -> &OrchestrationState {
        &self.state
    }

    /// Execute all phases. A failed step ends the run; nothing is retried.
    pub async fn run(&mut self) -> Result<BuildReport, BuildError> {
        match self.run_phases().await {
            Ok(report) => {
                crate::log_parsed!(
                    "[Orchestrator] Plugin build completed in {}s",
                    self.state.elapsed().num_seconds()
                );
                Ok(report)
            }
            Err(e) => {
                log::error!("[Orchestrator] {}", e);
                self.state.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_phases(&mut self) -> Result<BuildReport, BuildError> {
        ensure_cache_dir(&self.layout.deps_cache_dir)?;
        reset_build_dir(&self.layout.build_dir)?;

        self.advance(BuildPhaseState::Configuration)?;
        let configure = configure_command(&self.settings, &self.layout, &self.config);
        self.execute(&configure)
            .await
            .map_err(BuildError::ConfigurationFailed)?;

        self.advance(BuildPhaseState::Building)?;
        log::info!("[Orchestrator] Building with {} parallel jobs", self.jobs);
        let build = build_command(self.jobs, &self.settings, &self.config);
        self.execute(&build).await.map_err(BuildError::BuildFailed)?;

        self.advance(BuildPhaseState::Completed)?;
        Ok(BuildReport {
            configure: configure.render(),
            build: build.render(),
            jobs: self.jobs,
        })
    }

    fn advance(&mut self, next: BuildPhaseState) -> Result<(), BuildError> {
        let current = self.state.phase;
        self.state
            .transition_to(next)
            .map_err(|reason| phase_error(current, reason))
    }

    async fn execute(&self, command: &ShellCommand) -> Result<(), String> {
        println!("{}{}", RUNNING_PREFIX, command.render());
        self.runner
            .run(command, &self.layout.build_dir)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Error variant for a failure that happened while `phase` was active.
pub fn phase_error(phase: BuildPhaseState, reason: String) -> BuildError {
    match phase {
        BuildPhaseState::Preparation => BuildError::PreparationFailed(reason),
        BuildPhaseState::Configuration => BuildError::ConfigurationFailed(reason),
        BuildPhaseState::Building | BuildPhaseState::Completed | BuildPhaseState::Failed => {
            BuildError::BuildFailed(reason)
        }
    }
}

/// Message the binary prints for a failed run, if the phase has one.
pub fn failure_message(error: &BuildError) -> Option<&'static str> {
    match error {
        BuildError::ConfigurationFailed(_) => Some(CONFIGURE_FAILED_MESSAGE),
        BuildError::BuildFailed(_) => Some(BUILD_FAILED_MESSAGE),
        BuildError::PreparationFailed(_) => None,
    }
}
