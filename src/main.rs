use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use kdeci_plugins::config::{self, ProcessEnvironment};
use kdeci_plugins::orchestrator::{
    failure_message, CommandRunner, DryRunRunner, PluginBuild, ShellRunner,
};
use kdeci_plugins::{log_info, BuildError, BuildReport};

fn main() -> ExitCode {
    let mut env = ProcessEnvironment;
    kdeci_plugins::initialize_logging(config::get_utf8(&env, config::LOG_LEVEL_VAR).as_deref());
    log_info!("kdeci_plugins {} build-plugins starting", kdeci_plugins::VERSION);

    // The CI variables are removed from the process environment here, while
    // no runtime worker threads exist yet.
    match prepare(&mut env).and_then(execute) {
        Ok(report) => {
            log_info!("Plugins configured and built ({} jobs)", report.jobs);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(message) = e.downcast_ref::<BuildError>().and_then(failure_message) {
                println!("{}", message);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}

fn prepare(env: &mut ProcessEnvironment) -> anyhow::Result<PluginBuild> {
    let settings = config::load_settings(env).context("CI environment is incomplete")?;
    let layout_config =
        config::load_layout_config(env).context("Failed to load layout overrides")?;
    let work_dir = std::env::current_dir().context("Cannot determine working directory")?;

    let runner: Arc<dyn CommandRunner> = if config::dry_run_requested(env) {
        log::warn!("{} set: commands will be printed, not executed", config::DRY_RUN_VAR);
        Arc::new(DryRunRunner)
    } else {
        Arc::new(ShellRunner::new())
    };

    Ok(PluginBuild::new(settings, &work_dir, layout_config, runner))
}

fn execute(mut build: PluginBuild) -> anyhow::Result<BuildReport> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = runtime.block_on(build.run())?;
    Ok(report)
}
