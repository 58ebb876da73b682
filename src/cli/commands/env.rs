//! `env set` / `env preset`: patch environment variables onto the deployment

use tracing::instrument;

use super::run_checked;
use crate::cli::output;
use crate::compose;
use crate::config::DevConfig;
use crate::errors::{AppError, AppResult};
use crate::executor::{CommandRunner, Invocation};

#[instrument(skip(config, runner))]
pub fn set(
    config: &DevConfig,
    runner: &dyn CommandRunner,
    vars: &[String],
    restart: bool,
) -> AppResult<()> {
    output::header(&format!(
        "Setting environment variables on {}",
        config.service.name
    ));

    for var in vars {
        let (key, value) = compose::split_env_var(var)?;
        output::detail(&format!("setting {key}={value}"));
        patch_env_var(config, runner, key, value)?;
    }

    if restart {
        restart_deployment(config, runner)?;
    }

    output::success("Environment variables updated");
    Ok(())
}

#[instrument(skip(config, runner))]
pub fn preset(config: &DevConfig, runner: &dyn CommandRunner, name: &str) -> AppResult<()> {
    let preset = config
        .env_presets
        .get(name)
        .ok_or_else(|| AppError::PresetNotFound(name.to_string()))?;

    output::header(&format!("Applying preset: {name}"));

    for var in preset {
        let (key, value) = compose::split_env_var(var)?;
        output::detail(&format!("setting {key}={value}"));
        patch_env_var(config, runner, key, value)?;
    }

    restart_deployment(config, runner)?;
    output::success("Preset applied");
    Ok(())
}

fn patch_env_var(
    config: &DevConfig,
    runner: &dyn CommandRunner,
    key: &str,
    value: &str,
) -> AppResult<()> {
    let patch = compose::env_patch_json(key, value);
    let mut argv = compose::argv(["kubectl", "patch", "deployment"]);
    argv.push(config.service.deployment.clone());
    argv.extend(compose::scope_args(config));
    argv.push("--type=json".to_string());
    argv.push("-p".to_string());
    argv.push(patch);
    run_checked(
        runner,
        Invocation::new(argv).quiet(),
        &format!("setting {key}"),
    )?;
    Ok(())
}

fn restart_deployment(config: &DevConfig, runner: &dyn CommandRunner) -> AppResult<()> {
    output::step("Restarting deployment...");
    let mut argv = compose::argv(["kubectl", "rollout", "restart"]);
    argv.push(compose::deployment_ref(&config.service));
    argv.extend(compose::scope_args(config));
    run_checked(runner, Invocation::new(argv), "restart")?;
    Ok(())
}
