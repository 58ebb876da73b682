//! `logs`: fetch or follow deployment logs

use tracing::instrument;

use super::run_checked;
use crate::cli::output;
use crate::compose;
use crate::config::{DevConfig, DEFAULT_LOG_TAIL};
use crate::errors::AppResult;
use crate::executor::{CommandRunner, Invocation};

#[instrument(skip(config, runner))]
pub fn run(
    config: &DevConfig,
    runner: &dyn CommandRunner,
    follow: bool,
    tail: Option<u32>,
) -> AppResult<()> {
    output::header(&format!("Fetching logs for {}...", config.service.name));

    let mut argv = compose::argv(["kubectl", "logs"]);
    argv.push(compose::deployment_ref(&config.service));
    argv.extend(compose::scope_args(config));
    argv.push(format!("--tail={}", tail.unwrap_or(DEFAULT_LOG_TAIL)));
    if follow {
        argv.push("-f".to_string());
    }

    run_checked(runner, Invocation::new(argv), "log fetch")?;
    Ok(())
}
