//! `rollback`: roll the deployment back to the previous revision

use tracing::instrument;

use super::{run_checked, ROLLOUT_TIMEOUT_ARG};
use crate::cli::output;
use crate::compose;
use crate::config::DevConfig;
use crate::errors::AppResult;
use crate::executor::{CommandRunner, Invocation};

#[instrument(skip(config, runner))]
pub fn run(config: &DevConfig, runner: &dyn CommandRunner, wait: bool) -> AppResult<()> {
    output::header(&format!("Rolling back {}...", config.service.name));

    let deployment = compose::deployment_ref(&config.service);
    let mut argv = compose::argv(["kubectl", "rollout", "undo"]);
    argv.push(deployment.clone());
    argv.extend(compose::scope_args(config));
    run_checked(runner, Invocation::new(argv), "rollback")?;

    if wait {
        output::step("Waiting for rollback to complete...");
        let mut argv = compose::argv(["kubectl", "rollout", "status"]);
        argv.push(deployment);
        argv.extend(compose::scope_args(config));
        argv.push(ROLLOUT_TIMEOUT_ARG.to_string());
        run_checked(runner, Invocation::new(argv), "rollback status")?;
    }

    output::success("Rollback complete");
    Ok(())
}
