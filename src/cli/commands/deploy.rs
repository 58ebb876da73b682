//! `deploy`: build, push, and roll out a new image

use tracing::instrument;

use super::{run_checked, ROLLOUT_TIMEOUT_ARG};
use crate::cli::output;
use crate::compose;
use crate::config::DevConfig;
use crate::errors::AppResult;
use crate::executor::{CommandRunner, Invocation};

#[instrument(skip(config, runner))]
pub fn run(
    config: &DevConfig,
    runner: &dyn CommandRunner,
    skip_build: bool,
    wait: bool,
) -> AppResult<()> {
    output::header(&format!(
        "Deploying {} to {}",
        config.service.name, config.cluster.context
    ));

    if !skip_build {
        output::step("Building image...");
        run_checked(
            runner,
            Invocation::new(["bazelisk", "build", config.build.target.as_str()]),
            "build",
        )?;
    }

    output::step("Pushing image...");
    let push = run_checked(
        runner,
        Invocation::new(["bazelisk", "run", config.build.push_target.as_str()]),
        "push",
    )?;

    let digest = compose::extract_image_digest(&push.stdout)?;
    output::action("Image digest", &digest);

    output::step("Updating deployment...");
    let deployment = compose::deployment_ref(&config.service);
    let mut argv = compose::argv(["kubectl", "set", "image"]);
    argv.push(deployment.clone());
    argv.push(format!("{}={}", config.service.deployment, digest));
    argv.extend(compose::scope_args(config));
    run_checked(runner, Invocation::new(argv), "deployment update")?;

    if wait {
        output::step("Waiting for rollout...");
        let mut argv = compose::argv(["kubectl", "rollout", "status"]);
        argv.push(deployment);
        argv.extend(compose::scope_args(config));
        argv.push(ROLLOUT_TIMEOUT_ARG.to_string());
        run_checked(runner, Invocation::new(argv), "rollout")?;
    }

    output::success("Deployment complete");
    Ok(())
}
