//! `port-forward`: forward local ports to the deployment
//!
//! The forward session is a long-lived child; interruption is left to the
//! operating system's default signal delivery to the foreground process.

use tracing::instrument;

use super::run_checked;
use crate::cli::output;
use crate::compose;
use crate::config::DevConfig;
use crate::errors::AppResult;
use crate::executor::{CommandRunner, Invocation};

#[instrument(skip(config, runner))]
pub fn run(config: &DevConfig, runner: &dyn CommandRunner, ports: Option<&str>) -> AppResult<()> {
    let mappings = compose::port_forward_mappings(config.ports.as_ref(), ports);

    output::header(&format!("Port forwarding {}...", config.service.name));
    output::detail(&format!("ports: {}", mappings.join(" ")));
    output::detail("press Ctrl+C to stop");

    let mut argv = compose::argv(["kubectl", "port-forward"]);
    argv.push(compose::deployment_ref(&config.service));
    argv.extend(compose::scope_args(config));
    argv.extend(mappings);

    run_checked(runner, Invocation::new(argv), "port forwarding")?;
    Ok(())
}
