//! `debug`: exec into the pod, probe endpoints, show workload state
//!
//! Unlike the deployment flows, the probe variants relay failures instead of
//! aborting: a failing curl is itself useful diagnostic output.

use tracing::instrument;

use super::{run_checked, run_started};
use crate::cli::output;
use crate::compose;
use crate::config::DevConfig;
use crate::errors::AppResult;
use crate::executor::{CommandRunner, Invocation};

/// Format string handed to curl; curl expands the escapes itself.
const CURL_STATUS_FORMAT: &str = "\\n\\nHTTP Status: %{http_code}\\n";
const EVENT_TAIL: usize = 10;

#[instrument(skip(config, runner))]
pub fn run(
    config: &DevConfig,
    runner: &dyn CommandRunner,
    shell: bool,
    curl: Option<&str>,
    command: &[String],
) -> AppResult<()> {
    if shell {
        return open_shell(config, runner);
    }
    if let Some(path) = curl {
        return curl_endpoint(config, runner, path);
    }
    if !command.is_empty() {
        return exec_command(config, runner, command);
    }
    show_info(config, runner)
}

fn open_shell(config: &DevConfig, runner: &dyn CommandRunner) -> AppResult<()> {
    output::header(&format!("Opening shell in {}...", config.service.name));
    let mut argv = compose::argv(["kubectl", "exec", "-it"]);
    argv.push(compose::deployment_ref(&config.service));
    argv.extend(compose::scope_args(config));
    argv.extend(compose::argv(["--", "/bin/sh"]));
    run_checked(runner, Invocation::new(argv), "shell exec")?;
    Ok(())
}

fn curl_endpoint(config: &DevConfig, runner: &dyn CommandRunner, path: &str) -> AppResult<()> {
    output::header(&format!("Testing endpoint: {path}"));
    let url = format!("http://localhost:{}{}", compose::api_port(config), path);
    let mut argv = compose::argv(["kubectl", "exec"]);
    argv.push(compose::deployment_ref(&config.service));
    argv.extend(compose::scope_args(config));
    argv.extend(compose::argv(["--", "curl", "-s", "-w", CURL_STATUS_FORMAT]));
    argv.push(url);

    let result = run_started(runner, Invocation::new(argv).quiet())?;
    output::info(&result.stdout);
    if !result.success() {
        output::error(result.stderr.trim_end());
    }
    Ok(())
}

fn exec_command(
    config: &DevConfig,
    runner: &dyn CommandRunner,
    command: &[String],
) -> AppResult<()> {
    output::header(&format!("Executing: {}", command.join(" ")));
    let mut argv = compose::argv(["kubectl", "exec"]);
    argv.push(compose::deployment_ref(&config.service));
    argv.extend(compose::scope_args(config));
    argv.push("--".to_string());
    argv.extend(command.iter().cloned());

    let result = run_started(runner, Invocation::new(argv).quiet())?;
    output::info(&result.stdout);
    if !result.success() {
        output::error(result.stderr.trim_end());
    }
    Ok(())
}

fn show_info(config: &DevConfig, runner: &dyn CommandRunner) -> AppResult<()> {
    output::header(&format!("Debug info for {}", config.service.name));

    output::step("Pods:");
    let mut argv = compose::argv(["kubectl", "get", "pods"]);
    argv.extend(compose::scope_args(config));
    argv.push("-l".to_string());
    argv.push(format!("app={}", config.service.name));
    let pods = run_started(runner, Invocation::new(argv).quiet())?;
    output::info(&pods.stdout);

    output::step("Recent events:");
    let mut argv = compose::argv(["kubectl", "get", "events"]);
    argv.extend(compose::scope_args(config));
    argv.push("--field-selector".to_string());
    argv.push(format!(
        "involvedObject.name={}",
        config.service.deployment
    ));
    argv.extend(compose::argv(["--sort-by", ".lastTimestamp"]));
    let events = run_started(runner, Invocation::new(argv).quiet())?;
    let lines: Vec<&str> = events.stdout.lines().collect();
    let tail_start = lines.len().saturating_sub(EVENT_TAIL);
    for line in &lines[tail_start..] {
        output::info(line);
    }

    output::step("Quick commands:");
    output::detail("cdf-dev debug --shell              # open a shell");
    output::detail("cdf-dev debug --curl /ping         # test an endpoint");
    output::detail("cdf-dev debug curl localhost:8080  # run a command");
    Ok(())
}
