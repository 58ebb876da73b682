//! Command dispatch and shared execution helpers
//!
//! Every subcommand loads the configuration once, then issues its external
//! calls strictly sequentially, aborting at the first failure.

mod apply;
mod debug;
mod deploy;
mod env;
mod logs;
mod port_forward;
mod rollback;

use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::args::{Cli, Commands, EnvCommands};
use crate::config;
use crate::errors::{AppError, AppResult};
use crate::executor::{CommandResult, CommandRunner, Invocation, StreamingRunner};

/// Rollout-status timeout passed through to the cluster tool.
pub(crate) const ROLLOUT_TIMEOUT_ARG: &str = "--timeout=3m";

pub fn execute_command(cli: &Cli) -> AppResult<()> {
    // Completions need no project configuration.
    if let Commands::Completion { shell } = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let start_dir = start_dir(cli)?;
    let config = config::find_config(&start_dir)?.ok_or(AppError::ConfigMissing)?;
    let runner = StreamingRunner;

    match &cli.command {
        Commands::Deploy {
            skip_build,
            no_wait,
        } => deploy::run(&config, &runner, *skip_build, !*no_wait),
        Commands::Apply { dry_run } => apply::run(&config, &runner, &start_dir, *dry_run),
        Commands::Env { command } => match command {
            EnvCommands::Set { vars, no_restart } => {
                env::set(&config, &runner, vars, !*no_restart)
            }
            EnvCommands::Preset { name } => env::preset(&config, &runner, name),
        },
        Commands::Logs { follow, tail } => logs::run(&config, &runner, *follow, *tail),
        Commands::PortForward { ports } => port_forward::run(&config, &runner, ports.as_deref()),
        Commands::Rollback { no_wait } => rollback::run(&config, &runner, !*no_wait),
        Commands::Debug {
            shell,
            curl,
            command,
        } => debug::run(&config, &runner, *shell, curl.as_deref(), command),
        // Handled before config discovery above.
        Commands::Completion { .. } => Ok(()),
    }
}

fn start_dir(cli: &Cli) -> AppResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().map_err(|source| AppError::Io {
            context: "failed to determine current directory".to_string(),
            source,
        }),
    }
}

/// Execute and require success; a non-zero exit aborts the command with the
/// step name, exit code, and captured stderr.
pub(crate) fn run_checked(
    runner: &dyn CommandRunner,
    invocation: Invocation,
    step: &str,
) -> AppResult<CommandResult> {
    let result = run_started(runner, invocation)?;
    if !result.success() {
        return Err(AppError::CommandFailed {
            step: step.to_string(),
            exit_code: result.exit_code,
            stderr: result.stderr.trim_end().to_string(),
        });
    }
    Ok(result)
}

/// Execute, surfacing only spawn failures; the caller inspects the result.
pub(crate) fn run_started(
    runner: &dyn CommandRunner,
    invocation: Invocation,
) -> AppResult<CommandResult> {
    runner
        .execute(&invocation)
        .map_err(|source| AppError::ProcessStart {
            program: invocation.program().to_string(),
            source,
        })
}
