//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Deploy and manage services on dev clusters
#[derive(Parser, Debug)]
#[command(name = "cdf-dev")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d, -dd, -ddd)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory to start config discovery from (default: cwd)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, push, and roll out a new image
    Deploy {
        /// Skip building the image
        #[arg(long)]
        skip_build: bool,
        /// Do not wait for the rollout to complete
        #[arg(long)]
        no_wait: bool,
    },

    /// Build and apply manifest changes to the cluster
    Apply {
        /// Show what would be applied without applying it
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage environment variables on the deployment
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Fetch logs from the deployment
    Logs {
        /// Follow log output
        #[arg(short, long)]
        follow: bool,
        /// Number of lines to show
        #[arg(long)]
        tail: Option<u32>,
    },

    /// Forward local ports to the deployment
    PortForward {
        /// Port mappings (local:remote, space separated); default from config
        ports: Option<String>,
    },

    /// Roll the deployment back to the previous revision
    Rollback {
        /// Do not wait for the rollback to complete
        #[arg(long)]
        no_wait: bool,
    },

    /// Debug tools: exec into the pod, test endpoints, show state
    Debug {
        /// Open an interactive shell
        #[arg(short, long)]
        shell: bool,
        /// Test an endpoint with curl (e.g. --curl /ping)
        #[arg(short, long)]
        curl: Option<String>,
        /// Command to execute in the pod
        command: Vec<String>,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Env subcommands
#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// Set environment variables and restart the deployment
    Set {
        /// Variables to set (KEY=VALUE)
        #[arg(required = true)]
        vars: Vec<String>,
        /// Do not restart pods after patching
        #[arg(long)]
        no_restart: bool,
    },

    /// Apply a named preset from the config
    Preset {
        /// Preset name
        name: String,
    },
}
