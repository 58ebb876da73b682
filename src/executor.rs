//! External process execution with live output streaming
//!
//! Every subcommand shells out through [`CommandRunner`]; the trait exists so
//! command flows can be exercised without spawning real child processes.
//!
//! A non-zero exit is an ordinary [`CommandResult`], never an `Err`. The only
//! errors are environment-level: the program could not be started at all
//! (not found, permission denied, invalid working directory).

use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

/// Outcome of one external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    /// Captured standard output, one newline-terminated entry per line, in
    /// arrival order.
    pub stdout: String,
    /// Captured standard error, same shape as `stdout`.
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A fully described external command, ready to execute.
#[derive(Debug, Clone)]
pub struct Invocation {
    argv: Vec<String>,
    working_dir: Option<PathBuf>,
    print_output: bool,
    env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            working_dir: None,
            print_output: true,
            env: Vec::new(),
        }
    }

    /// Run the child in `dir` instead of inheriting the current directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Capture output without echoing it to the terminal.
    pub fn quiet(mut self) -> Self {
        self.print_output = false;
        self
    }

    /// Add or overwrite one variable in the child's environment; everything
    /// else is inherited from this process unchanged.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Space-joined argument vector, for banners and error messages.
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

pub trait CommandRunner: Send + Sync {
    /// Execute to completion, returning the exit code and captured streams.
    ///
    /// Does not return until the child has exited and both output streams
    /// have been drained to end-of-stream, so the result is always complete.
    fn execute(&self, invocation: &Invocation) -> io::Result<CommandResult>;
}

/// Real runner: spawns the child and drains stdout/stderr concurrently,
/// echoing lines as they arrive when the invocation asks for it.
#[derive(Debug, Default)]
pub struct StreamingRunner;

impl CommandRunner for StreamingRunner {
    fn execute(&self, invocation: &Invocation) -> io::Result<CommandResult> {
        if invocation.argv.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        }

        debug!("executing: {}", invocation.display());
        if invocation.print_output {
            println!("Running: {}", invocation.display());
        }

        let mut command = Command::new(&invocation.argv[0]);
        command
            .args(&invocation.argv[1..])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        let mut child = command.spawn()?;

        // Each reader owns its capture buffer exclusively; the only
        // synchronization point is the join below, after which both streams
        // are known to be at end-of-stream.
        let echo = invocation.print_output;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_reader = thread::spawn(move || drain(stdout_pipe, echo, false));
        let stderr_reader = thread::spawn(move || drain(stderr_pipe, echo, true));

        let status = child.wait()?;
        let stdout = join_reader(stdout_reader)?;
        let stderr = join_reader(stderr_reader)?;

        // code() is None when the child was killed by a signal.
        let exit_code = status.code().unwrap_or(-1);
        debug!("exit code: {exit_code}");

        Ok(CommandResult {
            exit_code,
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read>(pipe: Option<R>, echo: bool, to_stderr: bool) -> String {
    let mut captured = String::new();
    let Some(pipe) = pipe else {
        return captured;
    };
    for line in BufReader::new(pipe).lines() {
        let Ok(line) = line else { break };
        if echo {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        captured.push_str(&line);
        captured.push('\n');
    }
    captured
}

fn join_reader(handle: thread::JoinHandle<String>) -> io::Result<String> {
    handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "output reader thread panicked"))
}
