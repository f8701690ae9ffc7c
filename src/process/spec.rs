//! Launch description of a child process.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::{ServerConfig, WorkerConfig};
use crate::process::Role;

/// Everything needed to start one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub role: Role,
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessSpec {
    /// Spec for the background worker.
    pub fn worker(config: &WorkerConfig) -> Self {
        Self {
            role: Role::Worker,
            program: config.program.clone(),
            args: config.args.clone(),
            env: config.env.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    /// Spec for the foreground server, with `{host}`/`{port}` rendered.
    pub fn server(config: &ServerConfig) -> Self {
        Self {
            role: Role::Server,
            program: config.program.clone(),
            args: config.rendered_args(),
            env: config.env.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    /// The command line as a single display string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the tokio command. Stdout and stderr are inherited; stdin is
    /// inherited by the server and detached for the worker, the way a shell
    /// treats a `&` job.
    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        cmd.stdin(match self.role {
            Role::Worker => Stdio::null(),
            Role::Server => Stdio::inherit(),
        });

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}
