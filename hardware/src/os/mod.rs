// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Host tools as seen by the inventory.
//!
//! Every external program (`ip`, `ethtool`, `lspci`, `modinfo`) is run through a
//! [`CommandRunner`], so the parsers can be exercised with canned output.
//! Calls are blocking and have no timeout.

use std::process::Command;

use tracing::debug;

#[cfg(any(test, feature = "testing"))]
mod canned;
#[cfg(any(test, feature = "testing"))]
pub use canned::CannedRunner;

/// What a finished command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    /// Captured standard output (lossily decoded).
    pub stdout: String,
    /// Captured standard error (lossily decoded).
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command which exited with status 0.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a command which exited with a non zero `status`.
    #[must_use]
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// True iff the command exited with status 0.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }
}

/// Errors which may occur while running a host tool.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The program could not be started (most often: it is not installed).
    #[error("unable to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The program ran but did not exit successfully.
    #[error("{program} exited with status {status:?}: {stderr}")]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

/// Narrow capability to run a program and collect its output.
pub trait CommandRunner {
    /// Run `program` with `args` to completion.
    ///
    /// A non zero exit status is not an error at this level.
    ///
    /// # Errors
    ///
    /// [`CommandError::Spawn`] if the program could not be started.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError>;

    /// Run `program` and return its standard output if it exited successfully.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Spawn`] if the program could not be started.
    /// - [`CommandError::Failed`] if it exited with a non zero status.
    fn stdout_of(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        let output = self.run(program, args)?;
        if output.succeeded() {
            Ok(output.stdout)
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs programs on the local host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        debug!("running {program} {}", args.join(" "));
        let output =
            Command::new(program)
                .args(args)
                .output()
                .map_err(|source| CommandError::Spawn {
                    program: program.to_string(),
                    source,
                })?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
