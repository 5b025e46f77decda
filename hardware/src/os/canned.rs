// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A [`CommandRunner`] answering from a fixed table.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{CommandError, CommandOutput, CommandRunner};

/// Replays canned outputs keyed by the full command line (`program arg1 arg2 ...`).
///
/// Command lines with no canned output behave like a missing program.
/// Every invocation is recorded so tests can assert what was (not) run.
#[derive(Debug, Default)]
pub struct CannedRunner {
    outputs: HashMap<String, CommandOutput>,
    calls: RefCell<Vec<String>>,
}

impl CannedRunner {
    /// An empty runner: every command fails to spawn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command_line` with a successful run printing `stdout`.
    #[must_use]
    pub fn with_stdout(mut self, command_line: &str, stdout: &str) -> Self {
        self.outputs
            .insert(command_line.to_string(), CommandOutput::success(stdout));
        self
    }

    /// Answer `command_line` with an arbitrary output.
    #[must_use]
    pub fn with_output(mut self, command_line: &str, output: CommandOutput) -> Self {
        self.outputs.insert(command_line.to_string(), output);
        self
    }

    /// Command lines run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for CannedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(command_line.clone());
        self.outputs
            .get(&command_line)
            .cloned()
            .ok_or_else(|| CommandError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no canned output for {command_line:?}"),
                ),
            })
    }
}
