// SPDX-License-Identifier: MIT

//! Spawns one filter invocation and maps its exit into the shared
//! [`JobOutcome`] taxonomy (spec §4.4 "Filter runner").

use crate::env::FilterEnvironment;
use crate::error::FilterError;
use crate::expand::{expand_token, ExpansionFields};
use crate::tokenize::tokenize;
use lpd_core::{FilterStatus, JobOutcome};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Builds and runs one filter invocation: argv assembly, environment,
/// stdio wiring, and stderr status-line streaming (spec §4.4, §4.5
/// "Status handling").
pub struct FilterRunner {
    title: String,
    env: FilterEnvironment,
    cwd: Option<PathBuf>,
}

impl FilterRunner {
    pub fn new(title: impl Into<String>, env: FilterEnvironment) -> Self {
        Self {
            title: title.into(),
            env,
            cwd: None,
        }
    }

    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    /// Tokenize `command` and `$`-expand each token against `fields`
    /// (spec §4.4 "argv built by tokenizing the filter command, then
    /// `$`-expanding each token").
    pub fn build_argv(command: &str, fields: &ExpansionFields) -> Vec<String> {
        tokenize(command).iter().flat_map(|token| expand_token(token, fields)).collect()
    }

    /// Spawn the filter with `stdin`/`stdout` remapped to the given file
    /// descriptors and stderr piped for status-line extraction, then wait
    /// for it to exit.
    pub async fn run(
        &self,
        command: &str,
        fields: &ExpansionFields,
        stdin: Stdio,
        stdout: Stdio,
        on_status: impl Fn(FilterStatus) + Send + 'static,
    ) -> Result<JobOutcome, FilterError> {
        let argv = Self::build_argv(command, fields);
        let (program, args) = argv.split_first().ok_or(FilterError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args).envs(self.env.to_map()).stdin(stdin).stdout(stdout).stderr(Stdio::piped()).kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(title = %self.title, program = %program, "spawning filter");
        let mut child = cmd.spawn().map_err(|source| FilterError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let stderr = child.stderr.take().ok_or_else(|| FilterError::Spawn {
            command: command.to_string(),
            source: std::io::Error::other("stderr was not piped"),
        })?;
        let title = self.title.clone();
        let mut lines = BufReader::new(stderr).lines();
        let status_task = tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                on_status(FilterStatus::new(title.clone(), line));
            }
        });

        let status = child.wait().await.map_err(|source| FilterError::Spawn {
            command: command.to_string(),
            source,
        })?;
        let _ = status_task.await;

        let outcome = exit_outcome(&status);
        tracing::debug!(title = %self.title, ?outcome, "filter exited");
        Ok(outcome)
    }
}

#[cfg(unix)]
fn exit_outcome(status: &std::process::ExitStatus) -> JobOutcome {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => JobOutcome::from_exit_code(code),
        None => JobOutcome::from_signal(status.signal().unwrap_or(0)),
    }
}

#[cfg(not(unix))]
fn exit_outcome(status: &std::process::ExitStatus) -> JobOutcome {
    JobOutcome::from_exit_code(status.code().unwrap_or(1))
}
