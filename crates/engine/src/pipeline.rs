// SPDX-License-Identifier: MIT

//! Print pipeline: streams one job's data files through their filters and
//! out to a device (spec §4.5).
//!
//! **Open Question resolved:** spec §4.5 step 2 offers two legal ways to
//! handle an `of` filter across multiple data files — suspend it with
//! `\031\001` and resume with `SIGCONT`, or tear it down and recreate it
//! per file. This implementation always takes the tear-down-and-recreate
//! path: `of`, like a per-format filter, runs once per data file. This
//! keeps every filter invocation a simple "bytes in, bytes out" stage
//! compatible with [`lpd_adapters::DeviceWriter`]'s buffered `write_all`,
//! at the cost of not keeping one `of` process warm across a multi-file
//! job the way the suspend/resume path would.

use crate::error::EngineError;
use lpd_adapters::{DeviceWriter, StatusSink};
use lpd_core::{FilterStatus, JobOutcome};
use lpd_filter::{ExpansionFields, FilterEnvironment, FilterError, FilterRunner};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const FORM_FEED: u8 = 0x0c;

/// One data file queued for this print job.
pub struct DataFileSpec {
    pub bytes: Vec<u8>,
    /// Filter command for this file's format (`if` by default, or a
    /// format-specific filter); `None` streams the file raw.
    pub format_filter: Option<String>,
    pub copies: u32,
}

/// Static parts of the pipeline assembled around the data files (spec
/// §4.5 steps 1, 4, 5).
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub leader: Option<Vec<u8>>,
    pub banner: Option<Vec<u8>>,
    pub banner_last: bool,
    pub suppress_header: bool,
    pub trailer: Option<Vec<u8>>,
    pub form_feed_on_open: bool,
    pub form_feed_on_close: bool,
    pub ff_separator: bool,
    /// Output filter applied after each file's format filter, if any.
    pub of_filter: Option<String>,
}

pub struct PrintPipeline<D, S> {
    device: D,
    status_sink: S,
    env: FilterEnvironment,
}

impl<D: DeviceWriter, S: StatusSink> PrintPipeline<D, S> {
    pub fn new(device: D, status_sink: S, env: FilterEnvironment) -> Self {
        Self { device, status_sink, env }
    }

    /// Run the full pipeline. `fields_for(index)` builds the `$`-expansion
    /// fields for the data file at `index` (job number, format letter,
    /// etc. are caller-known context, not pipeline state).
    pub async fn run(
        &self,
        config: &PipelineConfig,
        data_files: &[DataFileSpec],
        fields_for: impl Fn(usize) -> ExpansionFields,
    ) -> Result<JobOutcome, EngineError> {
        let opening = assemble_opening(config);
        if !opening.is_empty() {
            self.device.write_all(&opening).await?;
        }

        for (index, file) in data_files.iter().enumerate() {
            let fields = fields_for(index);
            for _copy in 0..file.copies.max(1) {
                let mut stage = file.bytes.clone();
                if let Some(command) = &file.format_filter {
                    stage = self.run_stage(command, &fields, stage, "if").await?;
                }
                if let Some(command) = &config.of_filter {
                    stage = self.run_stage(command, &fields, stage, "of").await?;
                }
                self.device.write_all(&stage).await?;
            }
            if config.ff_separator && index + 1 < data_files.len() {
                self.device.write_all(&[FORM_FEED]).await?;
            }
        }

        let trailer = assemble_trailer(config);
        if !trailer.is_empty() {
            self.device.write_all(&trailer).await?;
        }

        self.device.drain().await?;
        Ok(JobOutcome::Success)
    }

    /// Run one filter stage: spawn it, feed `input` on stdin, collect
    /// stdout, and post each stderr line as a status update (spec §4.5
    /// "Status handling").
    async fn run_stage(
        &self,
        command: &str,
        fields: &ExpansionFields,
        input: Vec<u8>,
        title: &str,
    ) -> Result<Vec<u8>, EngineError> {
        let argv = FilterRunner::build_argv(command, fields);
        let (program, args) = argv.split_first().ok_or(FilterError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args).envs(self.env.to_map()).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| FilterError::Spawn { command: command.to_string(), source })?;
        let mut stdin = child.stdin.take().ok_or_else(|| FilterError::Spawn {
            command: command.to_string(),
            source: std::io::Error::other("stdin was not piped"),
        })?;
        let write_task = tokio::spawn(async move {
            let _ = stdin.write_all(&input).await;
        });

        let output = child.wait_with_output().await.map_err(|source| FilterError::Spawn { command: command.to_string(), source })?;
        let _ = write_task.await;
        tracing::debug!(command, status = %output.status, "filter stage finished");

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            self.status_sink.post(&FilterStatus::new(title, line)).await?;
        }

        Ok(output.stdout)
    }
}

fn assemble_opening(config: &PipelineConfig) -> Vec<u8> {
    let mut bytes = Vec::new();
    if let Some(leader) = &config.leader {
        bytes.extend_from_slice(leader);
    }
    if config.form_feed_on_open {
        bytes.push(FORM_FEED);
    }
    if !config.suppress_header && !config.banner_last {
        if let Some(banner) = &config.banner {
            bytes.extend_from_slice(banner);
        }
    }
    bytes
}

fn assemble_trailer(config: &PipelineConfig) -> Vec<u8> {
    let mut bytes = Vec::new();
    if !config.suppress_header && config.banner_last {
        if let Some(banner) = &config.banner {
            bytes.extend_from_slice(banner);
        }
    }
    if let Some(trailer) = &config.trailer {
        bytes.extend_from_slice(trailer);
    }
    if config.form_feed_on_close {
        bytes.push(FORM_FEED);
    }
    bytes
}
