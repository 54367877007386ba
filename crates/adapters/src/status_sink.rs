// SPDX-License-Identifier: MIT

//! Status-line sinks: where a filter's stderr status lines and a print
//! pipeline's own progress notes end up (spec §4.5 "Status handling",
//! §4.9 "Status cache" source files).

use crate::error::AdapterError;
use async_trait::async_trait;
use lpd_core::FilterStatus;

#[async_trait]
pub trait StatusSink: Send + Sync + 'static {
    async fn post(&self, status: &FilterStatus) -> Result<(), AdapterError>;
}

/// Emits status lines through `tracing` only; used when a queue has no
/// `status` file configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatusSink;

#[async_trait]
impl StatusSink for TracingStatusSink {
    async fn post(&self, status: &FilterStatus) -> Result<(), AdapterError> {
        tracing::info!(title = %status.title, message = %status.message, status_line = true, "filter status");
        Ok(())
    }
}

/// Appends each status line to a file, newline-terminated. Trimming the
/// file to a bounded size is `lpd_storage::BoundedFile`'s job; this sink
/// only ever appends.
pub struct AppendFileStatusSink {
    path: std::path::PathBuf,
}

impl AppendFileStatusSink {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatusSink for AppendFileStatusSink {
    async fn post(&self, status: &FilterStatus) -> Result<(), AdapterError> {
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(format!("{}: {}\n", status.title, status.message).as_bytes()).await?;
        Ok(())
    }
}

/// Posts to both inner sinks, in order. Used to land a status line on disk
/// (the queue's `status` file, for `\3`/`\4` consumers) and as a `tracing`
/// event in the same step (spec §10: debug/error logging and status lines
/// are split along the same seam, but a status line is still a `tracing`
/// event too).
pub struct DualStatusSink<A, B> {
    first: A,
    second: B,
}

impl<A, B> DualStatusSink<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

#[async_trait]
impl<A: StatusSink, B: StatusSink> StatusSink for DualStatusSink<A, B> {
    async fn post(&self, status: &FilterStatus) -> Result<(), AdapterError> {
        self.first.post(status).await?;
        self.second.post(status).await
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeStatusSink {
        posted: Arc<Mutex<Vec<FilterStatus>>>,
    }

    impl FakeStatusSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn posted(&self) -> Vec<FilterStatus> {
            self.posted.lock().clone()
        }
    }

    #[async_trait]
    impl StatusSink for FakeStatusSink {
        async fn post(&self, status: &FilterStatus) -> Result<(), AdapterError> {
            self.posted.lock().push(status.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStatusSink;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_sink_writes_one_line_per_status() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let sink = AppendFileStatusSink::new(tmp.path());
        sink.post(&FilterStatus::new("if", "starting")).await.unwrap();
        sink.post(&FilterStatus::new("if", "done")).await.unwrap();
        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        assert_eq!(contents, "if: starting\nif: done\n");
    }

    #[tokio::test]
    async fn fake_sink_records_posted_statuses() {
        let sink = FakeStatusSink::new();
        sink.post(&FilterStatus::new("of", "ready")).await.unwrap();
        assert_eq!(sink.posted().len(), 1);
    }

    #[tokio::test]
    async fn dual_sink_posts_to_both_inner_sinks() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let file_sink = AppendFileStatusSink::new(tmp.path());
        let fake_sink = FakeStatusSink::new();
        let dual = DualStatusSink::new(file_sink, fake_sink.clone());

        dual.post(&FilterStatus::new("if", "printing")).await.unwrap();

        assert_eq!(std::fs::read_to_string(tmp.path()).unwrap(), "if: printing\n");
        assert_eq!(fake_sink.posted().len(), 1);
    }
}
