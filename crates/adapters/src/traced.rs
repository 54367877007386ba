// SPDX-License-Identifier: MIT

//! Tracing decorators for the adapter traits, matching each call with a
//! span and a structured before/after log line.

use crate::device::DeviceWriter;
use crate::error::AdapterError;
use crate::forward::{Envelope, RemoteForwarder, RemoteTarget, SecureParams};
use crate::status_sink::StatusSink;
use async_trait::async_trait;
use lpd_core::FilterStatus;
use tracing::Instrument;

#[derive(Clone)]
pub struct Traced<Inner> {
    inner: Inner,
}

impl<Inner> Traced<Inner> {
    pub fn new(inner: Inner) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<D: DeviceWriter> DeviceWriter for Traced<D> {
    async fn write_all(&self, buf: &[u8]) -> Result<(), AdapterError> {
        async {
            let result = self.inner.write_all(buf).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "device write failed");
            }
            result
        }
        .instrument(tracing::info_span!("device.write", bytes = buf.len()))
        .await
    }

    async fn drain(&self) -> Result<(), AdapterError> {
        async {
            let result = self.inner.drain().await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "device drain failed");
            }
            result
        }
        .instrument(tracing::info_span!("device.drain"))
        .await
    }
}

#[async_trait]
impl<F: RemoteForwarder> RemoteForwarder for Traced<F> {
    async fn send_job(
        &self,
        target: &RemoteTarget,
        queue: &str,
        envelope: &Envelope,
        secure: Option<&SecureParams>,
    ) -> Result<(), AdapterError> {
        let span = tracing::info_span!("forward.send_job", host = %target.host, port = target.port, queue);
        async {
            tracing::info!(secure = secure.is_some(), data_files = envelope.data_files.len(), "forwarding");
            let start = std::time::Instant::now();
            let result = self.inner.send_job(target, queue, envelope, secure).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "forwarded"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "forward failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<S: StatusSink> StatusSink for Traced<S> {
    async fn post(&self, status: &FilterStatus) -> Result<(), AdapterError> {
        let result = self.inner.post(status).await;
        if let Err(ref e) = result {
            tracing::error!(title = %status.title, error = %e, "status post failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::FakeDevice;

    #[tokio::test]
    async fn traced_device_delegates_to_inner() {
        let traced = Traced::new(FakeDevice::new());
        traced.write_all(b"abc").await.unwrap();
        traced.drain().await.unwrap();
    }
}
