// SPDX-License-Identifier: MIT

//! Local output device adapter (spec §4.5 "print one job to one device").

use crate::error::AdapterError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// One destination a print pipeline can stream bytes into: a local device
/// file, or (via [`crate::forward::RemoteForwarder`]) a remote host.
#[async_trait]
pub trait DeviceWriter: Send + Sync + 'static {
    /// Write `buf` to the device in full.
    async fn write_all(&self, buf: &[u8]) -> Result<(), AdapterError>;

    /// `tcdrain` the device if it is a terminal; a no-op otherwise (spec
    /// §4.5 step 6 "`tcdrain` the device if it is a terminal").
    async fn drain(&self) -> Result<(), AdapterError>;
}

/// Writes to a local device path (a parallel/serial port, a plain file, or
/// a pseudo-device used in tests).
pub struct LocalDevice {
    path: PathBuf,
    file: tokio::sync::Mutex<tokio::fs::File>,
    is_tty: bool,
}

impl LocalDevice {
    /// Open `path` for writing. TTY-ness is probed once at open time with
    /// `isatty` and cached; it does not change for the life of the handle.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AdapterError> {
        let path = path.into();
        let std_file = std::fs::OpenOptions::new().write(true).open(&path)?;
        let is_tty = nix::unistd::isatty(&std_file).unwrap_or(false);
        Ok(Self {
            path,
            file: tokio::sync::Mutex::new(tokio::fs::File::from_std(std_file)),
            is_tty,
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl DeviceWriter for LocalDevice {
    async fn write_all(&self, buf: &[u8]) -> Result<(), AdapterError> {
        let mut file = self.file.lock().await;
        file.write_all(buf).await?;
        Ok(())
    }

    async fn drain(&self) -> Result<(), AdapterError> {
        if !self.is_tty {
            return Ok(());
        }
        let file = self.file.lock().await;
        nix::sys::termios::tcdrain(&*file).map_err(|errno| AdapterError::Io(errno.into()))
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every byte written and every drain call for assertions.
    #[derive(Clone, Default)]
    pub struct FakeDevice {
        inner: Arc<Mutex<FakeDeviceState>>,
    }

    #[derive(Default)]
    struct FakeDeviceState {
        written: Vec<u8>,
        drains: u32,
    }

    impl FakeDevice {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn written(&self) -> Vec<u8> {
            self.inner.lock().written.clone()
        }

        pub fn drain_count(&self) -> u32 {
            self.inner.lock().drains
        }
    }

    #[async_trait]
    impl DeviceWriter for FakeDevice {
        async fn write_all(&self, buf: &[u8]) -> Result<(), AdapterError> {
            self.inner.lock().written.extend_from_slice(buf);
            Ok(())
        }

        async fn drain(&self) -> Result<(), AdapterError> {
            self.inner.lock().drains += 1;
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDevice;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn writes_bytes_to_a_plain_file() {
        let tmp = NamedTempFile::new().unwrap();
        let device = LocalDevice::open(tmp.path()).await.unwrap();
        device.write_all(b"hello\n").await.unwrap();
        device.drain().await.unwrap();
        assert_eq!(std::fs::read(tmp.path()).unwrap(), b"hello\n");
    }

    #[tokio::test]
    async fn fake_device_records_writes_and_drains() {
        let device = FakeDevice::new();
        device.write_all(b"abc").await.unwrap();
        device.write_all(b"def").await.unwrap();
        device.drain().await.unwrap();
        assert_eq!(device.written(), b"abcdef");
        assert_eq!(device.drain_count(), 1);
    }
}
