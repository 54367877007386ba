// SPDX-License-Identifier: MIT

//! Remote-host forwarder: sends a prepared job envelope to another host's
//! dispatcher over the line-printer wire protocol (spec §4.7 step 6's
//! "remote host" destination, §4.8 "receive a job", §4.10 "Secure transfer
//! / forwarding").
//!
//! Encryption/authentication itself is out of scope here — a secure
//! transfer's envelope bytes are expected to already be in their final
//! (possibly provider-transformed) form by the time they reach this
//! adapter, which only owns framing and socket I/O.

use crate::error::AdapterError;
use crate::wire::{EnvelopeOrigin, Opcode, ReceiveSubOpcode, ACK};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// One named file within an envelope (a control file, or one data file).
#[derive(Debug, Clone)]
pub struct NamedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The set of files that make up one job transfer, in the order they must
/// be sent: the control file first, then each data file (spec §3 "Spool
/// directory" naming, §4.8 "control-file transfer", "data-file transfer").
#[derive(Debug, Clone)]
pub struct Envelope {
    pub control: NamedFile,
    pub data_files: Vec<NamedFile>,
}

/// Parameters for the secure-transfer header (spec §4.10 step 2); `None`
/// sends the plain (unauthenticated) `\2` framing instead.
#[derive(Debug, Clone)]
pub struct SecureParams {
    pub origin: EnvelopeOrigin,
    pub user: String,
    pub auth_type: String,
}

/// A remote host and port to forward a job to.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
}

#[async_trait]
pub trait RemoteForwarder: Send + Sync + 'static {
    /// Forward `envelope` to `queue` on `target`, optionally wrapped in the
    /// secure-transfer framing described by `secure`.
    async fn send_job(
        &self,
        target: &RemoteTarget,
        queue: &str,
        envelope: &Envelope,
        secure: Option<&SecureParams>,
    ) -> Result<(), AdapterError>;
}

/// Forwards jobs over a plain TCP connection to the peer's line-printer
/// port.
pub struct TcpForwarder {
    connect_timeout: Duration,
}

impl TcpForwarder {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpForwarder {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

async fn read_ack(stream: &mut TcpStream) -> Result<(), AdapterError> {
    let mut byte = [0u8; 1];
    stream.read_exact(&mut byte).await?;
    if byte[0] != ACK {
        return Err(AdapterError::Nak(byte[0]));
    }
    Ok(())
}

async fn send_named_file(
    stream: &mut TcpStream,
    sub_opcode: ReceiveSubOpcode,
    file: &NamedFile,
) -> Result<(), AdapterError> {
    stream.write_all(&[sub_opcode.byte()]).await?;
    stream.write_all(format!("{} {}\n", file.bytes.len(), file.name).as_bytes()).await?;
    stream.write_all(&file.bytes).await?;
    read_ack(stream).await
}

#[async_trait]
impl RemoteForwarder for TcpForwarder {
    async fn send_job(
        &self,
        target: &RemoteTarget,
        queue: &str,
        envelope: &Envelope,
        secure: Option<&SecureParams>,
    ) -> Result<(), AdapterError> {
        tracing::debug!(host = %target.host, port = target.port, queue, "forwarding job");
        let mut stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect((target.host.as_str(), target.port)))
            .await
            .map_err(|_| AdapterError::Timeout("connect"))?
            .map_err(|source| AdapterError::Connect { host: target.host.clone(), port: target.port, source })?;

        match secure {
            Some(params) => {
                let size: usize = envelope.control.bytes.len()
                    + envelope.control.name.len()
                    + envelope.data_files.iter().map(|f| f.bytes.len() + f.name.len()).sum::<usize>();
                stream.write_all(&[Opcode::SecureTransfer.byte()]).await?;
                stream
                    .write_all(format!("{queue} {} {} {} {size}\n", params.origin.letter(), params.user, params.auth_type).as_bytes())
                    .await?;
                read_ack(&mut stream).await?;
                send_named_file(&mut stream, ReceiveSubOpcode::ControlFile, &envelope.control).await?;
                for data_file in &envelope.data_files {
                    send_named_file(&mut stream, ReceiveSubOpcode::DataFile, data_file).await?;
                }
            }
            None => {
                stream.write_all(&[Opcode::ReceiveJob.byte()]).await?;
                stream.write_all(format!("{queue}\n").as_bytes()).await?;
                send_named_file(&mut stream, ReceiveSubOpcode::ControlFile, &envelope.control).await?;
                for data_file in &envelope.data_files {
                    send_named_file(&mut stream, ReceiveSubOpcode::DataFile, data_file).await?;
                }
            }
        }

        tracing::debug!(host = %target.host, port = target.port, queue, "job forwarded");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct ForwardCall {
        pub host: String,
        pub port: u16,
        pub queue: String,
        pub envelope: Envelope,
        pub secure: Option<SecureParams>,
    }

    /// Records every forward attempt; replies with a configurable result.
    #[derive(Clone)]
    pub struct FakeForwarder {
        calls: Arc<Mutex<Vec<ForwardCall>>>,
        fail_with: Arc<Mutex<Option<u8>>>,
    }

    impl Default for FakeForwarder {
        fn default() -> Self {
            Self { calls: Arc::new(Mutex::new(Vec::new())), fail_with: Arc::new(Mutex::new(None)) }
        }
    }

    impl FakeForwarder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<ForwardCall> {
            self.calls.lock().clone()
        }

        /// Make every subsequent `send_job` fail with the given nak byte.
        pub fn fail_with_nak(&self, byte: u8) {
            *self.fail_with.lock() = Some(byte);
        }
    }

    #[async_trait]
    impl RemoteForwarder for FakeForwarder {
        async fn send_job(
            &self,
            target: &RemoteTarget,
            queue: &str,
            envelope: &Envelope,
            secure: Option<&SecureParams>,
        ) -> Result<(), AdapterError> {
            self.calls.lock().push(ForwardCall {
                host: target.host.clone(),
                port: target.port,
                queue: queue.to_string(),
                envelope: envelope.clone(),
                secure: secure.cloned(),
            });
            if let Some(byte) = *self.fail_with.lock() {
                return Err(AdapterError::Nak(byte));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeForwarder, ForwardCall};

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::TcpListener;

    fn envelope() -> Envelope {
        Envelope {
            control: NamedFile { name: "cfA001host".to_string(), bytes: b"H localhost\n".to_vec() },
            data_files: vec![NamedFile { name: "dfA001host".to_string(), bytes: b"hello\n".to_vec() }],
        }
    }

    #[tokio::test]
    async fn sends_plain_receive_framing_and_reads_acks() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1];
            socket.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf[0], Opcode::ReceiveJob.byte());
            let mut line = Vec::new();
            read_line(&mut socket, &mut line).await;
            assert_eq!(line, b"lp\n");

            for _ in 0..2 {
                socket.read_exact(&mut buf).await.unwrap();
                let mut header = Vec::new();
                read_line(&mut socket, &mut header).await;
                let header = String::from_utf8(header).unwrap();
                let size: usize = header.split_whitespace().next().unwrap().parse().unwrap();
                let mut body = vec![0u8; size];
                socket.read_exact(&mut body).await.unwrap();
                socket.write_all(&[ACK]).await.unwrap();
            }
        });

        let forwarder = TcpForwarder::new(Duration::from_secs(5));
        let target = RemoteTarget { host: "127.0.0.1".to_string(), port: addr.port() };
        forwarder.send_job(&target, "lp", &envelope(), None).await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn nonzero_ack_is_reported_as_nak() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1];
            socket.read_exact(&mut buf).await.unwrap();
            let mut line = Vec::new();
            read_line(&mut socket, &mut line).await;
            socket.read_exact(&mut buf).await.unwrap();
            let mut header = Vec::new();
            read_line(&mut socket, &mut header).await;
            let header = String::from_utf8(header).unwrap();
            let size: usize = header.split_whitespace().next().unwrap().parse().unwrap();
            let mut body = vec![0u8; size];
            socket.read_exact(&mut body).await.unwrap();
            socket.write_all(&[7]).await.unwrap();
        });

        let forwarder = TcpForwarder::new(Duration::from_secs(5));
        let target = RemoteTarget { host: "127.0.0.1".to_string(), port: addr.port() };
        let result = forwarder.send_job(&target, "lp", &envelope(), None).await;
        assert!(matches!(result, Err(AdapterError::Nak(7))));
        server.await.unwrap();
    }

    async fn read_line(socket: &mut TcpStream, into: &mut Vec<u8>) {
        let mut byte = [0u8; 1];
        loop {
            socket.read_exact(&mut byte).await.unwrap();
            into.push(byte[0]);
            if byte[0] == b'\n' {
                break;
            }
        }
    }

    #[tokio::test]
    async fn fake_forwarder_records_calls() {
        let fake = FakeForwarder::new();
        let target = RemoteTarget { host: "printhost".to_string(), port: 515 };
        fake.send_job(&target, "lp", &envelope(), None).await.unwrap();
        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].queue, "lp");
    }
}
