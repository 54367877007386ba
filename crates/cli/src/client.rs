// SPDX-License-Identifier: MIT

//! Sends one request over the line-printer wire protocol and collects the
//! reply (spec §4.8: query opcodes reply with plain text terminated by
//! connection close).

use crate::error::ClientError;
use crate::target::Target;
use lpd_adapters::Opcode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

pub async fn send_request(target: &Target, opcode: Opcode, line: &str) -> Result<String, ClientError> {
    let mut request = vec![opcode.byte()];
    request.extend_from_slice(line.as_bytes());
    request.push(b'\n');

    let reply = match target {
        Target::Unix(path) => {
            let mut stream = UnixStream::connect(path).await.map_err(|e| ClientError::Connect(path.display().to_string(), e))?;
            stream.write_all(&request).await?;
            stream.shutdown().await?;
            read_to_end(&mut stream).await?
        }
        Target::Tcp { host, port } => {
            let addr = format!("{host}:{port}");
            let mut stream = TcpStream::connect(&addr).await.map_err(|e| ClientError::Connect(addr.clone(), e))?;
            stream.write_all(&request).await?;
            stream.shutdown().await?;
            read_to_end(&mut stream).await?
        }
    };

    String::from_utf8(reply).map_err(|_| ClientError::InvalidReply)
}

async fn read_to_end<S: tokio::io::AsyncRead + Unpin>(stream: &mut S) -> Result<Vec<u8>, ClientError> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn sends_opcode_byte_then_line_and_reads_reply_until_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            assert_eq!(received, b"\x03lp extra\n");
            socket.write_all(b"lp is ready and printing is enabled\n").await.unwrap();
        });

        let target = Target::Tcp { host: "127.0.0.1".to_string(), port };
        let reply = send_request(&target, Opcode::ShortStatus, "lp extra").await.unwrap();
        server.await.unwrap();

        assert_eq!(reply, "lp is ready and printing is enabled\n");
    }
}
