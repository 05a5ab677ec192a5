//! JSON-lines framing over the advisor socket.
//!
//! One request line in, chunk lines out until the final chunk. Framing is
//! written against `AsyncRead`/`AsyncWrite` so it works the same on socket
//! halves and in-memory buffers.

use super::types::{Request, StreamChunk};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// Largest accepted request line. Inline company records can carry
/// extracted file text, so this is generous.
pub const MAX_REQUEST_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed before a request was sent")]
    EmptyRequest,

    #[error("Request exceeds {MAX_REQUEST_BYTES} bytes")]
    RequestTooLarge,

    #[error("Another advisor server is listening on {0}")]
    SocketInUse(PathBuf),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Owner-only Unix socket the server accepts clients on.
pub struct AdvisorSocket {
    socket_path: PathBuf,
}

impl AdvisorSocket {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Binds the socket. A leftover file from a crashed run is replaced; a
    /// socket that still accepts connections is not.
    pub async fn bind(&self) -> Result<UnixListener> {
        if self.socket_path.exists() {
            if UnixStream::connect(&self.socket_path).await.is_ok() {
                return Err(TransportError::SocketInUse(self.socket_path.clone()));
            }
            std::fs::remove_file(&self.socket_path)?;
        }
        if let Some(parent) = self.socket_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.socket_path, perms)?;
        }

        Ok(listener)
    }

    pub fn cleanup(&self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Reads the first non-blank line as a request.
pub async fn read_request<R: AsyncRead + Unpin>(reader: R) -> Result<Request> {
    let mut reader = BufReader::new(reader).take(MAX_REQUEST_BYTES as u64 + 1);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Err(TransportError::EmptyRequest);
        }
        if line.len() > MAX_REQUEST_BYTES {
            return Err(TransportError::RequestTooLarge);
        }
        if !line.iter().all(u8::is_ascii_whitespace) {
            break;
        }
    }
    Ok(serde_json::from_slice(&line)?)
}

/// Writes and flushes one chunk line.
pub async fn write_chunk<W: AsyncWrite + Unpin>(writer: &mut W, chunk: &StreamChunk) -> Result<()> {
    let mut line = serde_json::to_vec(chunk)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes chunks until the final one, then shuts the writer down.
///
/// Anything sent after a `done` or `error` chunk is dropped.
pub async fn write_chunks<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut receiver: mpsc::UnboundedReceiver<StreamChunk>,
) -> Result<()> {
    while let Some(chunk) = receiver.recv().await {
        write_chunk(&mut writer, &chunk).await?;
        if chunk.is_final() {
            break;
        }
    }

    writer.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::types::ChunkType;

    fn lines(buf: &[u8]) -> Vec<StreamChunk> {
        std::str::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_request_skips_blank_lines() {
        let input: &[u8] = b"\n  \r\n{\"type\": \"remove_company\", \"company_id\": \"42\"}\n{\"type\": \"stats\"}\n";
        let request = read_request(input).await.unwrap();
        assert!(matches!(request, Request::RemoveCompany { company_id } if company_id == "42"));
    }

    #[tokio::test]
    async fn test_request_errors() {
        assert!(matches!(read_request(&b""[..]).await, Err(TransportError::EmptyRequest)));
        assert!(matches!(read_request(&b"\n\n"[..]).await, Err(TransportError::EmptyRequest)));
        assert!(matches!(read_request(&b"{\"type\": \"dance\"}\n"[..]).await, Err(TransportError::Json(_))));

        let oversized = vec![b' '; MAX_REQUEST_BYTES + 10];
        assert!(matches!(
            read_request(oversized.as_slice()).await,
            Err(TransportError::RequestTooLarge)
        ));
    }

    #[tokio::test]
    async fn test_chunks_stop_after_final() {
        let (sender, receiver) = mpsc::unbounded_channel();
        sender.send(StreamChunk::progress("Populating")).unwrap();
        sender.send(StreamChunk::done("Populated")).unwrap();
        sender.send(StreamChunk::progress("Late")).unwrap();
        drop(sender);

        let mut out = Vec::new();
        write_chunks(&mut out, receiver).await.unwrap();

        let chunks = lines(&out);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_type, ChunkType::Progress);
        assert_eq!(chunks[1].chunk_type, ChunkType::Done);
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("advisor.sock");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"stale").unwrap();

        let socket = AdvisorSocket::new(&path);
        let _listener = socket.bind().await.unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        socket.cleanup();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_bind_refuses_live_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advisor.sock");

        let first = AdvisorSocket::new(&path);
        let _listener = first.bind().await.unwrap();

        let second = AdvisorSocket::new(&path);
        assert!(matches!(second.bind().await, Err(TransportError::SocketInUse(p)) if p == path));
        assert!(path.exists());
    }
}
