//! Unix socket server exposing the advisor to local clients.
//!
//! The server is organized into separate concerns:
//! - `types`: Protocol types for requests and responses
//! - `handler`: Routes each request to the [`Advisor`]
//! - `transport`: Unix socket and JSON-lines framing
//!
//! A client writes one JSON request line, e.g.
//! `{"type": "analyze", "company_id": "42"}`, and reads JSON chunk lines
//! until a `done` or `error` chunk arrives. A request that cannot be
//! parsed is answered with a single `error` chunk.

mod handler;
mod transport;
mod types;

pub use handler::RequestHandler;
pub use transport::{AdvisorSocket, TransportError, MAX_REQUEST_BYTES};
pub use types::{ChunkType, Request, StreamChunk};

use crate::engine::Advisor;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Coordinates transport and request handling.
pub struct Server {
    handler: Arc<RequestHandler>,
    socket: AdvisorSocket,
}

impl Server {
    pub fn new(advisor: Arc<Advisor>, socket_path: impl Into<PathBuf>) -> Self {
        Self {
            handler: Arc::new(RequestHandler::new(advisor)),
            socket: AdvisorSocket::new(socket_path),
        }
    }

    /// Accepts connections until Ctrl-C, then removes the socket file.
    pub async fn start(&self) -> transport::Result<()> {
        let listener = self.socket.bind().await?;
        info!(socket = %self.socket.socket_path().display(), "Advisor server listening");

        let shutdown = signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Ok((stream, _)) = listener.accept() => {
                    let handler = Arc::clone(&self.handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler).await {
                            warn!(error = %e, "Connection error");
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutting down");
                    self.socket.cleanup();
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    handler: Arc<RequestHandler>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match transport::read_request(&mut reader).await {
        Ok(request) => request,
        Err(TransportError::EmptyRequest) => {
            debug!("Client disconnected without a request");
            return Ok(());
        }
        Err(e) => {
            transport::write_chunk(&mut writer, &StreamChunk::error(e.to_string())).await?;
            return Err(e.into());
        }
    };

    let (sender, receiver) = mpsc::unbounded_channel();

    let handle_task = tokio::spawn(async move {
        handler.handle(request, sender).await;
    });

    let write_task = tokio::spawn(transport::write_chunks(writer, receiver));

    let (_, written) = tokio::try_join!(handle_task, write_task)?;
    written?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisOrchestrator;
    use crate::knowledge::Dataset;
    use crate::test_support::{catalog_product, memory_knowledge_base, test_config, ScriptedProvider, TEST_DIM};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    #[tokio::test]
    async fn test_connection_round_trip() {
        let (knowledge, _) = memory_knowledge_base(Dataset {
            products: vec![catalog_product("SAP Ariba", "Procurement", &["Manufacturing"])],
            ..Dataset::default()
        });
        let provider = Arc::new(ScriptedProvider::new(TEST_DIM));
        let advisor = Arc::new(Advisor::new(knowledge, AnalysisOrchestrator::new(provider, &test_config())));
        let handler = Arc::new(RequestHandler::new(advisor));

        let (mut client, server) = UnixStream::pair().unwrap();
        let connection = tokio::spawn(handle_connection(server, handler));

        client.write_all(b"{\"type\": \"populate\"}\n").await.unwrap();
        let mut lines = BufReader::new(client).lines();
        let mut chunks = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            chunks.push(serde_json::from_str::<StreamChunk>(&line).unwrap());
        }
        connection.await.unwrap().unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].is_final());
        assert_eq!(chunks[1].data.as_ref().unwrap()["products"], 1);
    }

    #[tokio::test]
    async fn test_unparseable_request_gets_error_chunk() {
        let (knowledge, _) = memory_knowledge_base(Dataset::default());
        let provider = Arc::new(ScriptedProvider::new(TEST_DIM));
        let advisor = Arc::new(Advisor::new(knowledge, AnalysisOrchestrator::new(provider, &test_config())));
        let handler = Arc::new(RequestHandler::new(advisor));

        let (mut client, server) = UnixStream::pair().unwrap();
        let connection = tokio::spawn(handle_connection(server, handler));

        client.write_all(b"{\"type\": \"reindex\"}\n").await.unwrap();
        let mut lines = BufReader::new(client).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let chunk: StreamChunk = serde_json::from_str(&line).unwrap();

        assert_eq!(chunk.chunk_type, ChunkType::Error);
        assert!(chunk.message.starts_with("Invalid request"));
        assert!(connection.await.unwrap().is_err());
    }
}
