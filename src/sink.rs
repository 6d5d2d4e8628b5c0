//! Result and document sink contracts.
//!
//! The durable task-ledger store and the vector document store are
//! external collaborators; the core hands them complete, immutable
//! records through narrow traits. Document keys are content-derived so
//! repeated ingestion of the same logical message stays idempotent at
//! the store layer.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::models::{AnalysisResult, Message, SentimentLabel};

/// Errors from result and document sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store rejected record: {0}")]
    Rejected(String),
}

/// Durable sink for analysis results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn store(&self, result: &AnalysisResult) -> Result<(), SinkError>;
}

/// Embed-and-query document store for raw conversation text.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn add(&self, document: &ConversationDocument) -> Result<(), SinkError>;
}

/// Compute the deterministic document key for a message.
///
/// SHA-256 over `(platform, conversation_id, sender, observed_at, text)`,
/// newline-separated so field boundaries stay unambiguous. The same
/// logical message always keys to the same document.
pub fn document_key(message: &Message) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.platform.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(message.conversation_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(message.sender.as_bytes());
    hasher.update(b"\n");
    hasher.update(message.observed_at.to_rfc3339().as_bytes());
    hasher.update(b"\n");
    hasher.update(message.text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Embedding-ready document for one message.
#[derive(Debug, Clone)]
pub struct ConversationDocument {
    /// Content-derived key (see `document_key`).
    pub key: String,
    /// Text prepared for embedding, with conversation context framing.
    pub text: String,
    /// Metadata map handed to the store alongside the text.
    pub metadata: serde_json::Value,
}

impl ConversationDocument {
    /// Build the document for a message, tagging the fused label when
    /// analysis produced one.
    pub fn from_message(message: &Message, label: Option<SentimentLabel>) -> Self {
        let mut metadata = json!({
            "sender": message.sender,
            "conversation_id": message.conversation_id,
            "observed_at": message.observed_at.to_rfc3339(),
            "platform": message.platform.as_str(),
            "kind": message.kind.as_str(),
            "is_outgoing": message.is_outgoing,
        });
        if let Some(label) = label {
            metadata["label"] = json!(label.as_str());
        }

        Self {
            key: document_key(message),
            text: format!(
                "Group: {}\nSender: {}\nMessage: {}",
                message.conversation_id, message.sender, message.text
            ),
            metadata,
        }
    }
}

/// In-memory result sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<AnalysisResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn store(&self, result: &AnalysisResult) -> Result<(), SinkError> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// In-memory document store for tests; keyed, so re-adding the same
/// document is a no-op like a real content-addressed store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<Vec<ConversationDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<ConversationDocument> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add(&self, document: &ConversationDocument) -> Result<(), SinkError> {
        let mut documents = self.documents.lock().unwrap();
        if !documents.iter().any(|d| d.key == document.key) {
            documents.push(document.clone());
        }
        Ok(())
    }
}

/// Result sink that appends JSON lines to a file.
pub struct JsonlSink {
    writer: tokio::sync::Mutex<tokio::io::BufWriter<tokio::fs::File>>,
}

impl JsonlSink {
    pub async fn create(path: &Path) -> Result<Self, SinkError> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self {
            writer: tokio::sync::Mutex::new(tokio::io::BufWriter::new(file)),
        })
    }

    pub async fn flush(&self) -> Result<(), SinkError> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ResultSink for JsonlSink {
    async fn store(&self, result: &AnalysisResult) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(result)?;
        line.push(b'\n');
        self.writer.lock().await.write_all(&line).await?;
        Ok(())
    }
}
