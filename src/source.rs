//! Message source contract and the raw-record decode boundary.
//!
//! The chat-surface driver is an external collaborator; the core pulls
//! typed `Message` values through the `MessageSource` trait. Raw records
//! arrive loosely typed (epoch or string timestamps, optional fields) and
//! are converted here — a record whose timestamp cannot be parsed is
//! excluded and logged as skipped, never allowed to reach the watermark.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{Message, MessageKind, Platform};

/// Errors from message sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// Errors decoding one raw record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record has no conversation id")]
    MissingConversation,

    #[error("unparseable timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
}

/// Pull contract with the external chat-surface driver.
///
/// The core does not manage the source's connection or session
/// lifecycle; it only asks for recent messages per conversation.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn get_recent(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, SourceError>;
}

/// Timestamp as observed on the wire: epoch seconds or a datetime string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(f64),
    Text(String),
}

impl RawTimestamp {
    fn parse(&self) -> Result<DateTime<Utc>, DecodeError> {
        match self {
            RawTimestamp::Epoch(secs) => {
                if !secs.is_finite() {
                    return Err(DecodeError::MalformedTimestamp(secs.to_string()));
                }
                let whole = secs.trunc() as i64;
                let nanos = (secs.fract() * 1e9) as u32;
                Utc.timestamp_opt(whole, nanos)
                    .single()
                    .ok_or_else(|| DecodeError::MalformedTimestamp(secs.to_string()))
            }
            RawTimestamp::Text(text) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Ok(dt.with_timezone(&Utc));
                }
                for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
                    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(text, format) {
                        return Ok(Utc.from_utc_datetime(&naive));
                    }
                }
                Err(DecodeError::MalformedTimestamp(text.clone()))
            }
        }
    }
}

/// One loosely-typed message record as supplied by a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "group_name")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default, alias = "content")]
    pub text: String,
    #[serde(alias = "timestamp")]
    pub observed_at: RawTimestamp,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default, alias = "message_type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_outgoing: bool,
}

impl TryFrom<MessageRecord> for Message {
    type Error = DecodeError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let observed_at = record.observed_at.parse()?;

        let conversation_id = record
            .conversation_id
            .filter(|c| !c.is_empty())
            .ok_or(DecodeError::MissingConversation)?;

        let platform = match record.platform.as_deref() {
            None | Some("") => Platform::Whatsapp,
            Some(name) => Platform::from_str(name)
                .ok_or_else(|| DecodeError::UnknownPlatform(name.to_string()))?,
        };

        Ok(Message {
            id: record
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            conversation_id,
            sender: record.sender.unwrap_or_else(|| "Unknown".to_string()),
            text: record.text,
            observed_at,
            platform,
            kind: record
                .kind
                .as_deref()
                .and_then(MessageKind::from_str)
                .unwrap_or_default(),
            is_outgoing: record.is_outgoing,
        })
    }
}

/// Decode a batch of raw records, skipping and logging the malformed ones.
///
/// Returns the decoded messages (input order preserved) and the skipped
/// count.
pub fn decode_records(records: Vec<MessageRecord>) -> (Vec<Message>, usize) {
    let mut messages = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        match Message::try_from(record) {
            Ok(message) => messages.push(message),
            Err(err) => {
                warn!("skipping malformed message record: {}", err);
                skipped += 1;
            }
        }
    }

    (messages, skipped)
}

/// In-memory source over a fixed message set.
#[derive(Debug, Default)]
pub struct StaticSource {
    messages: Vec<Message>,
}

impl StaticSource {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[async_trait]
impl MessageSource for StaticSource {
    async fn get_recent(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, SourceError> {
        let mut matching: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.observed_at);

        if matching.len() > limit {
            matching.drain(..matching.len() - limit);
        }
        Ok(matching)
    }
}
