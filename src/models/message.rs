//! Message models for conversation ingestion.
//!
//! Messages are produced by an external chat-surface driver and are
//! immutable once observed. `observed_at` orders messages within a
//! conversation and drives the ingestion watermark.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat platform a message was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Whatsapp,
    Twitter,
    Instagram,
    Linkedin,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "whatsapp" => Some(Self::Whatsapp),
            "twitter" => Some(Self::Twitter),
            "instagram" => Some(Self::Instagram),
            "linkedin" => Some(Self::Linkedin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of message content.
///
/// Non-text kinds carry whatever caption text the surface exposed;
/// an empty caption short-circuits analysis the same way empty text does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Media,
    Audio,
    Document,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Media => "media",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "media" => Some(Self::Media),
            "audio" => Some(Self::Audio),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// A single observed conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Source-assigned identifier (generated when the source omits one).
    pub id: String,
    /// Conversation (group or contact chat) this message belongs to.
    pub conversation_id: String,
    /// Display name of the sender.
    pub sender: String,
    /// Raw message text as observed on the surface.
    pub text: String,
    /// When the message was observed. Monotonically non-decreasing within
    /// a conversation; ties are broken by arrival order.
    pub observed_at: DateTime<Utc>,
    /// Platform the message was observed on.
    pub platform: Platform,
    /// Content kind.
    #[serde(default)]
    pub kind: MessageKind,
    /// Whether the monitored account sent this message.
    #[serde(default)]
    pub is_outgoing: bool,
}

impl Message {
    /// Create a new text message.
    pub fn new(
        id: String,
        conversation_id: String,
        sender: String,
        text: String,
        observed_at: DateTime<Utc>,
        platform: Platform,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender,
            text,
            observed_at,
            platform,
            kind: MessageKind::Text,
            is_outgoing: false,
        }
    }

    /// Whether the message carries any analyzable text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trip() {
        for p in [
            Platform::Whatsapp,
            Platform::Twitter,
            Platform::Instagram,
            Platform::Linkedin,
        ] {
            assert_eq!(Platform::from_str(p.as_str()), Some(p));
        }
        assert_eq!(Platform::from_str("telegram"), None);
    }

    #[test]
    fn test_has_text_ignores_whitespace() {
        let mut msg = Message::new(
            "m1".into(),
            "family".into(),
            "Ana".into(),
            "   ".into(),
            Utc::now(),
            Platform::Whatsapp,
        );
        assert!(!msg.has_text());
        msg.text = "hello".into();
        assert!(msg.has_text());
    }
}
