//! Per-conversation ingestion watermarks.
//!
//! Tracks the highest `observed_at` accepted as "new" for each
//! conversation so repeated observation windows do not reprocess the same
//! messages. State is process-owned and mutated only inside `filter_new`;
//! persistence across restarts belongs to the external sink.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::Message;

/// High-water-mark tracker, one mark per conversation.
///
/// Mutation takes `&mut self`, so at most one filter pass per tracker can
/// be in flight; callers that process conversations from multiple tasks
/// serialize access by conversation key.
#[derive(Debug, Default)]
pub struct IngestionWatermark {
    marks: HashMap<String, DateTime<Utc>>,
}

impl IngestionWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored mark for a conversation, if any batch has been accepted.
    pub fn last_seen(&self, conversation_id: &str) -> Option<DateTime<Utc>> {
        self.marks.get(conversation_id).copied()
    }

    /// Filter a batch of candidates down to genuinely new messages and
    /// commit the advanced mark.
    ///
    /// A candidate is new iff its `observed_at` is strictly later than the
    /// stored mark (first contact accepts everything). The mark advances to
    /// the maximum accepted `observed_at` after the full pass — never
    /// backward, even when candidates arrive out of order within the batch.
    /// Re-filtering the same input with no intervening data yields nothing.
    pub fn filter_new(&mut self, conversation_id: &str, candidates: &[Message]) -> Vec<Message> {
        let last = self.marks.get(conversation_id).copied();

        let mut accepted = Vec::new();
        let mut max_accepted: Option<DateTime<Utc>> = None;

        for candidate in candidates {
            if let Some(last) = last {
                if candidate.observed_at <= last {
                    continue;
                }
            }
            max_accepted = Some(match max_accepted {
                Some(current) => current.max(candidate.observed_at),
                None => candidate.observed_at,
            });
            accepted.push(candidate.clone());
        }

        if let Some(new_mark) = max_accepted {
            let entry = self
                .marks
                .entry(conversation_id.to_string())
                .or_insert(new_mark);
            if new_mark > *entry {
                *entry = new_mark;
            }
            debug!(
                conversation_id,
                accepted = accepted.len(),
                mark = %new_mark,
                "advanced ingestion watermark"
            );
        }

        accepted
    }
}
