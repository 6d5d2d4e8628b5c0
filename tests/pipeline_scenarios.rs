//! End-to-end pipeline scenarios: watermark filtering, batch analysis,
//! summary aggregation, and sink idempotence working together.

use chrono::{TimeZone, Utc};

use conversense::config::ConversenseConfig;
use conversense::models::{AnalysisFailure, Message, Platform, SentimentLabel};
use conversense::pipeline::ConversationPipeline;
use conversense::sink::{ConversationDocument, DocumentStore, MemoryDocumentStore, MemorySink, ResultSink};
use conversense::watermark::IngestionWatermark;

fn message(id: &str, text: &str, at_secs: i64) -> Message {
    Message::new(
        id.to_string(),
        "family".to_string(),
        "Ana".to_string(),
        text.to_string(),
        Utc.timestamp_opt(at_secs, 0).unwrap(),
        Platform::Whatsapp,
    )
}

#[tokio::test]
async fn test_ingest_analyze_and_summarize_one_conversation() {
    let batch = vec![
        message("m1", "I love this!!!", 100),
        message("m2", "I hate it.", 200),
        message("m3", "", 300),
    ];

    let mut watermark = IngestionWatermark::new();
    let fresh = watermark.filter_new("family", &batch);
    assert_eq!(fresh.len(), 3, "first contact accepts the whole batch");

    let pipeline = ConversationPipeline::new(&ConversenseConfig::default()).unwrap();
    let results = pipeline.run_batch(&fresh).await;
    assert_eq!(results.len(), 3);

    let first = results[0].verdict.as_ref().unwrap();
    assert_eq!(first.label, SentimentLabel::Positive);
    assert!(first.agreement);

    let second = results[1].verdict.as_ref().unwrap();
    assert_eq!(second.label, SentimentLabel::Negative);

    assert_eq!(results[2].failure, Some(AnalysisFailure::NoText));
    assert!(results[2].verdict.is_none());

    let summary = pipeline.summarize(&results);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.counts.positive, 1);
    assert_eq!(summary.counts.negative, 1);
    assert_eq!(summary.counts.neutral, 0);

    // Percentages divide by the full total, failure included.
    assert!((summary.percentages.positive - 100.0 / 3.0).abs() < 1e-9);

    // Average confidence covers the two succeeded results only.
    let expected = (first.confidence + second.confidence) / 2.0;
    assert!((summary.average_confidence - expected).abs() < 1e-9);

    // Re-observing the same window yields nothing new.
    assert!(watermark.filter_new("family", &batch).is_empty());
}

#[tokio::test]
async fn test_incremental_observation_only_processes_new_messages() {
    let mut watermark = IngestionWatermark::new();
    let pipeline = ConversationPipeline::new(&ConversenseConfig::default()).unwrap();
    let sink = MemorySink::new();

    let first_window = vec![
        message("m1", "such a great day", 100),
        message("m2", "what a terrible idea", 200),
    ];
    let fresh = watermark.filter_new("family", &first_window);
    for result in pipeline.run_batch(&fresh).await {
        sink.store(&result).await.unwrap();
    }
    assert_eq!(sink.results().len(), 2);

    // The next observation window overlaps the first; only the genuinely
    // new message is analyzed and stored.
    let second_window = vec![
        message("m2", "what a terrible idea", 200),
        message("m3", "fine, thanks", 300),
    ];
    let fresh = watermark.filter_new("family", &second_window);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].id, "m3");
    for result in pipeline.run_batch(&fresh).await {
        sink.store(&result).await.unwrap();
    }

    let stored = sink.results();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2].message_id, "m3");
}

#[tokio::test]
async fn test_document_store_stays_idempotent_across_reingestion() {
    let store = MemoryDocumentStore::new();

    // The same logical message observed twice (different source-assigned
    // ids) keys to the same document.
    let observed_once = message("m1", "I love this!!!", 100);
    let mut observed_again = observed_once.clone();
    observed_again.id = "m1-retry".to_string();

    let doc = ConversationDocument::from_message(&observed_once, Some(SentimentLabel::Positive));
    let doc_again =
        ConversationDocument::from_message(&observed_again, Some(SentimentLabel::Positive));
    assert_eq!(doc.key, doc_again.key);

    store.add(&doc).await.unwrap();
    store.add(&doc_again).await.unwrap();
    assert_eq!(store.documents().len(), 1);

    let stored = &store.documents()[0];
    assert_eq!(stored.metadata["conversation_id"], "family");
    assert_eq!(stored.metadata["label"], "positive");
}
