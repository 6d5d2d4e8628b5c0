//! Data models for Conversense.

mod analysis;
mod message;

pub use analysis::{
    AnalysisFailure, AnalysisResult, EmotionalIntensity, EstimatorReport, EstimatorVerdict,
    FusedVerdict, Insights, LabelCounts, LabelPercentages, SentimentLabel, SummaryAggregate,
};
pub use message::{Message, MessageKind, Platform};
