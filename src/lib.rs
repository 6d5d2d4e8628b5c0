//! conversense - Conversation ingestion and sentiment analysis system.
//!
//! Core library: incremental ingestion with per-conversation watermarks,
//! multi-estimator sentiment fusion, insight extraction, and the
//! contracts for external message sources and result/document sinks.

// Model types use `from_str` methods that return Self (infallible parse),
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod estimator;
pub mod fusion;
pub mod insights;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod watermark;
