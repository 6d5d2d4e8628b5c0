//! Command-line interface for conversense.

mod commands;

pub use commands::{is_verbose, run};
