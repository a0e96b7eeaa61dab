//! Report formatting.
//!
//! Turns rendered sections into text, Markdown or JSON documents.

pub mod generator;

pub use generator::{generate_report, ReportContext};
