//! Core library for German retail-receipt (Kassenbon) parsing.
//!
//! This crate provides:
//! - PDF text extraction (per-document line streams)
//! - The receipt line-interpretation engine: region segmentation, item
//!   tokenization, weight-based pricing, continuation merging, noise
//!   filtering, total reconciliation
//! - Receipt data models and pipeline configuration

pub mod error;
pub mod models;
pub mod pdf;
pub mod receipt;

pub use error::{BonexError, Result};
pub use models::config::{BonexConfig, ParserConfig, PdfConfig};
pub use models::receipt::{LineItem, ParseMetadata, Receipt};
pub use pdf::{LineSource, PdfExtractor};
pub use receipt::{LineClassifier, ParsedReceipt, ReceiptParser};
