//! Reference tables and acquisition-table ingestion

pub mod metadata;
pub mod reference;

// Re-export main types
pub use metadata::{normalize_acquisitions, summarize_by_burst, AcquisitionRecord};
pub use reference::{BurstAttributes, ReferenceStore};
