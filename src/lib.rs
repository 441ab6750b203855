//! burstcat: Sentinel-1 RTC burst product enumeration
//!
//! This library catalogs Sentinel-1 radiometric-terrain-corrected (RTC)
//! burst imagery into change-detection products: a post-event satellite
//! pass over an MGRS tile paired with a bounded history of pre-event
//! passes per burst. Acquisition metadata and file download are the
//! caller's concern; the crate operates on a normalized in-memory table
//! plus read-only spatial reference tables.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, BurstAcquisition, BurstLutEntry, BurstSummary, CatalogError, CatalogResult,
    InputCategory, JobDescriptor, MgrsTileRecord, OrbitPass, PolarizationMode, Product,
    ProductRow,
};

pub use crate::core::{
    enumerate_one_product, enumerate_products, extract_job_descriptors, PairingParams,
    SingleProductParams,
};
pub use io::{normalize_acquisitions, summarize_by_burst, AcquisitionRecord, ReferenceStore};
