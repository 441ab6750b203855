//! Core enumeration modules

pub mod enumerator;
pub mod jobs;
pub mod pairing;
pub mod pass_grouper;

// Re-export main types
pub use enumerator::{enumerate_one_product, enumerate_products, SingleProductParams};
pub use jobs::extract_job_descriptors;
pub use pairing::{pair_pass, PairingParams, PassPairing};
pub use pass_grouper::{assign_pass_ids, pass_id_for, pass_ids_descending, PassLabeled};
