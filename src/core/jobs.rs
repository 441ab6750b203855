use crate::types::{InputCategory, JobDescriptor, Product};

/// Extract one downstream workflow input per product.
///
/// The representative row is the earliest post acquisition: its calendar
/// date and track number, together with the tile and product id, are what
/// a processing job needs to re-locate the pass. Output follows product
/// order.
pub fn extract_job_descriptors(products: &[Product]) -> Vec<JobDescriptor> {
    products
        .iter()
        .filter_map(|product| {
            let representative = product
                .rows_for(InputCategory::Post)
                .min_by_key(|r| r.acquisition.acq_dt)?;
            Some(JobDescriptor {
                mgrs_tile_id: product.mgrs_tile_id.clone(),
                acq_date: representative.acquisition.acq_dt.date_naive(),
                track_number: representative.acquisition.track_number,
                product_id: product.product_id,
            })
        })
        .collect()
}
