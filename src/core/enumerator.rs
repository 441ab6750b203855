use crate::core::pairing::{
    filter_invariants, pair_pass, truncate_pre_per_burst, PairingParams, PassPairing,
};
use crate::core::pass_grouper::{assign_pass_ids, pass_id_for, pass_ids_descending};
use crate::io::reference::ReferenceStore;
use crate::types::{
    BurstAcquisition, CatalogError, CatalogResult, InputCategory, Product, ProductRow,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// A post pass is one physical overpass: its burst acquisitions must fall
/// within this many seconds of each other
const POST_PASS_MAX_VARIATION_SECONDS: i64 = 300;

/// Parameters for the single-product convenience path
#[derive(Debug, Clone)]
pub struct SingleProductParams {
    /// Search half-width around the requested post date; must stay below
    /// the 6-day pass length
    pub post_date_buffer_days: i64,
    pub max_pre_images_per_burst: usize,
    pub min_pre_images_per_burst: usize,
    /// Width of the pre-image search window, in days
    pub delta_window_days: i64,
    /// Gap between the post anchor and the newest acceptable pre image
    pub delta_lookback_days: i64,
}

impl Default for SingleProductParams {
    fn default() -> Self {
        Self {
            post_date_buffer_days: 1,
            max_pre_images_per_burst: 10,
            min_pre_images_per_burst: 2,
            delta_window_days: 365,
            delta_lookback_days: 0,
        }
    }
}

/// Enumerate all products for the requested tiles from a normalized
/// acquisition table.
///
/// Iteration order is tile order, then LUT group order, then passes most
/// recent first; `product_id` is a single counter across the whole call
/// and is only advanced when a pass survives the pairing invariants.
/// Groups without acquisitions and passes without surviving bursts are
/// skipped silently.
pub fn enumerate_products(
    store: &ReferenceStore,
    acquisitions: &[BurstAcquisition],
    mgrs_tile_ids: &[&str],
    params: &PairingParams,
) -> CatalogResult<Vec<Product>> {
    let lut_all = store.lut_for_tiles(mgrs_tile_ids)?;

    let mut products = Vec::new();
    let mut product_id: u64 = 0;
    for tile_id in mgrs_tile_ids {
        log::info!("Enumerating products for MGRS tile {}", tile_id);
        let tile_rows: Vec<_> = lut_all
            .iter()
            .filter(|e| e.mgrs_tile_id == *tile_id)
            .collect();

        // Distinct group ids in LUT-row order
        let mut group_ids = Vec::new();
        for row in &tile_rows {
            if !group_ids.contains(&row.acq_group_id_within_mgrs_tile) {
                group_ids.push(row.acq_group_id_within_mgrs_tile);
            }
        }

        for group_id in group_ids {
            let member_bursts: HashSet<&str> = tile_rows
                .iter()
                .filter(|e| e.acq_group_id_within_mgrs_tile == group_id)
                .map(|e| e.burst_id.as_str())
                .collect();
            let subset: Vec<BurstAcquisition> = acquisitions
                .iter()
                .filter(|a| member_bursts.contains(a.burst_id.as_str()))
                .cloned()
                .collect();
            if subset.is_empty() {
                log::debug!(
                    "No acquisitions for group {} in tile {}, skipping",
                    group_id,
                    tile_id
                );
                continue;
            }

            let labeled = assign_pass_ids(&subset)?;
            for pass_id in pass_ids_descending(&labeled) {
                match pair_pass(&labeled, pass_id, params) {
                    Some(pairing) => {
                        products.push(build_product(product_id, tile_id, group_id, pairing));
                        product_id += 1;
                    }
                    None => {
                        log::debug!(
                            "Pass {} of group {} in tile {} has no qualifying bursts",
                            pass_id,
                            group_id,
                            tile_id
                        );
                    }
                }
            }
        }
    }
    log::info!(
        "Enumerated {} product(s) across {} tile(s)",
        products.len(),
        mgrs_tile_ids.len()
    );
    Ok(products)
}

/// Enumerate a single product from its unique identifiers: MGRS tile,
/// track number and approximate post-image date.
///
/// Runs FETCH_POST → VALIDATE_POST_WINDOW → FETCH_PRE → ASSEMBLE; any
/// stage left without rows fails with `InsufficientPreImagery`, unlike
/// the bulk path which skips such passes.
pub fn enumerate_one_product(
    store: &ReferenceStore,
    acquisitions: &[BurstAcquisition],
    mgrs_tile_id: &str,
    track_number: u16,
    post_date: DateTime<Utc>,
    params: &SingleProductParams,
) -> CatalogResult<Product> {
    if params.post_date_buffer_days >= 6 {
        return Err(CatalogError::InvalidPostWindow(params.post_date_buffer_days));
    }

    let (group_id, group_rows) = store.group_for_tracks(mgrs_tile_id, &[track_number])?;
    let member_bursts: HashSet<&str> =
        group_rows.iter().map(|e| e.burst_id.as_str()).collect();
    let subset: Vec<&BurstAcquisition> = acquisitions
        .iter()
        .filter(|a| member_bursts.contains(a.burst_id.as_str()))
        .collect();

    let insufficient = || CatalogError::InsufficientPreImagery {
        mgrs_tile_id: mgrs_tile_id.to_string(),
        track_number,
    };

    // FETCH_POST: latest acquisition per burst inside the post window
    let buffer = Duration::days(params.post_date_buffer_days);
    let mut post: Vec<BurstAcquisition> = Vec::new();
    for burst_id in &member_bursts {
        let latest = subset
            .iter()
            .filter(|a| {
                a.burst_id == *burst_id
                    && a.acq_dt >= post_date - buffer
                    && a.acq_dt <= post_date + buffer
            })
            .max_by_key(|a| a.acq_dt);
        if let Some(acq) = latest {
            post.push((*acq).clone());
        }
    }
    let latest_post = post.iter().map(|a| a.acq_dt).max().ok_or_else(insufficient)?;

    // VALIDATE_POST_WINDOW: keep only the overpass containing the latest
    // acquisition
    let variation = Duration::seconds(POST_PASS_MAX_VARIATION_SECONDS);
    post.retain(|a| a.acq_dt > latest_post - variation);
    post.sort_by(|a, b| a.burst_id.cmp(&b.burst_id));
    let post_anchor = post
        .iter()
        .map(|a| a.acq_dt)
        .min()
        .ok_or_else(insufficient)?;

    // FETCH_PRE
    let window_start =
        post_anchor - Duration::days(params.delta_window_days + params.delta_lookback_days);
    let window_stop = post_anchor - Duration::days(params.delta_lookback_days);
    let pre: Vec<BurstAcquisition> = subset
        .iter()
        .filter(|a| a.acq_dt >= window_start && a.acq_dt < window_stop)
        .map(|a| (*a).clone())
        .collect();
    let pre = truncate_pre_per_burst(pre, params.max_pre_images_per_burst);
    if pre.is_empty() {
        return Err(insufficient());
    }

    // ASSEMBLE
    let (pre, post) = filter_invariants(pre, post, params.min_pre_images_per_burst);
    if pre.is_empty() || post.is_empty() {
        return Err(insufficient());
    }

    // Pass id relative to the earliest surviving acquisition
    let epoch = pre
        .iter()
        .chain(post.iter())
        .map(|a| a.acq_dt)
        .min()
        .ok_or_else(insufficient)?;
    let pass_id = pass_id_for(post_anchor, epoch)?;

    Ok(build_product(
        0,
        mgrs_tile_id,
        group_id,
        PassPairing {
            pass_id,
            post_anchor,
            pre,
            post,
        },
    ))
}

fn build_product(
    product_id: u64,
    mgrs_tile_id: &str,
    acq_group_id_within_mgrs_tile: u32,
    pairing: PassPairing,
) -> Product {
    let pass_id = pairing.pass_id;
    let row = |acquisition: BurstAcquisition, input_category| ProductRow {
        acquisition,
        product_id,
        mgrs_tile_id: mgrs_tile_id.to_string(),
        acq_group_id_within_mgrs_tile,
        pass_id,
        input_category,
    };
    let mut rows = Vec::with_capacity(pairing.pre.len() + pairing.post.len());
    rows.extend(pairing.pre.into_iter().map(|a| row(a, InputCategory::Pre)));
    rows.extend(pairing.post.into_iter().map(|a| row(a, InputCategory::Post)));
    Product {
        product_id,
        mgrs_tile_id: mgrs_tile_id.to_string(),
        acq_group_id_within_mgrs_tile,
        pass_id,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, BurstGeometryRecord, BurstLutEntry, MgrsTileRecord,
        OrbitPass, PolarizationMode};
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn acq(burst_id: &str, when: DateTime<Utc>, seq: usize) -> BurstAcquisition {
        BurstAcquisition {
            scene_id: format!("S1_{}_{}_A_B", burst_id, seq),
            burst_id: burst_id.to_string(),
            acq_dt: when,
            polarization_mode: PolarizationMode::VvVh,
            url_copol: "https://example.com/vv.tif".to_string(),
            url_crosspol: "https://example.com/vh.tif".to_string(),
            track_number: 148,
            footprint: BoundingBox::new(-52.0, -51.0, 0.0, 1.0),
        }
    }

    fn lut_row(burst_id: &str, tile: &str, track: u16, group: u32) -> BurstLutEntry {
        BurstLutEntry {
            burst_id: burst_id.to_string(),
            mgrs_tile_id: tile.to_string(),
            track_number: track,
            acq_group_id_within_mgrs_tile: group,
            orbit_pass: OrbitPass::Descending,
            area_per_acq_group_km2: 1200,
            n_bursts_per_acq_group: 2,
        }
    }

    fn store() -> ReferenceStore {
        ReferenceStore::new(
            vec![MgrsTileRecord {
                mgrs_tile_id: "11SLT".to_string(),
                utm_epsg: 32611,
                utm_wkt: String::new(),
                geometry: BoundingBox::new(-118.0, -117.0, 34.0, 35.0),
            }],
            vec![
                BurstGeometryRecord {
                    burst_id: "T071_151224_IW1".to_string(),
                    geometry: BoundingBox::new(-118.0, -117.5, 34.0, 34.5),
                },
                BurstGeometryRecord {
                    burst_id: "T071_151225_IW1".to_string(),
                    geometry: BoundingBox::new(-118.0, -117.5, 34.4, 34.9),
                },
            ],
            vec![
                lut_row("T071_151224_IW1", "11SLT", 71, 0),
                lut_row("T071_151225_IW1", "11SLT", 71, 0),
            ],
        )
    }

    /// Two bursts revisited every 6 days, `n` passes, 10 s apart per pass
    fn two_burst_series(n: usize) -> Vec<BurstAcquisition> {
        let start = dt("2024-01-01 13:30:00");
        let mut acqs = Vec::new();
        for i in 0..n {
            let pass_start = start + Duration::days(6 * i as i64);
            acqs.push(acq("T071_151224_IW1", pass_start, i));
            acqs.push(acq(
                "T071_151225_IW1",
                pass_start + Duration::seconds(10),
                i,
            ));
        }
        acqs
    }

    #[test]
    fn test_bulk_enumeration_orders_passes_descending() {
        let products = enumerate_products(
            &store(),
            &two_burst_series(5),
            &["11SLT"],
            &PairingParams::default(),
        )
        .unwrap();
        // Passes 4, 3 and 2 have enough history for min_pre = 2
        assert_eq!(products.len(), 3);
        let pass_ids: Vec<i64> = products.iter().map(|p| p.pass_id).collect();
        assert_eq!(pass_ids, vec![4, 3, 2]);
        let product_ids: Vec<u64> = products.iter().map(|p| p.product_id).collect();
        assert_eq!(product_ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_bulk_enumeration_unknown_tile_fails() {
        let err = enumerate_products(
            &store(),
            &two_burst_series(3),
            &["11SLT", "99ZZZ"],
            &PairingParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::TileNotFound(_)));
    }

    #[test]
    fn test_bulk_enumeration_without_acquisitions_is_empty() {
        let products =
            enumerate_products(&store(), &[], &["11SLT"], &PairingParams::default()).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn test_single_product_happy_path() {
        let product = enumerate_one_product(
            &store(),
            &two_burst_series(5),
            "11SLT",
            71,
            dt("2024-01-25 00:00:00"),
            &SingleProductParams::default(),
        )
        .unwrap();
        assert_eq!(product.product_id, 0);
        assert_eq!(product.mgrs_tile_id, "11SLT");
        // Post pass of 2024-01-25, both bursts, full 4-pass history
        assert_eq!(product.rows_for(InputCategory::Post).count(), 2);
        assert_eq!(product.pre_count("T071_151224_IW1"), 4);
        assert_eq!(product.pre_count("T071_151225_IW1"), 4);
    }

    #[test]
    fn test_single_product_on_earliest_pass_fails() {
        let err = enumerate_one_product(
            &store(),
            &two_burst_series(5),
            "11SLT",
            71,
            dt("2024-01-01 00:00:00"),
            &SingleProductParams::default(),
        )
        .unwrap_err();
        match err {
            CatalogError::InsufficientPreImagery {
                mgrs_tile_id,
                track_number,
            } => {
                assert_eq!(mgrs_tile_id, "11SLT");
                assert_eq!(track_number, 71);
            }
            other => panic!("expected InsufficientPreImagery, got {:?}", other),
        }
    }

    #[test]
    fn test_single_product_rejects_wide_post_window() {
        let params = SingleProductParams {
            post_date_buffer_days: 6,
            ..SingleProductParams::default()
        };
        let err = enumerate_one_product(
            &store(),
            &two_burst_series(5),
            "11SLT",
            71,
            dt("2024-01-25 00:00:00"),
            &params,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPostWindow(6)));
    }

    #[test]
    fn test_single_product_post_pass_variation_cut() {
        // A straggler acquisition 2 hours after the pass must not widen
        // the post set
        let mut acqs = two_burst_series(5);
        let straggler = acq(
            "T071_151224_IW1",
            dt("2024-01-25 15:30:00"),
            99,
        );
        acqs.push(straggler);
        let product = enumerate_one_product(
            &store(),
            &acqs,
            "11SLT",
            71,
            dt("2024-01-25 00:00:00"),
            &SingleProductParams::default(),
        )
        .unwrap();
        let post: Vec<_> = product.rows_for(InputCategory::Post).collect();
        // Only the straggler's overpass survives the 300 s variation cut,
        // and the coverage invariant then limits the product to its burst
        assert!(post
            .iter()
            .all(|r| r.acquisition.acq_dt > dt("2024-01-25 15:00:00")));
    }
}
