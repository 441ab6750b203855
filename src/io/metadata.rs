use crate::types::{
    BoundingBox, BurstAcquisition, BurstSummary, CatalogError, CatalogResult, PolarizationMode,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// Raw acquisition row as delivered by the metadata-search collaborator.
///
/// The search itself is external; callers localize the provider response
/// into this schema and hand the whole table to `normalize_acquisitions`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AcquisitionRecord {
    pub scene_id: String,
    pub burst_id: String,
    pub acq_dt: DateTime<Utc>,
    /// Dual-pol mode string, "VV+VH" or "HH+HV"
    pub polarization: String,
    pub url_copol: String,
    pub url_crosspol: String,
    pub track_number: u16,
    pub footprint: BoundingBox,
}

/// Sentinel-1 relative orbits cycle 1..=175
const TRACK_NUMBER_MAX: u16 = 175;

/// Validate, sort and deduplicate a raw acquisition table.
///
/// Rows are sorted by (burst_id, acq_dt) ascending; duplicates are then
/// dropped on the first five underscore-delimited tokens of the scene id
/// (reprocessed scenes differ only in later tokens), keeping the first
/// occurrence. Burst ids are normalized to the upper-case underscore
/// syntax, e.g. "t148-100001-iw1" becomes "T148_100001_IW1".
pub fn normalize_acquisitions(
    records: Vec<AcquisitionRecord>,
) -> CatalogResult<Vec<BurstAcquisition>> {
    let burst_id_re = Regex::new(r"^[Tt]\d{1,3}[-_]\d{6}[-_][Ii][Ww][1-3]$")
        .map_err(|e| CatalogError::InvalidFormat(format!("burst id pattern: {}", e)))?;

    let mut acquisitions = Vec::with_capacity(records.len());
    for record in records {
        if !burst_id_re.is_match(&record.burst_id) {
            return Err(CatalogError::InvalidFormat(format!(
                "malformed burst id: {}",
                record.burst_id
            )));
        }
        if record.scene_id.is_empty() {
            return Err(CatalogError::InvalidFormat(
                "empty scene id".to_string(),
            ));
        }
        if record.url_copol.is_empty() || record.url_crosspol.is_empty() {
            return Err(CatalogError::InvalidFormat(format!(
                "missing product url for scene {}",
                record.scene_id
            )));
        }
        if record.track_number == 0 || record.track_number > TRACK_NUMBER_MAX {
            return Err(CatalogError::InvalidFormat(format!(
                "track number {} out of range 1..={}",
                record.track_number, TRACK_NUMBER_MAX
            )));
        }
        let polarization_mode = PolarizationMode::parse(&record.polarization)?;
        acquisitions.push(BurstAcquisition {
            burst_id: record.burst_id.to_uppercase().replace('-', "_"),
            scene_id: record.scene_id,
            acq_dt: record.acq_dt,
            polarization_mode,
            url_copol: record.url_copol,
            url_crosspol: record.url_crosspol,
            track_number: record.track_number,
            footprint: record.footprint,
        });
    }

    acquisitions.sort_by(|a, b| {
        a.burst_id
            .cmp(&b.burst_id)
            .then_with(|| a.acq_dt.cmp(&b.acq_dt))
    });

    let before = acquisitions.len();
    let mut seen = HashSet::new();
    acquisitions.retain(|acq| seen.insert(dedup_key(&acq.scene_id)));
    if acquisitions.len() < before {
        log::debug!(
            "Dropped {} duplicate acquisition(s) during normalization",
            before - acquisitions.len()
        );
    }
    Ok(acquisitions)
}

/// Scene identity for deduplication: the first five underscore-delimited
/// tokens (mission, mode, burst, timestamp, version prefix).
fn dedup_key(scene_id: &str) -> String {
    scene_id
        .split('_')
        .take(5)
        .collect::<Vec<&str>>()
        .join("_")
}

/// Per-burst count and time-span aggregation of a normalized table
pub fn summarize_by_burst(acquisitions: &[BurstAcquisition]) -> Vec<BurstSummary> {
    let mut by_burst: BTreeMap<&str, Vec<DateTime<Utc>>> = BTreeMap::new();
    for acq in acquisitions {
        by_burst.entry(&acq.burst_id).or_default().push(acq.acq_dt);
    }
    by_burst
        .into_iter()
        .map(|(burst_id, dts)| {
            let earliest = dts.iter().min().copied().unwrap_or_default();
            let latest = dts.iter().max().copied().unwrap_or_default();
            BurstSummary {
                burst_id: burst_id.to_string(),
                count: dts.len(),
                earliest_acq_dt: earliest,
                latest_acq_dt: latest,
            }
        })
        .collect()
}
