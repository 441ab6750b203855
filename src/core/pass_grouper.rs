use crate::types::{BurstAcquisition, CatalogError, CatalogResult, PASS_CYCLE_SECONDS};
use chrono::{DateTime, Utc};

/// Acquisition labeled with its satellite-pass bucket
#[derive(Debug, Clone, PartialEq)]
pub struct PassLabeled {
    pub acquisition: BurstAcquisition,
    pub pass_id: i64,
}

/// Bucket a single timestamp into a 6-day pass cycle relative to an epoch.
///
/// Boundary timestamps round down: a delta of exactly one cycle lands in
/// pass 1. Timestamps before the epoch are invalid input.
pub fn pass_id_for(acq_dt: DateTime<Utc>, epoch: DateTime<Utc>) -> CatalogResult<i64> {
    let delta_seconds = (acq_dt - epoch).num_seconds();
    if delta_seconds < 0 {
        return Err(CatalogError::InvalidTimestamp {
            timestamp: acq_dt,
            epoch,
        });
    }
    Ok(delta_seconds / PASS_CYCLE_SECONDS)
}

/// Label every acquisition of one tile's acquisition group with its pass id.
///
/// The epoch is the earliest timestamp in the group, so the labeling
/// depends only on the acquisition set, not on input row order. Output
/// preserves input order.
pub fn assign_pass_ids(acquisitions: &[BurstAcquisition]) -> CatalogResult<Vec<PassLabeled>> {
    let epoch = match acquisitions.iter().map(|a| a.acq_dt).min() {
        Some(epoch) => epoch,
        None => return Ok(Vec::new()),
    };
    acquisitions
        .iter()
        .map(|acq| {
            Ok(PassLabeled {
                acquisition: acq.clone(),
                pass_id: pass_id_for(acq.acq_dt, epoch)?,
            })
        })
        .collect()
}

/// Distinct pass ids present in a labeled set, most recent first
pub fn pass_ids_descending(labeled: &[PassLabeled]) -> Vec<i64> {
    let mut pass_ids: Vec<i64> = labeled.iter().map(|l| l.pass_id).collect();
    pass_ids.sort_unstable_by(|a, b| b.cmp(a));
    pass_ids.dedup();
    pass_ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, PolarizationMode};
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn acq(burst_id: &str, when: &str) -> BurstAcquisition {
        BurstAcquisition {
            scene_id: format!("S1_{}_{}", burst_id, when),
            burst_id: burst_id.to_string(),
            acq_dt: dt(when),
            polarization_mode: PolarizationMode::VvVh,
            url_copol: "https://example.com/vv.tif".to_string(),
            url_crosspol: "https://example.com/vh.tif".to_string(),
            track_number: 148,
            footprint: BoundingBox::new(-52.0, -51.0, 0.0, 1.0),
        }
    }

    #[test]
    fn test_pass_ids_bucket_by_six_days() {
        let acqs = vec![
            acq("T148_100001_IW1", "2024-01-01 06:00:00"),
            acq("T148_100001_IW1", "2024-01-07 06:00:00"),
            acq("T148_100001_IW1", "2024-01-13 05:59:59"),
        ];
        let labeled = assign_pass_ids(&acqs).unwrap();
        let ids: Vec<i64> = labeled.iter().map(|l| l.pass_id).collect();
        // Exactly 6 days floors into pass 1; one second short stays in it
        assert_eq!(ids, vec![0, 1, 1]);
    }

    #[test]
    fn test_bucketing_invariant_under_permutation() {
        let acqs = vec![
            acq("T148_100001_IW1", "2024-01-13 06:00:00"),
            acq("T148_100002_IW2", "2024-01-01 06:00:00"),
            acq("T148_100001_IW1", "2024-01-07 06:00:30"),
        ];
        let mut reversed = acqs.clone();
        reversed.reverse();

        let labeled = assign_pass_ids(&acqs).unwrap();
        let labeled_rev = assign_pass_ids(&reversed).unwrap();

        let mut pairs: Vec<(DateTime<Utc>, i64)> =
            labeled.iter().map(|l| (l.acquisition.acq_dt, l.pass_id)).collect();
        let mut pairs_rev: Vec<(DateTime<Utc>, i64)> =
            labeled_rev.iter().map(|l| (l.acquisition.acq_dt, l.pass_id)).collect();
        pairs.sort();
        pairs_rev.sort();
        assert_eq!(pairs, pairs_rev);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(assign_pass_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_negative_delta_rejected() {
        let err = pass_id_for(dt("2024-01-01 00:00:00"), dt("2024-02-01 00:00:00")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_pass_ids_descending_dedups() {
        let acqs = vec![
            acq("T148_100001_IW1", "2024-01-01 06:00:00"),
            acq("T148_100002_IW2", "2024-01-01 06:00:20"),
            acq("T148_100001_IW1", "2024-01-13 06:00:00"),
            acq("T148_100001_IW1", "2024-01-25 06:00:00"),
        ];
        let labeled = assign_pass_ids(&acqs).unwrap();
        assert_eq!(pass_ids_descending(&labeled), vec![4, 2, 0]);
    }
}
