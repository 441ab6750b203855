use crate::core::pass_grouper::PassLabeled;
use crate::types::BurstAcquisition;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Pre/post pairing parameters
#[derive(Debug, Clone)]
pub struct PairingParams {
    /// Furthest back a pre image may lie before the post anchor, in days
    pub lookback_days: i64,
    /// Most recent pre images kept per burst
    pub max_pre_images_per_burst: usize,
    /// Bursts with fewer surviving pre images are dropped
    pub min_pre_images_per_burst: usize,
}

impl Default for PairingParams {
    fn default() -> Self {
        Self {
            lookback_days: 365,
            max_pre_images_per_burst: 10,
            min_pre_images_per_burst: 2,
        }
    }
}

/// Pre/post row sets surviving the pairing invariants for one pass
#[derive(Debug, Clone)]
pub struct PassPairing {
    pub pass_id: i64,
    /// Earliest post acquisition; the lookback window is anchored here
    pub post_anchor: DateTime<Utc>,
    /// Ascending by acquisition time (ties broken by burst id)
    pub pre: Vec<BurstAcquisition>,
    pub post: Vec<BurstAcquisition>,
}

/// Pair the target pass with its bounded pre-image history.
///
/// Returns `None` when the pass has no post rows or when no burst survives
/// the coverage and minimum-pre invariants; the bulk enumeration loop
/// skips such passes silently.
pub fn pair_pass(
    labeled: &[PassLabeled],
    pass_id: i64,
    params: &PairingParams,
) -> Option<PassPairing> {
    let post: Vec<BurstAcquisition> = labeled
        .iter()
        .filter(|l| l.pass_id == pass_id)
        .map(|l| l.acquisition.clone())
        .collect();
    let post_anchor = post.iter().map(|a| a.acq_dt).min()?;

    let window_start = post_anchor - Duration::days(params.lookback_days);
    let pre: Vec<BurstAcquisition> = labeled
        .iter()
        .filter(|l| l.acquisition.acq_dt >= window_start && l.acquisition.acq_dt < post_anchor)
        .map(|l| l.acquisition.clone())
        .collect();

    let pre = truncate_pre_per_burst(pre, params.max_pre_images_per_burst);
    let (pre, post) = filter_invariants(pre, post, params.min_pre_images_per_burst);
    if pre.is_empty() || post.is_empty() {
        return None;
    }
    Some(PassPairing {
        pass_id,
        post_anchor,
        pre,
        post,
    })
}

/// Keep only the most recent `max_per_burst` pre images per burst.
///
/// Output is sorted ascending by (acq_dt, burst_id).
pub(crate) fn truncate_pre_per_burst(
    pre: Vec<BurstAcquisition>,
    max_per_burst: usize,
) -> Vec<BurstAcquisition> {
    let mut by_burst: BTreeMap<String, Vec<BurstAcquisition>> = BTreeMap::new();
    for acq in pre {
        by_burst.entry(acq.burst_id.clone()).or_default().push(acq);
    }
    let mut out = Vec::new();
    for (_, mut acqs) in by_burst {
        acqs.sort_by_key(|a| a.acq_dt);
        // Tail truncation: the oldest rows beyond the cap are dropped
        if acqs.len() > max_per_burst {
            acqs.drain(..acqs.len() - max_per_burst);
        }
        out.extend(acqs);
    }
    out.sort_by(|a, b| {
        a.acq_dt
            .cmp(&b.acq_dt)
            .then_with(|| a.burst_id.cmp(&b.burst_id))
    });
    out
}

/// Enforce the pairing invariants: a burst must appear with both roles,
/// and with at least `min_pre` pre images.
pub(crate) fn filter_invariants(
    pre: Vec<BurstAcquisition>,
    post: Vec<BurstAcquisition>,
    min_pre: usize,
) -> (Vec<BurstAcquisition>, Vec<BurstAcquisition>) {
    let mut pre_counts: HashMap<&str, usize> = HashMap::new();
    for acq in &pre {
        *pre_counts.entry(acq.burst_id.as_str()).or_insert(0) += 1;
    }
    let post_bursts: HashSet<&str> = post.iter().map(|a| a.burst_id.as_str()).collect();

    let surviving: HashSet<String> = pre_counts
        .iter()
        .filter(|(burst_id, count)| post_bursts.contains(*burst_id) && **count >= min_pre)
        .map(|(burst_id, _)| burst_id.to_string())
        .collect();

    let pre = pre
        .into_iter()
        .filter(|a| surviving.contains(&a.burst_id))
        .collect();
    let post = post
        .into_iter()
        .filter(|a| surviving.contains(&a.burst_id))
        .collect();
    (pre, post)
}
