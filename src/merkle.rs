//! Merkle aggregation of one claim's score batch.
//!
//! Leaves are the fingerprints of each score's textual form in submission
//! order; each parent is the fingerprint of `left_hex || right_hex`. A level
//! with an odd node count pairs its last node with itself. Leaf order is part
//! of the committed value.

use crate::crypto::{fingerprint, fingerprint_str};
use crate::error::LedgerError;

/// Root fingerprint plus sample statistics for one claim.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub root_hash: String,
    pub mean: f64,
    /// Sample variance (n - 1 denominator).
    pub variance: f64,
    pub standard_deviation: f64,
}

/// Root fingerprint over the scores in order. None iff `scores` is empty.
pub fn merkle_root(scores: &[f64]) -> Option<String> {
    if scores.is_empty() {
        return None;
    }
    let mut level: Vec<String> = scores
        .iter()
        .map(|s| fingerprint_str(&s.to_string()))
        .collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next.push(fingerprint(&[left.as_bytes(), right.as_bytes()]));
        }
        level = next;
    }

    level.pop()
}

/// Reduce a claim's scores to its Merkle root and sample mean/variance/stdev.
pub fn aggregate(scores: &[f64]) -> Result<Aggregate, LedgerError> {
    let n = scores.len();
    if n < 2 {
        return Err(LedgerError::InsufficientSamples { count: n });
    }
    let root_hash = merkle_root(scores).ok_or(LedgerError::InsufficientSamples { count: n })?;

    let (mean, variance) = running_mean_variance(scores);
    if !mean.is_finite() || !variance.is_finite() {
        return Err(LedgerError::NonFiniteStatistics);
    }

    Ok(Aggregate {
        root_hash,
        mean,
        variance,
        standard_deviation: variance.sqrt(),
    })
}

/// Welford update; no running sum, so large finite scores do not overflow the mean.
/// Needs `scores.len() >= 2`.
fn running_mean_variance(scores: &[f64]) -> (f64, f64) {
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, &x) in scores.iter().enumerate() {
        let k = (i + 1) as f64;
        let delta = x - mean;
        let next = if delta.is_finite() {
            mean + delta / k
        } else {
            // x and mean of opposite sign near f64::MAX
            mean + (x / k - mean / k)
        };
        m2 += (x - mean) * (x - next);
        mean = next;
    }
    (mean, m2 / (scores.len() - 1) as f64)
}
