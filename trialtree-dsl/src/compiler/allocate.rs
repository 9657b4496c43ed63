//! Trial allocation
//!
//! Each sequence receives `floor(proportion * total)` trials. What truncation
//! leaves over is either reported as is or handed out by largest fractional
//! quota, depending on [`RemainderPolicy`].

use trialtree_core::RemainderPolicy;

/// Slack added before truncating a quota, so that `0.3 * 10` lands on 3.
pub const ALLOCATION_EPSILON: f64 = 1e-9;

/// Trial counts per sequence plus what was left unassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub counts: Vec<u64>,
    pub remainder: u64,
}

impl Allocation {
    pub fn allocated(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Split `total` trials over sequences weighted by `proportions`.
///
/// `allocated() + remainder == total` always holds, even for proportions
/// that sum above 1.
pub fn allocate(proportions: &[f64], total: u64, policy: RemainderPolicy) -> Allocation {
    let mut counts = Vec::with_capacity(proportions.len());
    let mut fractions = Vec::with_capacity(proportions.len());
    let mut left = total;

    for (index, &proportion) in proportions.iter().enumerate() {
        let quota = proportion * total as f64;
        let floor = (quota + ALLOCATION_EPSILON).floor().max(0.0);
        let mut n = floor as u64;
        if n > left {
            tracing::warn!(index, quota, left, "Allocation capped by trials left");
            n = left;
        }
        left -= n;
        counts.push(n);
        fractions.push((index, quota - floor));
    }

    if policy == RemainderPolicy::LargestRemainder && left > 0 {
        fractions.retain(|&(_, fraction)| fraction > ALLOCATION_EPSILON);
        fractions.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        for (index, _) in fractions {
            if left == 0 {
                break;
            }
            counts[index] += 1;
            left -= 1;
        }
    }

    Allocation {
        counts,
        remainder: left,
    }
}
