//! Final shape confidence
//!
//! The mean per-component confidence is adjusted by how much of the pool the
//! assignment consumed: unused pool members cost a penalty, consuming the
//! whole pool earns a bonus, and both adjustments are dropped when the pool
//! is so much larger than the definition that usage says nothing.

use crate::config::BuilderConfig;

/// How a confidence was derived, for logging and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBreakdown {
    /// Mean of the per-component confidences
    pub base: f64,
    pub penalty: f64,
    pub bonus_applied: bool,
    /// The pool was large enough to disable both adjustments
    pub noisy_pool: bool,
    pub confidence: f64,
}

/// Combine per-component confidences into the shape confidence
///
/// `used` is the number of assigned candidates and `pool` the size of the
/// pool the build started from.
pub fn aggregate(confidences: &[f64], used: usize, pool: usize, config: &BuilderConfig) -> ConfidenceBreakdown {
    let required = confidences.len();
    let base = if required == 0 {
        0.0
    } else {
        confidences.iter().sum::<f64>() / required as f64
    };

    let penalty = config.unused_penalty * pool.saturating_sub(used) as f64;
    let mut confidence = (base - penalty).max(0.0);

    let mut bonus_applied = false;
    if used == pool && confidence < config.full_use_ceiling {
        confidence += config.full_use_bonus;
        bonus_applied = true;
    }

    let noisy_pool = pool > required + config.noisy_pool_margin;
    if noisy_pool {
        confidence = base;
        bonus_applied = false;
    }

    ConfidenceBreakdown {
        base,
        penalty,
        bonus_applied,
        noisy_pool,
        confidence: confidence.clamp(0.0, 1.0),
    }
}
