use crate::models::TrustTier;

/// Thresholds mapping a trust score onto a [`TrustTier`].
///
/// A score strictly above `high_above` is HIGH, strictly below `low_below` is
/// LOW, anything in between is MEDIUM. Requiring `low_below <= high_above`
/// keeps the mapping monotonic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustTierPolicy {
    high_above: f64,
    low_below: f64,
}

impl TrustTierPolicy {
    pub fn new(high_above: f64, low_below: f64) -> anyhow::Result<Self> {
        if !high_above.is_finite() || !low_below.is_finite() {
            anyhow::bail!("Trust tier thresholds must be finite numbers");
        }
        if low_below > high_above {
            anyhow::bail!(
                "Trust tier LOW threshold ({}) cannot exceed HIGH threshold ({})",
                low_below,
                high_above
            );
        }
        Ok(Self {
            high_above,
            low_below,
        })
    }

    pub fn classify(&self, score: f64) -> TrustTier {
        if score > self.high_above {
            TrustTier::High
        } else if score < self.low_below {
            TrustTier::Low
        } else {
            TrustTier::Medium
        }
    }
}

impl Default for TrustTierPolicy {
    fn default() -> Self {
        Self {
            high_above: 80.0,
            low_below: 40.0,
        }
    }
}
