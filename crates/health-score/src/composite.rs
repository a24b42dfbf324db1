use serde::{Deserialize, Serialize};

use crate::config::CompositeWeights;
use crate::resilience::MAX_LEVEL;

/// Sub-scores after neutral fallback, each on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeBreakdown {
    pub core_health: f64,
    pub growth: f64,
    pub resilience: f64,
    pub composite: u8,
}

/// Round a 0-10 value to the nearest integer score.
pub fn to_score(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 10.0).round() as u8
}

pub struct CompositeAggregator<'a> {
    weights: &'a CompositeWeights,
}

impl<'a> CompositeAggregator<'a> {
    pub fn new(weights: &'a CompositeWeights) -> Self {
        Self { weights }
    }

    /// Blend the three sub-scores. Undefined inputs fall back to neutral, so
    /// this always produces a score.
    pub fn aggregate(
        &self,
        core_health: Option<f64>,
        growth: Option<f64>,
        resilience_level: Option<u8>,
    ) -> CompositeBreakdown {
        let w = self.weights;
        let core_health = core_health
            .filter(|v| v.is_finite())
            .unwrap_or(w.neutral_score);
        let growth = growth.filter(|v| v.is_finite()).unwrap_or(w.neutral_score);
        let level = resilience_level
            .map(|l| l.min(MAX_LEVEL) as f64)
            .unwrap_or(w.neutral_resilience_level);
        let resilience = level / MAX_LEVEL as f64 * 10.0;

        let mut blended = core_health * w.core_health + growth * w.growth + resilience * w.resilience;
        if !blended.is_finite() {
            tracing::warn!("Non-finite composite blend {}, using neutral score", blended);
            blended = w.neutral_score;
        }

        CompositeBreakdown {
            core_health,
            growth,
            resilience,
            composite: to_score(blended),
        }
    }
}
