//! Altman-Z-style solvency proxy, bucketed into a discrete 0-3 risk level.
//!
//! Z = 1.2·WC/A + 1.4·RE/A + 3.3·EBITDA/A + 0.6·MktCap/L + 1.0·Rev/A
//!
//! EBITDA stands in for EBIT and market cap for market value of equity. The
//! result is a discretized resilience signal, not a bankruptcy prediction.

use analysis_core::FundamentalsSnapshot;
use serde::{Deserialize, Serialize};

use crate::config::ResilienceConfig;

/// Highest resilience level (safe zone).
pub const MAX_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltmanRatios {
    pub working_capital_to_assets: f64,
    pub retained_earnings_to_assets: f64,
    pub ebitda_to_assets: f64,
    pub market_cap_to_liabilities: f64,
    pub revenue_to_assets: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceAssessment {
    pub z_score: f64,
    pub ratios: AltmanRatios,
    /// Level from the Z bands alone
    pub z_level: u8,
    /// Final level after the consecutive-loss penalty
    pub level: u8,
    pub loss_penalty_applied: bool,
    /// 0.0 to 10.0
    pub score: f64,
}

/// Clamp an overflowed ratio to the largest finite value of the same sign.
fn saturate(value: f64) -> f64 {
    value.clamp(-f64::MAX, f64::MAX)
}

pub struct ResilienceScorer<'a> {
    config: &'a ResilienceConfig,
}

impl<'a> ResilienceScorer<'a> {
    pub fn new(config: &'a ResilienceConfig) -> Self {
        Self { config }
    }

    /// All five ratios, or `None` if any operand is missing. Requires
    /// positive total assets and total liabilities.
    pub fn ratios(snapshot: &FundamentalsSnapshot) -> Option<AltmanRatios> {
        let assets = snapshot.total_assets.filter(|a| *a > 0.0)?;
        let liabilities = snapshot.total_liabilities.filter(|l| *l > 0.0)?;
        let working_capital = snapshot.working_capital.or_else(|| {
            Some(snapshot.total_current_assets? - snapshot.total_current_liabilities?)
        })?;

        Some(AltmanRatios {
            working_capital_to_assets: saturate(working_capital / assets),
            retained_earnings_to_assets: saturate(snapshot.retained_earnings? / assets),
            ebitda_to_assets: saturate(snapshot.ebitda? / assets),
            market_cap_to_liabilities: saturate(snapshot.market_cap? / liabilities),
            revenue_to_assets: saturate(snapshot.revenue? / assets),
        })
    }

    /// Saturates at `±f64::MAX` instead of overflowing.
    pub fn z_score(&self, r: &AltmanRatios) -> f64 {
        let c = self.config;
        let terms = [
            c.working_capital_coefficient * r.working_capital_to_assets,
            c.retained_earnings_coefficient * r.retained_earnings_to_assets,
            c.ebitda_coefficient * r.ebitda_to_assets,
            c.market_cap_coefficient * r.market_cap_to_liabilities,
            c.revenue_coefficient * r.revenue_to_assets,
        ];
        saturate(terms.into_iter().map(saturate).sum())
    }

    /// Non-decreasing step function of Z.
    pub fn level_for(&self, z: f64) -> u8 {
        let c = self.config;
        if z < c.distress_threshold {
            0
        } else if z < c.grey_threshold {
            1
        } else if z < c.safe_threshold {
            2
        } else {
            MAX_LEVEL
        }
    }

    /// True when the most recent `loss_penalty_years` net incomes are all negative.
    pub fn has_consecutive_losses(&self, snapshot: &FundamentalsSnapshot) -> bool {
        let years = self.config.loss_penalty_years;
        years > 0
            && snapshot.net_income_history.len() >= years
            && snapshot.net_income_history[..years].iter().all(|ni| *ni < 0.0)
    }

    pub fn score(&self, snapshot: &FundamentalsSnapshot) -> Option<ResilienceAssessment> {
        let Some(ratios) = Self::ratios(snapshot) else {
            tracing::debug!("Resilience undefined for {}: incomplete balance sheet", snapshot.symbol);
            return None;
        };

        let z_score = self.z_score(&ratios);
        if z_score.is_nan() {
            return None;
        }
        let z_level = self.level_for(z_score);
        // Going-concern penalty, independent of the Z formula
        let loss_penalty_applied = self.has_consecutive_losses(snapshot);
        let level = if loss_penalty_applied {
            z_level.saturating_sub(1)
        } else {
            z_level
        };

        Some(ResilienceAssessment {
            z_score,
            ratios,
            z_level,
            level,
            loss_penalty_applied,
            score: level as f64 / MAX_LEVEL as f64 * 10.0,
        })
    }
}
