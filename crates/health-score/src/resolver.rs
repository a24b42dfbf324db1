//! Effective range and weight resolution per metric.
//!
//! Ranges: sector override (if consistent) or default, then market-cap scaling
//! for absolute-magnitude metrics, then mega-cap tightening of P/E and ROE,
//! then repair of any degenerate result.
//!
//! Weights: base or sector override, then market-cap tier and growth-tier
//! multipliers. Weights are not normalized here; aggregation divides by the
//! sum of weights actually used.

use std::collections::BTreeMap;

use analysis_core::MetricKey;

use crate::config::ResolverConfig;
use crate::metrics::MetricTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapTier {
    Small,
    Mid,
    Mega,
    Unknown,
}

pub struct RangeWeightResolver<'a> {
    table: &'a MetricTable,
    config: &'a ResolverConfig,
}

impl<'a> RangeWeightResolver<'a> {
    pub fn new(table: &'a MetricTable, config: &'a ResolverConfig) -> Self {
        Self { table, config }
    }

    pub fn cap_tier(&self, market_cap: Option<f64>) -> CapTier {
        match market_cap {
            Some(cap) if cap < self.config.small_cap_threshold => CapTier::Small,
            Some(cap) if cap > self.config.mega_cap_threshold => CapTier::Mega,
            Some(_) => CapTier::Mid,
            None => CapTier::Unknown,
        }
    }

    fn magnitude_scale(&self, market_cap: f64) -> f64 {
        (market_cap / self.config.magnitude_base_cap)
            .max(1.0)
            .powf(self.config.magnitude_exponent)
    }

    /// Effective `(min, max)` for a metric, or `None` when the metric is not
    /// configured. The result always satisfies `min < max` unless the repair
    /// step could not widen it (then the metric is skipped by the scorer).
    pub fn resolve_range(
        &self,
        metric: MetricKey,
        sector: Option<&str>,
        market_cap: Option<f64>,
    ) -> Option<(f64, f64)> {
        let (mut min, mut max) = self.table.base_range(metric, sector)?;

        if let Some(cap) = market_cap {
            if metric.is_absolute_magnitude() {
                let scale = self.magnitude_scale(cap);
                if min < 0.0 {
                    min *= scale;
                }
                max *= scale;
            }

            if cap >= self.config.mega_cap_threshold {
                let width = max - min;
                match metric {
                    MetricKey::PeRatio => max -= width * self.config.mega_cap_pe_tighten,
                    MetricKey::Roe => min += width * self.config.mega_cap_roe_floor_raise,
                    _ => {}
                }
            }
        }

        if min >= max {
            max += max.abs() * 0.01 + 1e-6;
            tracing::debug!("Widened degenerate {} range to [{}, {}]", metric, min, max);
        }

        Some((min, max))
    }

    /// Effective weight for every configured metric.
    pub fn resolve_weights(
        &self,
        sector: Option<&str>,
        market_cap: Option<f64>,
        revenue_growth: Option<f64>,
    ) -> BTreeMap<MetricKey, f64> {
        let mut weights: BTreeMap<MetricKey, f64> = self
            .table
            .metrics()
            .filter_map(|(metric, _)| Some((metric, self.table.base_weight(metric, sector)?)))
            .collect();

        let high_growth = revenue_growth.is_some_and(|g| g > self.config.high_growth_threshold);
        let c = self.config;
        let mut scale = |metric: MetricKey, factor: f64| {
            if let Some(w) = weights.get_mut(&metric) {
                *w *= factor;
            }
        };

        match self.cap_tier(market_cap) {
            CapTier::Small => {
                // Small caps are valued on growth, not current profit
                let (revenue, ps) = if high_growth {
                    (c.small_cap_high_growth_revenue_multiplier, c.small_cap_high_growth_ps_multiplier)
                } else {
                    (c.small_cap_revenue_multiplier, c.small_cap_ps_multiplier)
                };
                scale(MetricKey::Revenue, revenue);
                scale(MetricKey::PsRatio, ps);
                scale(MetricKey::NetIncome, c.small_cap_net_income_multiplier);
            }
            CapTier::Mega => {
                scale(MetricKey::Roe, c.mega_cap_roe_multiplier);
                scale(MetricKey::DebtToEquity, c.mega_cap_debt_multiplier);
                scale(MetricKey::Revenue, c.mega_cap_revenue_multiplier);
                scale(MetricKey::PsRatio, c.mega_cap_ps_multiplier);
            }
            CapTier::Mid | CapTier::Unknown => {
                if high_growth {
                    scale(MetricKey::Revenue, c.high_growth_multiplier);
                    scale(MetricKey::PsRatio, c.high_growth_multiplier);
                }
            }
        }

        weights
    }
}
