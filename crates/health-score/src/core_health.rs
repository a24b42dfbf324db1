use analysis_core::normalize::{linear_fraction, safe_ratio, sigmoid, NEUTRAL};
use analysis_core::{FundamentalsSnapshot, MetricKey, MetricScore};
use serde::{Deserialize, Serialize};

use crate::config::ResolverConfig;
use crate::metrics::{Direction, MetricConfig, MetricTable};
use crate::resolver::RangeWeightResolver;

/// Core health sub-score and its per-metric breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreHealthAssessment {
    /// 0.0 to 10.0; `None` when no metric had both a value and a usable range
    pub score: Option<f64>,
    pub breakdown: Vec<MetricScore>,
}

/// Raw value of a metric, computing margins and balance-sheet ratios from
/// their operands when both are present and the denominator is non-zero.
pub fn metric_value(snapshot: &FundamentalsSnapshot, metric: MetricKey) -> Option<f64> {
    let s = snapshot;
    let ratio = |num: Option<f64>, den: Option<f64>| safe_ratio(num?, den?);
    let value = match metric {
        MetricKey::Revenue => s.revenue,
        MetricKey::NetIncome => s.net_income,
        MetricKey::Eps => s.eps,
        MetricKey::PeRatio => s.pe_ratio,
        MetricKey::PsRatio => s.ps_ratio,
        MetricKey::Roe => s.roe,
        MetricKey::DebtToEquity => s.debt_to_equity,
        MetricKey::PbRatio => s.pb_ratio,
        MetricKey::Ebitda => s.ebitda,
        MetricKey::FreeCashFlow => s.free_cash_flow,
        MetricKey::OperatingCashFlow => s.operating_cash_flow,
        MetricKey::FreeCashFlowMargin => s
            .free_cash_flow_margin
            .or_else(|| ratio(s.free_cash_flow, s.revenue)),
        MetricKey::NetMargin => ratio(s.net_income, s.revenue),
        MetricKey::EbitdaMargin => ratio(s.ebitda, s.revenue),
        MetricKey::CurrentRatio => ratio(s.total_current_assets, s.total_current_liabilities),
        MetricKey::LiabilityToAssetRatio => ratio(s.total_liabilities, s.total_assets),
        MetricKey::WorkingCapitalRatio => {
            let working_capital = s.working_capital.or_else(|| {
                Some(s.total_current_assets? - s.total_current_liabilities?)
            });
            ratio(working_capital, s.total_assets)
        }
        MetricKey::RetainedEarnings => s.retained_earnings,
        MetricKey::OutstandingShares => s.outstanding_shares,
        MetricKey::TotalAssets => s.total_assets,
        MetricKey::TotalLiabilities => s.total_liabilities,
    };
    value.filter(|v| v.is_finite())
}

/// Normalize a raw value against its resolved range: transform, locate,
/// squash through the sigmoid, then invert for lower-is-better metrics.
/// A range that collapses under the transform yields [`NEUTRAL`].
pub fn normalize_metric(value: f64, range: (f64, f64), config: &MetricConfig) -> f64 {
    let t = config.transform;
    let (min, max) = (t.apply(range.0), t.apply(range.1));
    let normalized = match linear_fraction(t.apply(value), min, max) {
        Some(fraction) => sigmoid(fraction),
        None => return NEUTRAL,
    };
    match config.direction {
        Direction::HigherIsBetter => normalized,
        Direction::LowerIsBetter => 1.0 - normalized,
    }
}

pub struct CoreHealthScorer<'a> {
    table: &'a MetricTable,
    resolver: RangeWeightResolver<'a>,
}

impl<'a> CoreHealthScorer<'a> {
    pub fn new(table: &'a MetricTable, config: &'a ResolverConfig) -> Self {
        Self {
            table,
            resolver: RangeWeightResolver::new(table, config),
        }
    }

    pub fn score(&self, snapshot: &FundamentalsSnapshot) -> CoreHealthAssessment {
        let sector = snapshot.sector.as_deref();
        let growth_signal = snapshot.revenue_growth.or(snapshot.average_revenue_growth);
        let weights = self
            .resolver
            .resolve_weights(sector, snapshot.market_cap, growth_signal);

        let mut breakdown = Vec::new();
        let mut total = 0.0;
        let mut total_weight = 0.0;

        for metric in MetricKey::ALL {
            let Some(value) = metric_value(snapshot, metric) else {
                continue;
            };
            let (Some(config), Some(&weight)) = (self.table.config(metric), weights.get(&metric))
            else {
                continue;
            };
            let Some(range) = self.resolver.resolve_range(metric, sector, snapshot.market_cap)
            else {
                continue;
            };
            if range.0 >= range.1 {
                tracing::debug!("Skipping {}: unusable range [{}, {}]", metric, range.0, range.1);
                continue;
            }

            let normalized = normalize_metric(value, range, config);
            let contribution = normalized * weight;
            tracing::trace!(
                "{} value={} range=[{}, {}] normalized={:.4} weight={:.4}",
                metric,
                value,
                range.0,
                range.1,
                normalized,
                weight
            );

            breakdown.push(MetricScore {
                metric,
                value,
                normalized: normalized * 100.0,
                weight,
                contribution,
            });
            total += contribution;
            total_weight += weight;
        }

        let score = if total_weight > 0.0 {
            Some((total / total_weight * 10.0).clamp(0.0, 10.0))
        } else {
            tracing::debug!("Core health undefined for {}: no scorable metrics", snapshot.symbol);
            None
        };

        CoreHealthAssessment { score, breakdown }
    }
}
