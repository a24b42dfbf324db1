use analysis_core::normalize::{clamp_rescale, sigmoid, NEUTRAL};
use analysis_core::{FundamentalsSnapshot, ValuationAssessment};
use serde::{Deserialize, Serialize};

use crate::config::{ClampWindow, GrowthConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthSignalKind {
    AverageRevenueGrowth,
    AverageNetIncomeGrowth,
    RecentRevenueGrowth,
    FreeCashFlowMargin,
    EbitdaMarginTrend,
    Valuation,
}

impl GrowthSignalKind {
    pub fn label(&self) -> &'static str {
        match self {
            GrowthSignalKind::AverageRevenueGrowth => "Average Revenue Growth",
            GrowthSignalKind::AverageNetIncomeGrowth => "Average Net Income Growth",
            GrowthSignalKind::RecentRevenueGrowth => "Recent Revenue Growth",
            GrowthSignalKind::FreeCashFlowMargin => "Free Cash Flow Margin",
            GrowthSignalKind::EbitdaMarginTrend => "EBITDA Margin Trend",
            GrowthSignalKind::Valuation => "Valuation vs Benchmark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSignal {
    pub kind: GrowthSignalKind,
    /// Raw input; `None` means the signal was imputed at neutral
    pub value: Option<f64>,
    /// 0.0 to 1.0
    pub normalized: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssessment {
    /// 0.0 to 10.0; `None` when none of the signals had a real value
    pub score: Option<f64>,
    pub signals: Vec<GrowthSignal>,
}

pub struct GrowthScorer<'a> {
    config: &'a GrowthConfig,
}

impl<'a> GrowthScorer<'a> {
    pub fn new(config: &'a GrowthConfig) -> Self {
        Self { config }
    }

    fn windowed(value: Option<f64>, window: ClampWindow) -> Option<f64> {
        value
            .filter(|v| v.is_finite())
            .map(|v| sigmoid(clamp_rescale(v, window.low, window.high)))
    }

    pub fn score(
        &self,
        snapshot: &FundamentalsSnapshot,
        valuation: Option<&ValuationAssessment>,
    ) -> GrowthAssessment {
        let c = self.config;
        let fcf_margin = snapshot.free_cash_flow_margin.or_else(|| {
            let revenue = snapshot.revenue.filter(|r| *r != 0.0)?;
            Some(snapshot.free_cash_flow? / revenue)
        });

        let inputs = [
            (
                GrowthSignalKind::AverageRevenueGrowth,
                snapshot.average_revenue_growth,
                Self::windowed(snapshot.average_revenue_growth, c.growth_window),
                c.average_revenue_growth_weight,
            ),
            (
                GrowthSignalKind::AverageNetIncomeGrowth,
                snapshot.average_net_income_growth,
                Self::windowed(snapshot.average_net_income_growth, c.growth_window),
                c.average_net_income_growth_weight,
            ),
            (
                GrowthSignalKind::RecentRevenueGrowth,
                snapshot.revenue_growth,
                Self::windowed(snapshot.revenue_growth, c.growth_window),
                c.recent_revenue_growth_weight,
            ),
            (
                GrowthSignalKind::FreeCashFlowMargin,
                fcf_margin,
                Self::windowed(fcf_margin, c.fcf_margin_window),
                c.fcf_margin_weight,
            ),
            (
                GrowthSignalKind::EbitdaMarginTrend,
                snapshot.ebitda_margin_growth,
                Self::windowed(snapshot.ebitda_margin_growth, c.ebitda_trend_window),
                c.ebitda_trend_weight,
            ),
            (
                GrowthSignalKind::Valuation,
                valuation.and_then(|v| v.deviation),
                valuation.and_then(|v| v.normalized_score),
                c.valuation_weight,
            ),
        ];

        let mut signals = Vec::with_capacity(inputs.len());
        let mut has_data = false;
        let mut total = 0.0;
        let mut total_weight = 0.0;

        for (kind, raw, normalized, weight) in inputs {
            let imputed = normalized.is_none();
            has_data |= !imputed;
            let normalized = normalized.unwrap_or(NEUTRAL);
            total += normalized * weight;
            total_weight += weight;
            signals.push(GrowthSignal {
                kind,
                value: if imputed { None } else { raw },
                normalized,
                weight,
            });
        }

        let score = if has_data && total_weight > 0.0 {
            Some((total / total_weight * 10.0).clamp(0.0, 10.0))
        } else {
            tracing::debug!("Growth undefined for {}: no growth signals", snapshot.symbol);
            None
        };

        GrowthAssessment { score, signals }
    }
}
