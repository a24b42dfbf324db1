use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Maximum number of yearly history points kept on a snapshot.
pub const MAX_HISTORY: usize = 5;

/// Point-in-time company fundamentals.
///
/// Every numeric field is optional: absence means "unknown", never zero.
/// Histories are most-recent-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalsSnapshot {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,

    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub ebitda: Option<f64>,
    pub outstanding_shares: Option<f64>,

    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_current_assets: Option<f64>,
    pub total_current_liabilities: Option<f64>,
    pub retained_earnings: Option<f64>,
    pub working_capital: Option<f64>,

    pub free_cash_flow_margin: Option<f64>,
    pub ebitda_margin_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub average_revenue_growth: Option<f64>,
    pub average_net_income_growth: Option<f64>,

    pub revenue_history: Vec<f64>,
    pub net_income_history: Vec<f64>,
    pub ebitda_history: Vec<f64>,
}

impl FundamentalsSnapshot {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Parse a snapshot from JSON. Missing fields are absent; a blank symbol
    /// is rejected.
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.symbol.trim().is_empty() {
            return Err(AnalysisError::InvalidData(
                "snapshot symbol must not be empty".to_string(),
            ));
        }
        Ok(snapshot)
    }
}

/// Metrics scored by the core health sub-score, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Revenue,
    NetIncome,
    Eps,
    PeRatio,
    PsRatio,
    Roe,
    DebtToEquity,
    PbRatio,
    Ebitda,
    FreeCashFlow,
    OperatingCashFlow,
    FreeCashFlowMargin,
    NetMargin,
    EbitdaMargin,
    CurrentRatio,
    LiabilityToAssetRatio,
    WorkingCapitalRatio,
    RetainedEarnings,
    OutstandingShares,
    TotalAssets,
    TotalLiabilities,
}

impl MetricKey {
    pub const ALL: [MetricKey; 21] = [
        MetricKey::Revenue,
        MetricKey::NetIncome,
        MetricKey::Eps,
        MetricKey::PeRatio,
        MetricKey::PsRatio,
        MetricKey::Roe,
        MetricKey::DebtToEquity,
        MetricKey::PbRatio,
        MetricKey::Ebitda,
        MetricKey::FreeCashFlow,
        MetricKey::OperatingCashFlow,
        MetricKey::FreeCashFlowMargin,
        MetricKey::NetMargin,
        MetricKey::EbitdaMargin,
        MetricKey::CurrentRatio,
        MetricKey::LiabilityToAssetRatio,
        MetricKey::WorkingCapitalRatio,
        MetricKey::RetainedEarnings,
        MetricKey::OutstandingShares,
        MetricKey::TotalAssets,
        MetricKey::TotalLiabilities,
    ];

    /// Stable snake_case key, matching the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            MetricKey::Revenue => "revenue",
            MetricKey::NetIncome => "net_income",
            MetricKey::Eps => "eps",
            MetricKey::PeRatio => "pe_ratio",
            MetricKey::PsRatio => "ps_ratio",
            MetricKey::Roe => "roe",
            MetricKey::DebtToEquity => "debt_to_equity",
            MetricKey::PbRatio => "pb_ratio",
            MetricKey::Ebitda => "ebitda",
            MetricKey::FreeCashFlow => "free_cash_flow",
            MetricKey::OperatingCashFlow => "operating_cash_flow",
            MetricKey::FreeCashFlowMargin => "free_cash_flow_margin",
            MetricKey::NetMargin => "net_margin",
            MetricKey::EbitdaMargin => "ebitda_margin",
            MetricKey::CurrentRatio => "current_ratio",
            MetricKey::LiabilityToAssetRatio => "liability_to_asset_ratio",
            MetricKey::WorkingCapitalRatio => "working_capital_ratio",
            MetricKey::RetainedEarnings => "retained_earnings",
            MetricKey::OutstandingShares => "outstanding_shares",
            MetricKey::TotalAssets => "total_assets",
            MetricKey::TotalLiabilities => "total_liabilities",
        }
    }

    /// Human-readable label for the metric
    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::Revenue => "Revenue",
            MetricKey::NetIncome => "Net Income",
            MetricKey::Eps => "EPS",
            MetricKey::PeRatio => "P/E Ratio",
            MetricKey::PsRatio => "P/S Ratio",
            MetricKey::Roe => "ROE",
            MetricKey::DebtToEquity => "Debt/Equity",
            MetricKey::PbRatio => "P/B Ratio",
            MetricKey::Ebitda => "EBITDA",
            MetricKey::FreeCashFlow => "Free Cash Flow",
            MetricKey::OperatingCashFlow => "Operating Cash Flow",
            MetricKey::FreeCashFlowMargin => "Free Cash Flow Margin",
            MetricKey::NetMargin => "Net Margin",
            MetricKey::EbitdaMargin => "EBITDA Margin",
            MetricKey::CurrentRatio => "Current Ratio",
            MetricKey::LiabilityToAssetRatio => "Liabilities/Assets",
            MetricKey::WorkingCapitalRatio => "Working Capital/Assets",
            MetricKey::RetainedEarnings => "Retained Earnings",
            MetricKey::OutstandingShares => "Outstanding Shares",
            MetricKey::TotalAssets => "Total Assets",
            MetricKey::TotalLiabilities => "Total Liabilities",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.key() == key)
    }

    /// Metrics measured in absolute currency, whose ranges scale with market cap.
    pub fn is_absolute_magnitude(&self) -> bool {
        matches!(
            self,
            MetricKey::Revenue
                | MetricKey::NetIncome
                | MetricKey::Ebitda
                | MetricKey::FreeCashFlow
                | MetricKey::OperatingCashFlow
                | MetricKey::RetainedEarnings
                | MetricKey::TotalAssets
                | MetricKey::TotalLiabilities
        )
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One scored metric in the core health breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: MetricKey,
    pub value: f64,
    /// Normalized score, 0.0 to 100.0
    pub normalized: f64,
    pub weight: f64,
    /// Normalized fraction (0.0 to 1.0) times weight
    pub contribution: f64,
}

/// Which per-share multiple was compared against its benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioType {
    PriceToEarnings,
    PriceToSales,
}

impl RatioType {
    pub fn label(&self) -> &'static str {
        match self {
            RatioType::PriceToEarnings => "P/E",
            RatioType::PriceToSales => "P/S",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationClass {
    Undervalued,
    FairlyValued,
    Overvalued,
    Unknown,
}

impl ValuationClass {
    pub fn to_label(&self) -> &'static str {
        match self {
            ValuationClass::Undervalued => "Undervalued",
            ValuationClass::FairlyValued => "Fairly Valued",
            ValuationClass::Overvalued => "Overvalued",
            ValuationClass::Unknown => "Unknown",
        }
    }
}

/// Comparison of a company's multiple against its industry or sector average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationAssessment {
    pub ratio_type: RatioType,
    pub ratio: Option<f64>,
    pub benchmark: Option<f64>,
    /// (ratio - benchmark) / benchmark
    pub deviation: Option<f64>,
    pub classification: ValuationClass,
    /// 0.0 to 1.0, cheaper than benchmark trends toward 1.0
    pub normalized_score: Option<f64>,
}

/// Display band for a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Good,
    Medium,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            7..=10 => ScoreBand::Good,
            4..=6 => ScoreBand::Medium,
            _ => ScoreBand::Poor,
        }
    }
}

/// Final scoring output. A pure function of the snapshot and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub symbol: String,
    /// 0 to 10
    pub composite_score: u8,
    pub core_health_score: u8,
    pub growth_score: u8,
    pub resilience_score: u8,
    /// Unrounded core health sub-score; `None` when it could not be computed
    pub core_health_value: Option<f64>,
    /// Unrounded growth sub-score; `None` when it could not be computed
    pub growth_value: Option<f64>,
    /// Discrete 0-3 resilience level; `None` when it could not be computed
    pub resilience_level: Option<u8>,
    pub breakdown: Vec<MetricScore>,
    #[serde(default)]
    pub valuation: Option<ValuationAssessment>,
}

impl HealthScore {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.composite_score)
    }

    pub fn metric(&self, metric: MetricKey) -> Option<&MetricScore> {
        self.breakdown.iter().find(|m| m.metric == metric)
    }
}

/// One human-readable explanation line for a sub-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScoreDetail {
    pub label: String,
    pub value: String,
    pub weight: Option<String>,
    pub normalized: Option<String>,
    pub rationale: Option<String>,
}
