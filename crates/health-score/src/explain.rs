//! Human-readable explanation lines for each sub-score.

use analysis_core::{HealthScore, HealthScoreDetail, MetricKey};

use crate::growth::{GrowthAssessment, GrowthSignalKind};
use crate::resilience::{ResilienceAssessment, MAX_LEVEL};

fn format_large(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (abs / 1e12, "T")
    } else if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };
    format!("{sign}{scaled:.2}{suffix}")
}

fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn format_metric(metric: MetricKey, value: f64) -> String {
    match metric {
        MetricKey::Revenue
        | MetricKey::NetIncome
        | MetricKey::Ebitda
        | MetricKey::FreeCashFlow
        | MetricKey::OperatingCashFlow
        | MetricKey::RetainedEarnings
        | MetricKey::OutstandingShares
        | MetricKey::TotalAssets
        | MetricKey::TotalLiabilities => format_large(value),
        MetricKey::Roe
        | MetricKey::FreeCashFlowMargin
        | MetricKey::NetMargin
        | MetricKey::EbitdaMargin
        | MetricKey::WorkingCapitalRatio => format_percent(value),
        _ => format!("{value:.2}"),
    }
}

fn format_signal(kind: GrowthSignalKind, value: f64) -> String {
    match kind {
        GrowthSignalKind::Valuation => format!("{:+.1}% vs benchmark", value * 100.0),
        _ => format_percent(value),
    }
}

/// One line per scored metric, in breakdown order.
pub fn explain_core(score: &HealthScore) -> Vec<HealthScoreDetail> {
    score
        .breakdown
        .iter()
        .map(|m| HealthScoreDetail {
            label: m.metric.label().to_string(),
            value: format_metric(m.metric, m.value),
            weight: Some(format!("{:.1}%", m.weight * 100.0)),
            normalized: Some(format!("{:.0}/100", m.normalized)),
            rationale: None,
        })
        .collect()
}

pub fn explain_growth(growth: &GrowthAssessment) -> Vec<HealthScoreDetail> {
    growth
        .signals
        .iter()
        .map(|s| HealthScoreDetail {
            label: s.kind.label().to_string(),
            value: s
                .value
                .map(|v| format_signal(s.kind, v))
                .unwrap_or_else(|| "N/A".to_string()),
            weight: Some(format!("{:.0}%", s.weight * 100.0)),
            normalized: Some(format!("{:.2}", s.normalized)),
            rationale: s
                .value
                .is_none()
                .then(|| "No data; treated as neutral".to_string()),
        })
        .collect()
}

pub fn explain_resilience(resilience: &ResilienceAssessment) -> Vec<HealthScoreDetail> {
    let r = &resilience.ratios;
    let ratio = |label: &str, value: f64| HealthScoreDetail {
        label: label.to_string(),
        value: format!("{value:.3}"),
        weight: None,
        normalized: None,
        rationale: None,
    };

    let zone = match resilience.z_level {
        0 => "distress zone",
        1 | 2 => "grey zone",
        _ => "safe zone",
    };

    let mut details = vec![
        ratio("Working Capital / Assets", r.working_capital_to_assets),
        ratio("Retained Earnings / Assets", r.retained_earnings_to_assets),
        ratio("EBITDA / Assets", r.ebitda_to_assets),
        ratio("Market Cap / Liabilities", r.market_cap_to_liabilities),
        ratio("Revenue / Assets", r.revenue_to_assets),
        HealthScoreDetail {
            label: "Altman Z".to_string(),
            value: format!("{:.2}", resilience.z_score),
            weight: None,
            normalized: None,
            rationale: Some(format!("Z-score in the {zone}")),
        },
    ];

    if resilience.loss_penalty_applied {
        details.push(HealthScoreDetail {
            label: "Consecutive Losses".to_string(),
            value: "-1 level".to_string(),
            weight: None,
            normalized: None,
            rationale: Some("Net income negative in each of the most recent years".to_string()),
        });
    }

    details.push(HealthScoreDetail {
        label: "Resilience Level".to_string(),
        value: format!("{}/{}", resilience.level, MAX_LEVEL),
        weight: None,
        normalized: Some(format!("{:.1}", resilience.score)),
        rationale: None,
    });

    details
}
