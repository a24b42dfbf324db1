use std::env;
use std::path::Path;

use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

/// Tunable constants for every scoring stage.
///
/// `Default` holds the calibrated values; any subset can be overridden from a
/// JSON file or from the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub composite: CompositeWeights,
    pub resolver: ResolverConfig,
    pub valuation: ValuationConfig,
    pub growth: GrowthConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub core_health: f64,
    pub growth: f64,
    pub resilience: f64,
    /// Sub-score used for core health and growth when they cannot be computed
    pub neutral_score: f64,
    /// Resilience level (0-3 scale) used when it cannot be computed
    pub neutral_resilience_level: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            core_health: 0.4,
            growth: 0.3,
            resilience: 0.3,
            neutral_score: 5.0,
            neutral_resilience_level: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub small_cap_threshold: f64,
    pub mega_cap_threshold: f64,
    /// Revenue growth above this is "high growth"
    pub high_growth_threshold: f64,

    /// Market cap at which absolute-magnitude ranges are unscaled
    pub magnitude_base_cap: f64,
    pub magnitude_exponent: f64,

    /// Fraction of the P/E range width removed from the ceiling for mega caps
    pub mega_cap_pe_tighten: f64,
    /// Fraction of the ROE range width added to the floor for mega caps
    pub mega_cap_roe_floor_raise: f64,

    pub small_cap_revenue_multiplier: f64,
    pub small_cap_high_growth_revenue_multiplier: f64,
    pub small_cap_ps_multiplier: f64,
    pub small_cap_high_growth_ps_multiplier: f64,
    pub small_cap_net_income_multiplier: f64,

    pub mega_cap_roe_multiplier: f64,
    pub mega_cap_debt_multiplier: f64,
    pub mega_cap_revenue_multiplier: f64,
    pub mega_cap_ps_multiplier: f64,

    /// Applied to revenue and P/S weight for high-growth companies outside
    /// the small- and mega-cap tiers
    pub high_growth_multiplier: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            small_cap_threshold: 2_000_000_000.0,
            mega_cap_threshold: 100_000_000_000.0,
            high_growth_threshold: 0.15,
            magnitude_base_cap: 1_000_000_000.0,
            magnitude_exponent: 0.25,
            mega_cap_pe_tighten: 0.15,
            mega_cap_roe_floor_raise: 0.10,
            small_cap_revenue_multiplier: 1.2,
            small_cap_high_growth_revenue_multiplier: 1.4,
            small_cap_ps_multiplier: 1.3,
            small_cap_high_growth_ps_multiplier: 1.5,
            small_cap_net_income_multiplier: 0.8,
            mega_cap_roe_multiplier: 1.2,
            mega_cap_debt_multiplier: 1.2,
            mega_cap_revenue_multiplier: 0.9,
            mega_cap_ps_multiplier: 0.9,
            high_growth_multiplier: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Deviation at or beyond ±fair_band is under- or overvalued
    pub fair_band: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self { fair_band: 0.15 }
    }
}

/// Clamp window applied to a growth signal before rescaling to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampWindow {
    pub low: f64,
    pub high: f64,
}

impl ClampWindow {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub growth_window: ClampWindow,
    pub fcf_margin_window: ClampWindow,
    pub ebitda_trend_window: ClampWindow,

    pub average_revenue_growth_weight: f64,
    pub recent_revenue_growth_weight: f64,
    pub average_net_income_growth_weight: f64,
    pub fcf_margin_weight: f64,
    pub ebitda_trend_weight: f64,
    pub valuation_weight: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            growth_window: ClampWindow::new(-0.5, 0.6),
            fcf_margin_window: ClampWindow::new(-0.3, 0.3),
            ebitda_trend_window: ClampWindow::new(-0.2, 0.2),
            average_revenue_growth_weight: 0.25,
            recent_revenue_growth_weight: 0.20,
            average_net_income_growth_weight: 0.20,
            fcf_margin_weight: 0.15,
            ebitda_trend_weight: 0.12,
            valuation_weight: 0.08,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub working_capital_coefficient: f64,
    pub retained_earnings_coefficient: f64,
    pub ebitda_coefficient: f64,
    pub market_cap_coefficient: f64,
    pub revenue_coefficient: f64,

    /// Z below this is level 0 (distress)
    pub distress_threshold: f64,
    /// Z below this is level 1
    pub grey_threshold: f64,
    /// Z below this is level 2, at or above is level 3 (safe)
    pub safe_threshold: f64,

    /// Consecutive most-recent loss years that cost one level
    pub loss_penalty_years: usize,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            working_capital_coefficient: 1.2,
            retained_earnings_coefficient: 1.4,
            ebitda_coefficient: 3.3,
            market_cap_coefficient: 0.6,
            revenue_coefficient: 1.0,
            distress_threshold: 1.81,
            grey_threshold: 2.3,
            safe_threshold: 2.99,
            loss_penalty_years: 2,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{name} must be non-negative, got {value}"
        )))
    }
}

fn window(name: &str, w: ClampWindow) -> Result<(), AnalysisError> {
    if w.low.is_finite() && w.high.is_finite() && w.low < w.high {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{name} window [{}, {}] is empty",
            w.low, w.high
        )))
    }
}

/// Parse an optional f64 override from the environment, ignoring bad values.
fn env_f64(key: &str) -> Option<f64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

impl ScoringConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load `.env`, then `HEALTH_SCORE_CONFIG` (JSON file, optional), then the
    /// `HEALTH_WEIGHT_*` composite weight overrides.
    pub fn from_env() -> Result<Self, AnalysisError> {
        dotenvy::dotenv().ok();

        let mut config = match env::var("HEALTH_SCORE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!("Loading scoring config from {}", path);
                Self::from_file(path.trim())?
            }
            _ => Self::default(),
        };

        if let Some(w) = env_f64("HEALTH_WEIGHT_CORE") {
            config.composite.core_health = w;
        }
        if let Some(w) = env_f64("HEALTH_WEIGHT_GROWTH") {
            config.composite.growth = w;
        }
        if let Some(w) = env_f64("HEALTH_WEIGHT_RESILIENCE") {
            config.composite.resilience = w;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let c = &self.composite;
        positive("composite.core_health", c.core_health)?;
        positive("composite.growth", c.growth)?;
        positive("composite.resilience", c.resilience)?;
        if !(0.0..=10.0).contains(&c.neutral_score) {
            return Err(AnalysisError::InvalidConfig(format!(
                "composite.neutral_score must be within [0, 10], got {}",
                c.neutral_score
            )));
        }
        if !(0.0..=3.0).contains(&c.neutral_resilience_level) {
            return Err(AnalysisError::InvalidConfig(format!(
                "composite.neutral_resilience_level must be within [0, 3], got {}",
                c.neutral_resilience_level
            )));
        }

        let r = &self.resolver;
        positive("resolver.small_cap_threshold", r.small_cap_threshold)?;
        positive("resolver.mega_cap_threshold", r.mega_cap_threshold)?;
        if r.small_cap_threshold >= r.mega_cap_threshold {
            return Err(AnalysisError::InvalidConfig(
                "resolver.small_cap_threshold must be below mega_cap_threshold".to_string(),
            ));
        }
        non_negative("resolver.high_growth_threshold", r.high_growth_threshold)?;
        positive("resolver.magnitude_base_cap", r.magnitude_base_cap)?;
        non_negative("resolver.magnitude_exponent", r.magnitude_exponent)?;
        non_negative("resolver.mega_cap_pe_tighten", r.mega_cap_pe_tighten)?;
        non_negative("resolver.mega_cap_roe_floor_raise", r.mega_cap_roe_floor_raise)?;
        for (name, value) in [
            ("small_cap_revenue_multiplier", r.small_cap_revenue_multiplier),
            ("small_cap_high_growth_revenue_multiplier", r.small_cap_high_growth_revenue_multiplier),
            ("small_cap_ps_multiplier", r.small_cap_ps_multiplier),
            ("small_cap_high_growth_ps_multiplier", r.small_cap_high_growth_ps_multiplier),
            ("small_cap_net_income_multiplier", r.small_cap_net_income_multiplier),
            ("mega_cap_roe_multiplier", r.mega_cap_roe_multiplier),
            ("mega_cap_debt_multiplier", r.mega_cap_debt_multiplier),
            ("mega_cap_revenue_multiplier", r.mega_cap_revenue_multiplier),
            ("mega_cap_ps_multiplier", r.mega_cap_ps_multiplier),
            ("high_growth_multiplier", r.high_growth_multiplier),
        ] {
            positive(&format!("resolver.{name}"), value)?;
        }

        positive("valuation.fair_band", self.valuation.fair_band)?;

        let g = &self.growth;
        window("growth.growth_window", g.growth_window)?;
        window("growth.fcf_margin_window", g.fcf_margin_window)?;
        window("growth.ebitda_trend_window", g.ebitda_trend_window)?;
        for (name, value) in [
            ("average_revenue_growth_weight", g.average_revenue_growth_weight),
            ("recent_revenue_growth_weight", g.recent_revenue_growth_weight),
            ("average_net_income_growth_weight", g.average_net_income_growth_weight),
            ("fcf_margin_weight", g.fcf_margin_weight),
            ("ebitda_trend_weight", g.ebitda_trend_weight),
            ("valuation_weight", g.valuation_weight),
        ] {
            positive(&format!("growth.{name}"), value)?;
        }

        let z = &self.resilience;
        if !(z.distress_threshold < z.grey_threshold && z.grey_threshold < z.safe_threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "resilience thresholds must increase: {} < {} < {}",
                z.distress_threshold, z.grey_threshold, z.safe_threshold
            )));
        }
        if z.loss_penalty_years == 0 {
            return Err(AnalysisError::InvalidConfig(
                "resilience.loss_penalty_years must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ScoringConfig::from_json_str(r#"{"composite":{"core_health":0.5,"resilience":0.2}}"#)
                .unwrap();
        assert_eq!(config.composite.core_health, 0.5);
        assert_eq!(config.composite.growth, 0.3);
        assert_eq!(config.composite.resilience, 0.2);
        assert_eq!(config.growth, GrowthConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let err = ScoringConfig::from_json_str(r#"{"composite":{"growth":0.0}}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_inverted_window() {
        let err = ScoringConfig::from_json_str(
            r#"{"growth":{"growth_window":{"low":0.6,"high":-0.5}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut config = ScoringConfig::default();
        config.resilience.grey_threshold = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = ScoringConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    // Only test that touches the process environment
    #[test]
    fn test_from_env_file_and_weight_overrides() {
        let path = std::env::temp_dir().join(format!("health-score-env-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"composite":{"resilience":0.25},"valuation":{"fair_band":0.2}}"#)
            .unwrap();

        env::set_var("HEALTH_SCORE_CONFIG", &path);
        env::set_var("HEALTH_WEIGHT_CORE", "0.5");
        env::set_var("HEALTH_WEIGHT_GROWTH", "abc");
        env::remove_var("HEALTH_WEIGHT_RESILIENCE");
        let result = ScoringConfig::from_env();
        env::remove_var("HEALTH_SCORE_CONFIG");
        env::remove_var("HEALTH_WEIGHT_CORE");
        env::remove_var("HEALTH_WEIGHT_GROWTH");
        std::fs::remove_file(&path).ok();

        let config = result.unwrap();
        assert_eq!(config.composite.core_health, 0.5);
        // unparsable override is ignored
        assert_eq!(config.composite.growth, 0.3);
        assert_eq!(config.composite.resilience, 0.25);
        assert_eq!(config.valuation.fair_band, 0.2);
        assert_eq!(config.resilience, ResilienceConfig::default());
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let err = ScoringConfig::from_file("/nonexistent/health-score.json").unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
