//! Static per-metric configuration and per-sector overrides.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use analysis_core::normalize::log1p_floor;
use analysis_core::{AnalysisError, MetricKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Transform applied to a value and its range bounds before normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    None,
    /// `ln(max(x, 0) + 1)` for heavy-tailed metrics
    Log1p,
}

impl Transform {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Transform::None => value,
            Transform::Log1p => log1p_floor(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    pub min: f64,
    pub max: f64,
    pub base_weight: f64,
    pub direction: Direction,
    #[serde(default)]
    pub transform: Transform,
}

impl MetricConfig {
    const fn new(min: f64, max: f64, base_weight: f64, direction: Direction) -> Self {
        Self {
            min,
            max,
            base_weight,
            direction,
            transform: Transform::None,
        }
    }

    const fn log(mut self) -> Self {
        self.transform = Transform::Log1p;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeOverride {
    pub min: f64,
    pub max: f64,
}

impl RangeOverride {
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }
}

/// Range and weight replacements for one sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorOverride {
    #[serde(default)]
    pub ranges: HashMap<MetricKey, RangeOverride>,
    #[serde(default)]
    pub weights: HashMap<MetricKey, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricTable {
    defaults: BTreeMap<MetricKey, MetricConfig>,
    #[serde(default)]
    sectors: HashMap<String, SectorOverride>,
}

use Direction::{HigherIsBetter as Higher, LowerIsBetter as Lower};

const DEFAULT_METRICS: &[(MetricKey, MetricConfig)] = &[
    (MetricKey::Revenue, MetricConfig::new(0.0, 1_000_000_000.0, 0.12, Higher)),
    (MetricKey::NetIncome, MetricConfig::new(-5_000_000.0, 50_000_000.0, 0.12, Higher)),
    (MetricKey::Eps, MetricConfig::new(-1.0, 5.0, 0.08, Higher)),
    (MetricKey::PeRatio, MetricConfig::new(5.0, 50.0, 0.08, Lower).log()),
    (MetricKey::PsRatio, MetricConfig::new(1.0, 15.0, 0.08, Lower).log()),
    (MetricKey::Roe, MetricConfig::new(0.0, 0.3, 0.10, Higher)),
    (MetricKey::DebtToEquity, MetricConfig::new(0.0, 2.0, 0.08, Lower)),
    (MetricKey::PbRatio, MetricConfig::new(0.5, 10.0, 0.08, Lower).log()),
    (MetricKey::Ebitda, MetricConfig::new(-20_000_000.0, 200_000_000.0, 0.08, Higher)),
    (MetricKey::FreeCashFlow, MetricConfig::new(-20_000_000.0, 200_000_000.0, 0.08, Higher)),
    (MetricKey::OperatingCashFlow, MetricConfig::new(-20_000_000.0, 300_000_000.0, 0.06, Higher)),
    (MetricKey::FreeCashFlowMargin, MetricConfig::new(-0.2, 0.3, 0.06, Higher)),
    (MetricKey::NetMargin, MetricConfig::new(-0.2, 0.3, 0.08, Higher)),
    (MetricKey::EbitdaMargin, MetricConfig::new(-0.1, 0.4, 0.06, Higher)),
    (MetricKey::CurrentRatio, MetricConfig::new(0.5, 3.0, 0.08, Higher)),
    (MetricKey::LiabilityToAssetRatio, MetricConfig::new(0.2, 1.0, 0.06, Lower)),
    (MetricKey::WorkingCapitalRatio, MetricConfig::new(-0.2, 0.4, 0.05, Higher)),
    (MetricKey::RetainedEarnings, MetricConfig::new(-100_000_000.0, 1_000_000_000.0, 0.05, Higher).log()),
    (MetricKey::OutstandingShares, MetricConfig::new(10_000_000.0, 10_000_000_000.0, 0.03, Lower).log()),
    (MetricKey::TotalAssets, MetricConfig::new(10_000_000.0, 1_000_000_000_000.0, 0.06, Higher).log()),
    (MetricKey::TotalLiabilities, MetricConfig::new(1_000_000.0, 500_000_000_000.0, 0.06, Lower).log()),
];

fn sector(
    ranges: &[(MetricKey, f64, f64)],
    weights: &[(MetricKey, f64)],
) -> SectorOverride {
    SectorOverride {
        ranges: ranges
            .iter()
            .map(|&(metric, min, max)| (metric, RangeOverride { min, max }))
            .collect(),
        weights: weights.iter().copied().collect(),
    }
}

static DEFAULT_TABLE: LazyLock<MetricTable> = LazyLock::new(|| {
    let mut sectors = HashMap::new();
    sectors.insert(
        "Technology".to_string(),
        sector(
            &[(MetricKey::PeRatio, 10.0, 60.0), (MetricKey::PsRatio, 2.0, 20.0)],
            &[
                (MetricKey::Revenue, 0.20),
                (MetricKey::PsRatio, 0.15),
                (MetricKey::NetIncome, 0.08),
                (MetricKey::PeRatio, 0.05),
            ],
        ),
    );
    sectors.insert(
        "Healthcare".to_string(),
        sector(
            &[(MetricKey::PsRatio, 1.0, 20.0)],
            &[
                (MetricKey::NetIncome, 0.18),
                (MetricKey::Roe, 0.18),
                (MetricKey::PsRatio, 0.08),
            ],
        ),
    );
    sectors.insert(
        "Financial Services".to_string(),
        sector(
            // Leveraged balance sheets
            &[
                (MetricKey::DebtToEquity, 0.0, 8.0),
                (MetricKey::LiabilityToAssetRatio, 0.5, 0.95),
            ],
            &[
                (MetricKey::Roe, 0.25),
                (MetricKey::NetIncome, 0.20),
                (MetricKey::Revenue, 0.08),
                (MetricKey::DebtToEquity, 0.15),
            ],
        ),
    );
    sectors.insert(
        "Utilities".to_string(),
        sector(&[(MetricKey::DebtToEquity, 0.5, 3.0)], &[]),
    );
    sectors.insert(
        "Real Estate".to_string(),
        sector(&[(MetricKey::DebtToEquity, 0.0, 3.0)], &[]),
    );

    MetricTable {
        defaults: DEFAULT_METRICS.iter().copied().collect(),
        sectors,
    }
});

impl MetricTable {
    /// Built-in default ranges, weights and sector overrides.
    pub fn standard() -> &'static MetricTable {
        &DEFAULT_TABLE
    }

    pub fn config(&self, metric: MetricKey) -> Option<&MetricConfig> {
        self.defaults.get(&metric)
    }

    pub fn metrics(&self) -> impl Iterator<Item = (MetricKey, &MetricConfig)> {
        self.defaults.iter().map(|(k, v)| (*k, v))
    }

    pub fn sector_override(&self, sector: Option<&str>) -> Option<&SectorOverride> {
        sector.and_then(|s| self.sectors.get(s))
    }

    /// Sector range if present and consistent, else the metric's default range.
    pub fn base_range(&self, metric: MetricKey, sector: Option<&str>) -> Option<(f64, f64)> {
        let config = self.config(metric)?;
        if let Some(range) = self
            .sector_override(sector)
            .and_then(|o| o.ranges.get(&metric))
        {
            if range.is_valid() {
                return Some((range.min, range.max));
            }
            tracing::warn!(
                "Ignoring inconsistent {} range override for sector {:?}: [{}, {}]",
                metric,
                sector,
                range.min,
                range.max
            );
        }
        Some((config.min, config.max))
    }

    /// Sector weight if present and positive, else the metric's base weight.
    pub fn base_weight(&self, metric: MetricKey, sector: Option<&str>) -> Option<f64> {
        let config = self.config(metric)?;
        let weight = self
            .sector_override(sector)
            .and_then(|o| o.weights.get(&metric))
            .copied()
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(config.base_weight);
        Some(weight)
    }

    pub fn with_metric(mut self, metric: MetricKey, config: MetricConfig) -> Self {
        self.defaults.insert(metric, config);
        self
    }

    pub fn with_sector_range(
        mut self,
        sector: impl Into<String>,
        metric: MetricKey,
        min: f64,
        max: f64,
    ) -> Self {
        self.sectors
            .entry(sector.into())
            .or_default()
            .ranges
            .insert(metric, RangeOverride { min, max });
        self
    }

    pub fn with_sector_weight(mut self, sector: impl Into<String>, metric: MetricKey, weight: f64) -> Self {
        self.sectors
            .entry(sector.into())
            .or_default()
            .weights
            .insert(metric, weight);
        self
    }

    /// Default configs must have `min < max` and a positive weight. Sector
    /// overrides are not checked here: inconsistent ones are skipped at lookup.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (metric, config) in &self.defaults {
            if !(config.min.is_finite() && config.max.is_finite() && config.min < config.max) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{metric}: min {} must be below max {}",
                    config.min, config.max
                )));
            }
            if !(config.base_weight.is_finite() && config.base_weight > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{metric}: base weight must be positive, got {}",
                    config.base_weight
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid_and_complete() {
        let table = MetricTable::standard();
        table.validate().unwrap();
        for metric in MetricKey::ALL {
            assert!(table.config(metric).is_some(), "missing config for {metric}");
        }
    }

    #[test]
    fn test_log_metrics() {
        let table = MetricTable::standard();
        for metric in [
            MetricKey::PeRatio,
            MetricKey::PsRatio,
            MetricKey::PbRatio,
            MetricKey::OutstandingShares,
            MetricKey::RetainedEarnings,
            MetricKey::TotalAssets,
            MetricKey::TotalLiabilities,
        ] {
            assert_eq!(table.config(metric).unwrap().transform, Transform::Log1p);
        }
        assert_eq!(table.config(MetricKey::Roe).unwrap().transform, Transform::None);
    }

    #[test]
    fn test_sector_range_override() {
        let table = MetricTable::standard();
        assert_eq!(table.base_range(MetricKey::PeRatio, Some("Technology")), Some((10.0, 60.0)));
        assert_eq!(table.base_range(MetricKey::PeRatio, Some("Energy")), Some((5.0, 50.0)));
        assert_eq!(table.base_range(MetricKey::PeRatio, None), Some((5.0, 50.0)));
    }

    #[test]
    fn test_inconsistent_range_override_ignored() {
        let table = MetricTable::standard()
            .clone()
            .with_sector_range("Widgets", MetricKey::Roe, 0.5, 0.1);
        assert_eq!(table.base_range(MetricKey::Roe, Some("Widgets")), Some((0.0, 0.3)));
    }

    #[test]
    fn test_sector_weight_override() {
        let table = MetricTable::standard();
        assert_eq!(table.base_weight(MetricKey::Revenue, Some("Technology")), Some(0.20));
        assert_eq!(table.base_weight(MetricKey::Revenue, Some("Energy")), Some(0.12));

        let table = table.clone().with_sector_weight("Widgets", MetricKey::Revenue, -1.0);
        assert_eq!(table.base_weight(MetricKey::Revenue, Some("Widgets")), Some(0.12));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let table = MetricTable::standard().clone().with_metric(
            MetricKey::Eps,
            MetricConfig {
                min: 5.0,
                max: 1.0,
                base_weight: 0.1,
                direction: Direction::HigherIsBetter,
                transform: Transform::None,
            },
        );
        assert!(matches!(table.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_transform_apply() {
        assert_eq!(Transform::None.apply(-3.0), -3.0);
        assert_eq!(Transform::Log1p.apply(-3.0), 0.0);
    }
}
