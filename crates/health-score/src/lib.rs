use std::borrow::Cow;

use analysis_core::{AnalysisError, FundamentalsSnapshot, HealthScore, HealthScorer, HealthScoreDetail};
use serde::{Deserialize, Serialize};

pub mod benchmark;
pub mod composite;
pub mod config;
pub mod core_health;
pub mod explain;
pub mod growth;
pub mod metrics;
pub mod resilience;
pub mod resolver;
pub mod valuation;

#[cfg(test)]
mod tests;

pub use benchmark::{Benchmark, BenchmarkTable, DisplayMetrics};
pub use composite::{CompositeAggregator, CompositeBreakdown};
pub use config::ScoringConfig;
pub use core_health::{CoreHealthAssessment, CoreHealthScorer};
pub use growth::{GrowthAssessment, GrowthScorer};
pub use metrics::{Direction, MetricConfig, MetricTable, Transform};
pub use resilience::{ResilienceAssessment, ResilienceScorer};
pub use resolver::{CapTier, RangeWeightResolver};
pub use valuation::ValuationAssessor;

/// A [`HealthScore`] together with the intermediate assessments it was
/// built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: HealthScore,
    pub core_health: CoreHealthAssessment,
    pub growth: GrowthAssessment,
    pub resilience: Option<ResilienceAssessment>,
    pub composite: CompositeBreakdown,
}

impl ScoreReport {
    pub fn core_details(&self) -> Vec<HealthScoreDetail> {
        explain::explain_core(&self.score)
    }

    pub fn growth_details(&self) -> Vec<HealthScoreDetail> {
        explain::explain_growth(&self.growth)
    }

    /// Empty when resilience could not be computed.
    pub fn resilience_details(&self) -> Vec<HealthScoreDetail> {
        self.resilience
            .as_ref()
            .map(explain::explain_resilience)
            .unwrap_or_default()
    }
}

/// Financial health scoring engine.
///
/// Holds the tunable constants and the metric/benchmark tables. Scoring never
/// mutates the engine, so one instance can be shared across threads.
pub struct FinancialHealthEngine {
    config: ScoringConfig,
    metrics: Cow<'static, MetricTable>,
    benchmarks: Cow<'static, BenchmarkTable>,
}

impl FinancialHealthEngine {
    pub fn new() -> Self {
        Self {
            config: ScoringConfig::default(),
            metrics: Cow::Borrowed(MetricTable::standard()),
            benchmarks: Cow::Borrowed(BenchmarkTable::standard()),
        }
    }

    /// Replace the scoring constants. The config is validated first.
    pub fn with_config(mut self, config: ScoringConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_metric_table(mut self, metrics: MetricTable) -> Self {
        self.metrics = Cow::Owned(metrics);
        self
    }

    pub fn with_benchmarks(mut self, benchmarks: BenchmarkTable) -> Self {
        self.benchmarks = Cow::Owned(benchmarks);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn metric_table(&self) -> &MetricTable {
        &self.metrics
    }

    pub fn benchmarks(&self) -> &BenchmarkTable {
        &self.benchmarks
    }

    /// P/E or P/S next to its benchmark, for presentation alongside a score.
    pub fn display_metrics(&self, snapshot: &FundamentalsSnapshot) -> DisplayMetrics {
        self.benchmarks
            .display_metrics(&snapshot.sanitized().with_derived_fields())
    }

    pub fn score(&self, snapshot: &FundamentalsSnapshot) -> HealthScore {
        self.score_detailed(snapshot).score
    }

    pub fn score_detailed(&self, snapshot: &FundamentalsSnapshot) -> ScoreReport {
        let snapshot = snapshot.sanitized().with_derived_fields();
        let config = &self.config;

        let core_health = CoreHealthScorer::new(&self.metrics, &config.resolver).score(&snapshot);
        let valuation = ValuationAssessor::new(&self.benchmarks, &config.valuation).assess(&snapshot);
        let growth = GrowthScorer::new(&config.growth).score(&snapshot, Some(&valuation));
        let resilience = ResilienceScorer::new(&config.resilience).score(&snapshot);

        let blend = CompositeAggregator::new(&config.composite).aggregate(
            core_health.score,
            growth.score,
            resilience.as_ref().map(|r| r.level),
        );

        tracing::debug!(
            "Scored {}: composite={} core={:?} growth={:?} resilience={:?} valuation={}",
            snapshot.symbol,
            blend.composite,
            core_health.score,
            growth.score,
            resilience.as_ref().map(|r| r.level),
            valuation.classification.to_label()
        );

        // Nothing to report when neither side of the comparison is known
        let valuation = (valuation.ratio.is_some() || valuation.benchmark.is_some()).then_some(valuation);

        let score = HealthScore {
            symbol: snapshot.symbol.clone(),
            composite_score: blend.composite,
            core_health_score: composite::to_score(blend.core_health),
            growth_score: composite::to_score(blend.growth),
            resilience_score: composite::to_score(blend.resilience),
            core_health_value: core_health.score,
            growth_value: growth.score,
            resilience_level: resilience.as_ref().map(|r| r.level),
            breakdown: core_health.breakdown.clone(),
            valuation,
        };

        ScoreReport {
            score,
            core_health,
            growth,
            resilience,
            composite: blend,
        }
    }
}

impl HealthScorer for FinancialHealthEngine {
    fn score(&self, snapshot: &FundamentalsSnapshot) -> HealthScore {
        FinancialHealthEngine::score(self, snapshot)
    }
}

impl Default for FinancialHealthEngine {
    fn default() -> Self {
        Self::new()
    }
}
