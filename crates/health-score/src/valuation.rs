use analysis_core::normalize::sigmoid;
use analysis_core::{FundamentalsSnapshot, RatioType, ValuationAssessment, ValuationClass};

use crate::benchmark::BenchmarkTable;
use crate::config::ValuationConfig;

pub struct ValuationAssessor<'a> {
    benchmarks: &'a BenchmarkTable,
    config: &'a ValuationConfig,
}

impl<'a> ValuationAssessor<'a> {
    pub fn new(benchmarks: &'a BenchmarkTable, config: &'a ValuationConfig) -> Self {
        Self { benchmarks, config }
    }

    /// Profitable companies are compared on P/E, everyone else on P/S.
    pub fn ratio_type(snapshot: &FundamentalsSnapshot) -> RatioType {
        if snapshot.net_income.is_some_and(|ni| ni > 0.0) {
            RatioType::PriceToEarnings
        } else {
            RatioType::PriceToSales
        }
    }

    pub fn classify(&self, deviation: f64) -> ValuationClass {
        if deviation <= -self.config.fair_band {
            ValuationClass::Undervalued
        } else if deviation >= self.config.fair_band {
            ValuationClass::Overvalued
        } else {
            ValuationClass::FairlyValued
        }
    }

    pub fn assess(&self, snapshot: &FundamentalsSnapshot) -> ValuationAssessment {
        let benchmark = self.benchmarks.for_snapshot(snapshot);
        let ratio_type = Self::ratio_type(snapshot);
        let (ratio, average) = match ratio_type {
            RatioType::PriceToEarnings => (snapshot.pe_ratio, benchmark.pe_avg),
            RatioType::PriceToSales => (snapshot.ps_ratio, benchmark.ps_avg),
        };
        let ratio = ratio.filter(|r| r.is_finite());
        let average = average.filter(|b| b.is_finite());

        let (r, b) = match (ratio, average) {
            (Some(r), Some(b)) if r > 0.0 && b > 0.0 => (r, b),
            _ => {
                tracing::debug!(
                    "No {} valuation for {}: ratio={:?} benchmark={:?}",
                    ratio_type.label(),
                    snapshot.symbol,
                    ratio,
                    average
                );
                return ValuationAssessment {
                    ratio_type,
                    ratio,
                    benchmark: average,
                    deviation: None,
                    classification: ValuationClass::Unknown,
                    normalized_score: None,
                };
            }
        };

        let deviation = (r - b) / b;
        // Cheaper than the benchmark pushes the score toward 1
        let normalized = sigmoid((-deviation.clamp(-1.0, 1.0) + 1.0) / 2.0);

        ValuationAssessment {
            ratio_type,
            ratio: Some(r),
            benchmark: Some(b),
            deviation: Some(deviation),
            classification: self.classify(deviation),
            normalized_score: Some(normalized),
        }
    }
}
