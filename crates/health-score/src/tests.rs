#[cfg(test)]
mod engine_tests {
    use crate::{Benchmark, BenchmarkTable, FinancialHealthEngine, MetricConfig, MetricTable, ScoringConfig};
    use analysis_core::{AnalysisError, FundamentalsSnapshot, HealthScorer, MetricKey, ScoreBand, ValuationClass};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    /// Mid-cap industrial with a complete balance sheet and a few years of history.
    fn sample_snapshot() -> FundamentalsSnapshot {
        let mut s = FundamentalsSnapshot::new("ACME");
        s.company_name = Some("Acme Industries".to_string());
        s.sector = Some("Industrials".to_string());
        s.industry = Some("Industrial Machinery".to_string());
        s.price = Some(50.0);
        s.outstanding_shares = Some(100_000_000.0);
        s.eps = Some(2.5);
        s.free_cash_flow = Some(250_000_000.0);
        s.operating_cash_flow = Some(400_000_000.0);
        s.total_assets = Some(6_000_000_000.0);
        s.total_liabilities = Some(3_000_000_000.0);
        s.total_current_assets = Some(2_000_000_000.0);
        s.total_current_liabilities = Some(1_200_000_000.0);
        s.retained_earnings = Some(1_500_000_000.0);
        s.revenue_history = vec![3_000_000_000.0, 2_700_000_000.0, 2_500_000_000.0];
        s.net_income_history = vec![250_000_000.0, 220_000_000.0, 200_000_000.0];
        s.ebitda_history = vec![500_000_000.0, 430_000_000.0];
        s
    }

    /// Balance sheet with Z = 3.52 (safe zone).
    fn safe_balance_sheet() -> FundamentalsSnapshot {
        let mut s = FundamentalsSnapshot::new("SAFE");
        s.total_assets = Some(1_000.0);
        s.total_liabilities = Some(400.0);
        s.working_capital = Some(200.0);
        s.retained_earnings = Some(300.0);
        s.ebitda = Some(200.0);
        s.market_cap = Some(800.0);
        s.revenue = Some(1_000.0);
        s
    }

    #[test]
    fn test_empty_snapshot_is_neutral() {
        let engine = FinancialHealthEngine::new();
        let score = engine.score(&FundamentalsSnapshot::new("EMPTY"));
        assert_eq!(score.symbol, "EMPTY");
        assert_eq!(score.composite_score, 5);
        assert_eq!(score.core_health_score, 5);
        assert_eq!(score.growth_score, 5);
        assert_eq!(score.resilience_score, 5);
        assert!(score.core_health_value.is_none());
        assert!(score.growth_value.is_none());
        assert!(score.resilience_level.is_none());
        assert!(score.breakdown.is_empty());
        assert!(score.valuation.is_none());
        assert_eq!(score.band(), ScoreBand::Medium);
    }

    #[test]
    fn test_zero_assets_uses_neutral_resilience() {
        let engine = FinancialHealthEngine::new();
        let mut s = sample_snapshot();
        s.total_assets = Some(0.0);
        let score = engine.score(&s);
        assert!(score.resilience_level.is_none());
        assert_eq!(score.resilience_score, 5);
        assert!(score.core_health_value.is_some());
    }

    #[test]
    fn test_technology_small_cap_high_growth_weights() {
        let engine = FinancialHealthEngine::new();
        let mut s = FundamentalsSnapshot::new("TINY");
        s.sector = Some("Technology".to_string());
        s.market_cap = Some(1_500_000_000.0);
        s.revenue = Some(300_000_000.0);
        s.net_income = Some(10_000_000.0);
        s.revenue_growth = Some(0.25);
        let score = engine.score(&s);

        let revenue = score.metric(MetricKey::Revenue).unwrap();
        assert_relative_eq!(revenue.weight, 0.20 * 1.4, epsilon = 1e-12);
        let net_income = score.metric(MetricKey::NetIncome).unwrap();
        assert_relative_eq!(net_income.weight, 0.08 * 0.8, epsilon = 1e-12);
        // P/S derived as cap / revenue = 5.0
        let ps = score.metric(MetricKey::PsRatio).unwrap();
        assert_relative_eq!(ps.value, 5.0);
        assert_relative_eq!(ps.weight, 0.15 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_consecutive_losses_drop_resilience_level() {
        let engine = FinancialHealthEngine::new();
        let clean = engine.score(&safe_balance_sheet());
        assert_eq!(clean.resilience_level, Some(3));
        assert_eq!(clean.resilience_score, 10);

        let mut s = safe_balance_sheet();
        s.net_income_history = vec![-10.0, -5.0];
        let penalized = engine.score(&s);
        assert_eq!(penalized.resilience_level, Some(2));
        assert_eq!(penalized.resilience_score, 7);
    }

    #[test]
    fn test_fair_valuation_at_benchmark() {
        let engine = FinancialHealthEngine::new().with_benchmarks(
            BenchmarkTable::empty().with_sector("Widgets", Benchmark::new(Some(20.0), Some(4.0))),
        );
        let mut s = FundamentalsSnapshot::new("FAIR");
        s.sector = Some("Widgets".to_string());
        s.net_income = Some(1_000_000.0);
        s.pe_ratio = Some(20.0);

        let report = engine.score_detailed(&s);
        let valuation = report.score.valuation.as_ref().unwrap();
        assert_eq!(valuation.classification, ValuationClass::FairlyValued);
        assert_relative_eq!(valuation.deviation.unwrap(), 0.0);
        assert_relative_eq!(valuation.normalized_score.unwrap(), 0.5);
        // Only valuation fed growth, and it sat at neutral
        assert_relative_eq!(report.growth.score.unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_valuation_is_reported_when_benchmark_exists() {
        let engine = FinancialHealthEngine::new();
        let mut s = FundamentalsSnapshot::new("NOPS");
        s.sector = Some("Technology".to_string());
        s.net_income = Some(-5.0);
        let score = engine.score(&s);
        let valuation = score.valuation.unwrap();
        assert_eq!(valuation.classification, ValuationClass::Unknown);
        assert!(valuation.ratio.is_none());
        assert!(valuation.benchmark.is_some());
    }

    #[test]
    fn test_missing_metrics_are_omitted_not_zeroed() {
        let engine = FinancialHealthEngine::new();
        let mut s = FundamentalsSnapshot::new("ROE");
        s.roe = Some(0.15);
        let score = engine.score(&s);
        assert_eq!(score.breakdown.len(), 1);
        assert_eq!(score.breakdown[0].metric, MetricKey::Roe);
        assert!(score.metric(MetricKey::Revenue).is_none());
    }

    #[test]
    fn test_non_finite_inputs_behave_as_absent() {
        let engine = FinancialHealthEngine::new();
        let mut dirty = sample_snapshot();
        dirty.operating_cash_flow = Some(f64::NAN);
        dirty.pb_ratio = Some(f64::INFINITY);
        let mut clean = sample_snapshot();
        clean.operating_cash_flow = None;
        clean.pb_ratio = None;
        assert_eq!(engine.score(&dirty), engine.score(&clean));
    }

    #[test]
    fn test_full_snapshot_breakdown() {
        let engine = FinancialHealthEngine::new();
        let report = engine.score_detailed(&sample_snapshot());
        let score = &report.score;

        assert!(score.composite_score <= 10);
        assert!(score.core_health_value.is_some());
        assert!(score.growth_value.is_some());
        assert!(score.resilience_level.is_some());
        assert_eq!(score.band(), ScoreBand::from_score(score.composite_score));

        // Breakdown follows metric declaration order
        let order: Vec<usize> = score
            .breakdown
            .iter()
            .map(|m| MetricKey::ALL.iter().position(|k| *k == m.metric).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        for m in &score.breakdown {
            assert!((0.0..=100.0).contains(&m.normalized));
            assert_relative_eq!(m.contribution, m.normalized / 100.0 * m.weight, epsilon = 1e-12);
        }

        assert_eq!(report.core_details().len(), score.breakdown.len());
        assert_eq!(report.growth_details().len(), 6);
        assert!(!report.resilience_details().is_empty());
    }

    #[test]
    fn test_trait_object_scores_like_engine() {
        let engine = FinancialHealthEngine::new();
        let scorer: &dyn HealthScorer = &engine;
        let s = sample_snapshot();
        assert_eq!(scorer.score(&s), engine.score(&s));
    }

    #[test]
    fn test_config_weights_change_composite() {
        let mut config = ScoringConfig::default();
        config.composite.core_health = 0.0001;
        config.composite.growth = 0.0001;
        config.composite.resilience = 1.0;
        let engine = FinancialHealthEngine::new().with_config(config).unwrap();
        // Resilience dominates: safe zone -> ~10
        assert_eq!(engine.score(&safe_balance_sheet()).composite_score, 10);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ScoringConfig::default();
        config.composite.core_health = f64::NAN;
        let err = FinancialHealthEngine::new().with_config(config).err().unwrap();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_revenue_growth_falls_back_to_average() {
        let engine = FinancialHealthEngine::new();
        let mut s = FundamentalsSnapshot::new("MID");
        s.market_cap = Some(50_000_000_000.0);
        s.revenue = Some(10_000_000_000.0);
        s.average_revenue_growth = Some(0.30);
        let score = engine.score(&s);
        assert_relative_eq!(score.metric(MetricKey::Revenue).unwrap().weight, 0.12 * 1.2, epsilon = 1e-12);
        assert_relative_eq!(score.metric(MetricKey::PsRatio).unwrap().weight, 0.08 * 1.2, epsilon = 1e-12);

        // the most recent growth wins when both are present
        s.revenue_growth = Some(0.05);
        let score = engine.score(&s);
        assert_relative_eq!(score.metric(MetricKey::Revenue).unwrap().weight, 0.12, epsilon = 1e-12);
    }

    fn scaled_table(k: f64) -> MetricTable {
        let base = MetricTable::standard();
        base.metrics()
            .fold(base.clone(), |table, (metric, config)| {
                table.with_metric(
                    metric,
                    MetricConfig {
                        base_weight: config.base_weight * k,
                        ..*config
                    },
                )
            })
    }

    fn snapshot_strategy() -> impl Strategy<Value = FundamentalsSnapshot> {
        (
            (
                prop::option::of(1e6f64..1e12),
                prop::option::of(-1e9f64..1e10),
                prop::option::of(-1e8f64..1e9),
                prop::option::of(-5.0f64..10.0),
                prop::option::of(0.5f64..200.0),
            ),
            (
                prop::option::of(1e6f64..1e12),
                prop::option::of(1e5f64..5e11),
                prop::option::of(-1e9f64..1e10),
                prop::option::of(-0.5f64..1.0),
                prop::collection::vec(-1e9f64..1e9, 0..5),
            ),
        )
            .prop_map(
                |(
                    (market_cap, revenue, net_income, eps, price),
                    (assets, liabilities, retained, growth, net_income_history),
                )| {
                    let mut s = FundamentalsSnapshot::new("PROP");
                    s.market_cap = market_cap;
                    s.revenue = revenue;
                    s.net_income = net_income;
                    s.eps = eps;
                    s.price = price;
                    s.total_assets = assets;
                    s.total_liabilities = liabilities;
                    s.retained_earnings = retained;
                    s.working_capital = revenue.map(|r| r * 0.1);
                    s.ebitda = net_income.map(|ni| ni * 1.5);
                    s.revenue_growth = growth;
                    s.net_income_history = net_income_history;
                    s
                },
            )
    }

    proptest! {
        #[test]
        fn composite_is_always_in_range(s in snapshot_strategy()) {
            let score = FinancialHealthEngine::new().score(&s);
            prop_assert!(score.composite_score <= 10);
            prop_assert!(score.core_health_score <= 10);
            prop_assert!(score.growth_score <= 10);
            prop_assert!(score.resilience_score <= 10);
        }

        #[test]
        fn scoring_is_idempotent(s in snapshot_strategy()) {
            let engine = FinancialHealthEngine::new();
            let first = engine.score(&s);
            prop_assert_eq!(&first, &engine.score(&s));
            prop_assert_eq!(&first, &engine.score(&s.sanitized().with_derived_fields()));
        }

        #[test]
        fn uniform_weight_rescale_preserves_core_health(s in snapshot_strategy(), k in 0.1f64..10.0) {
            let base = FinancialHealthEngine::new().score(&s);
            let scaled = FinancialHealthEngine::new().with_metric_table(scaled_table(k)).score(&s);
            match (base.core_health_value, scaled.core_health_value) {
                (Some(a), Some(b)) => prop_assert!((a - b).abs() < 1e-9),
                (a, b) => prop_assert_eq!(a, b),
            }
        }
    }
}
