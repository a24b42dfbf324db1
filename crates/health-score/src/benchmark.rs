//! Industry and sector average valuation multiples.

use std::collections::HashMap;
use std::sync::LazyLock;

use analysis_core::FundamentalsSnapshot;
use serde::{Deserialize, Serialize};

/// Average P/E and P/S for an industry or sector. Either may be absent,
/// e.g. loss-making industries have no meaningful average P/E.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub pe_avg: Option<f64>,
    pub ps_avg: Option<f64>,
}

impl Benchmark {
    pub const fn new(pe_avg: Option<f64>, ps_avg: Option<f64>) -> Self {
        Self { pe_avg, ps_avg }
    }
}

/// Ratio shown next to its benchmark: P/E for profitable companies, P/S otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub primary_ratio: Option<f64>,
    pub primary_label: String,
    pub benchmark_ratio: Option<f64>,
    pub benchmark_label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkTable {
    #[serde(default)]
    industries: HashMap<String, Benchmark>,
    #[serde(default)]
    sectors: HashMap<String, Benchmark>,
}

const INDUSTRY_BENCHMARKS: &[(&str, Benchmark)] = &[
    // Technology
    ("Software", Benchmark::new(Some(28.5), Some(8.2))),
    ("Semiconductors", Benchmark::new(Some(22.1), Some(5.8))),
    ("Hardware", Benchmark::new(Some(18.7), Some(3.4))),
    ("Internet Content & Information", Benchmark::new(Some(24.3), Some(6.9))),
    ("Electronic Gaming & Multimedia", Benchmark::new(Some(26.8), Some(4.1))),
    ("Consumer Electronics", Benchmark::new(Some(15.2), Some(1.8))),
    // Healthcare
    ("Biotechnology", Benchmark::new(None, Some(12.4))),
    ("Pharmaceuticals", Benchmark::new(Some(16.8), Some(4.2))),
    ("Medical Devices", Benchmark::new(Some(19.3), Some(6.1))),
    ("Healthcare Plans", Benchmark::new(Some(14.2), Some(0.8))),
    ("Hospitals & Healthcare Services", Benchmark::new(Some(12.6), Some(1.4))),
    // Financial
    ("Banks", Benchmark::new(Some(11.4), Some(1.2))),
    ("Insurance", Benchmark::new(Some(13.8), Some(1.1))),
    ("Investment Banking & Brokerage", Benchmark::new(Some(15.2), Some(2.8))),
    ("Real Estate Investment Trusts (REITs)", Benchmark::new(Some(22.1), Some(8.9))),
    ("Credit Services", Benchmark::new(Some(10.8), Some(3.2))),
    // Consumer
    ("Restaurants", Benchmark::new(Some(28.4), Some(2.1))),
    ("Retail - Apparel", Benchmark::new(Some(16.9), Some(1.3))),
    ("Retail - General", Benchmark::new(Some(14.7), Some(0.8))),
    ("Automotive", Benchmark::new(Some(8.9), Some(0.6))),
    ("Consumer Packaged Goods", Benchmark::new(Some(22.3), Some(3.1))),
    // Industrials
    ("Aerospace & Defense", Benchmark::new(Some(18.6), Some(1.9))),
    ("Manufacturing", Benchmark::new(Some(16.2), Some(1.4))),
    ("Transportation", Benchmark::new(Some(14.8), Some(1.1))),
    ("Construction", Benchmark::new(Some(12.4), Some(0.9))),
    // Energy
    ("Oil & Gas", Benchmark::new(Some(12.1), Some(1.2))),
    ("Renewable Energy", Benchmark::new(Some(19.8), Some(4.6))),
    ("Utilities", Benchmark::new(Some(18.9), Some(2.1))),
    // Materials
    ("Mining", Benchmark::new(Some(11.6), Some(2.8))),
    ("Chemicals", Benchmark::new(Some(14.3), Some(1.7))),
    ("Steel", Benchmark::new(Some(9.2), Some(0.8))),
    // Communications
    ("Telecommunications", Benchmark::new(Some(16.4), Some(2.3))),
    ("Media & Entertainment", Benchmark::new(Some(18.7), Some(3.4))),
    // Real estate
    ("Real Estate Development", Benchmark::new(Some(15.6), Some(2.1))),
    ("Real Estate Services", Benchmark::new(Some(19.2), Some(4.8))),
];

const SECTOR_BENCHMARKS: &[(&str, Benchmark)] = &[
    ("Technology", Benchmark::new(Some(24.2), Some(6.1))),
    ("Healthcare", Benchmark::new(Some(17.4), Some(5.8))),
    ("Financial Services", Benchmark::new(Some(12.8), Some(1.8))),
    ("Consumer Cyclical", Benchmark::new(Some(18.1), Some(1.4))),
    ("Consumer Defensive", Benchmark::new(Some(20.6), Some(2.1))),
    ("Industrials", Benchmark::new(Some(15.7), Some(1.4))),
    ("Energy", Benchmark::new(Some(14.2), Some(1.6))),
    ("Materials", Benchmark::new(Some(12.4), Some(1.8))),
    ("Communication Services", Benchmark::new(Some(17.8), Some(2.9))),
    ("Real Estate", Benchmark::new(Some(18.4), Some(4.2))),
    ("Utilities", Benchmark::new(Some(18.9), Some(2.1))),
];

static DEFAULT_BENCHMARKS: LazyLock<BenchmarkTable> = LazyLock::new(|| BenchmarkTable {
    industries: INDUSTRY_BENCHMARKS
        .iter()
        .map(|(name, b)| (name.to_string(), *b))
        .collect(),
    sectors: SECTOR_BENCHMARKS
        .iter()
        .map(|(name, b)| (name.to_string(), *b))
        .collect(),
});

impl BenchmarkTable {
    /// Built-in table of industry and sector averages.
    pub fn standard() -> &'static BenchmarkTable {
        &DEFAULT_BENCHMARKS
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_industry(mut self, industry: impl Into<String>, benchmark: Benchmark) -> Self {
        self.industries.insert(industry.into(), benchmark);
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>, benchmark: Benchmark) -> Self {
        self.sectors.insert(sector.into(), benchmark);
        self
    }

    /// Industry entry if known, else sector entry, else an empty benchmark.
    pub fn lookup(&self, industry: Option<&str>, sector: Option<&str>) -> Benchmark {
        industry
            .and_then(|i| self.industries.get(i))
            .or_else(|| sector.and_then(|s| self.sectors.get(s)))
            .copied()
            .unwrap_or_default()
    }

    pub fn for_snapshot(&self, snapshot: &FundamentalsSnapshot) -> Benchmark {
        self.lookup(snapshot.industry.as_deref(), snapshot.sector.as_deref())
    }

    pub fn display_metrics(&self, snapshot: &FundamentalsSnapshot) -> DisplayMetrics {
        let benchmark = self.for_snapshot(snapshot);
        if snapshot.net_income.unwrap_or(0.0) > 0.0 {
            DisplayMetrics {
                primary_ratio: snapshot.pe_ratio,
                primary_label: "P/E Ratio".to_string(),
                benchmark_ratio: benchmark.pe_avg,
                benchmark_label: "Avg P/E".to_string(),
            }
        } else {
            DisplayMetrics {
                primary_ratio: snapshot.ps_ratio,
                primary_label: "P/S Ratio".to_string(),
                benchmark_ratio: benchmark.ps_avg,
                benchmark_label: "Avg P/S".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_preferred_over_sector() {
        let b = BenchmarkTable::standard().lookup(Some("Software"), Some("Technology"));
        assert_eq!(b.pe_avg, Some(28.5));
        assert_eq!(b.ps_avg, Some(8.2));
    }

    #[test]
    fn test_sector_fallback() {
        let b = BenchmarkTable::standard().lookup(Some("Quantum Widgets"), Some("Technology"));
        assert_eq!(b.pe_avg, Some(24.2));
    }

    #[test]
    fn test_no_benchmark() {
        let b = BenchmarkTable::standard().lookup(Some("Quantum Widgets"), Some("Nowhere"));
        assert_eq!(b, Benchmark::default());
        let b = BenchmarkTable::standard().lookup(None, None);
        assert_eq!(b, Benchmark::default());
    }

    #[test]
    fn test_loss_making_industry_has_no_pe() {
        // Industry match wins even when its P/E average is absent
        let b = BenchmarkTable::standard().lookup(Some("Biotechnology"), Some("Healthcare"));
        assert!(b.pe_avg.is_none());
        assert_eq!(b.ps_avg, Some(12.4));
    }

    #[test]
    fn test_display_metrics_by_profitability() {
        let mut snapshot = FundamentalsSnapshot::new("SW");
        snapshot.industry = Some("Software".to_string());
        snapshot.pe_ratio = Some(30.0);
        snapshot.ps_ratio = Some(9.0);

        snapshot.net_income = Some(1.0);
        let profitable = BenchmarkTable::standard().display_metrics(&snapshot);
        assert_eq!(profitable.primary_label, "P/E Ratio");
        assert_eq!(profitable.benchmark_ratio, Some(28.5));

        snapshot.net_income = Some(-1.0);
        let unprofitable = BenchmarkTable::standard().display_metrics(&snapshot);
        assert_eq!(unprofitable.primary_label, "P/S Ratio");
        assert_eq!(unprofitable.primary_ratio, Some(9.0));
        assert_eq!(unprofitable.benchmark_label, "Avg P/S");
    }

    #[test]
    fn test_custom_table() {
        let table = BenchmarkTable::empty().with_sector("Widgets", Benchmark::new(Some(10.0), None));
        assert_eq!(table.lookup(None, Some("Widgets")).pe_avg, Some(10.0));
    }
}
