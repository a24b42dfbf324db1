use std::path::PathBuf;

use analysis_core::{FundamentalsSnapshot, HealthScoreDetail};
use anyhow::{bail, Context, Result};
use health_score::{FinancialHealthEngine, ScoringConfig};
use serde::Serialize;

#[derive(Serialize)]
struct Explanation {
    core_health: Vec<HealthScoreDetail>,
    growth: Vec<HealthScoreDetail>,
    resilience: Vec<HealthScoreDetail>,
}

#[derive(Serialize)]
struct Output<T: Serialize> {
    #[serde(flatten)]
    score: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<Explanation>,
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so stdout stays valid JSON
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut path: Option<PathBuf> = None;
    let mut explain = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--explain" => explain = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            _ if path.is_some() => bail!("only one snapshot path may be given"),
            _ => path = Some(PathBuf::from(&arg)),
        }
    }
    let Some(path) = path else {
        bail!("usage: score-snapshot <snapshot.json> [--explain]");
    };

    let config = ScoringConfig::from_env().context("Failed to load scoring config")?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot = FundamentalsSnapshot::from_json_str(&raw)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

    let engine = FinancialHealthEngine::new().with_config(config)?;
    let report = engine.score_detailed(&snapshot);
    tracing::info!(
        "{}: composite {}/10 ({:?})",
        report.score.symbol,
        report.score.composite_score,
        report.score.band()
    );

    let explanation = explain.then(|| Explanation {
        core_health: report.core_details(),
        growth: report.growth_details(),
        resilience: report.resilience_details(),
    });
    let output = Output {
        score: &report.score,
        explanation,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
