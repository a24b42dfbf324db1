use crate::{FundamentalsSnapshot, HealthScore};

/// Trait for financial health scoring engines.
///
/// Scoring is a pure, synchronous computation over an already-assembled
/// snapshot; implementations must not fail and must not hold mutable state.
pub trait HealthScorer: Send + Sync {
    fn score(&self, snapshot: &FundamentalsSnapshot) -> HealthScore;
}
