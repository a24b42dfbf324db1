//! Snapshot sanitation and derivation of missing fields from present ones.

use crate::normalize::{mean, relative_change, safe_ratio};
use crate::types::{FundamentalsSnapshot, MAX_HISTORY};

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Keep at most `MAX_HISTORY` points and stop at the first non-finite one so
/// that index `i` always means "i years ago".
fn finite_history(history: &[f64]) -> Vec<f64> {
    history
        .iter()
        .take(MAX_HISTORY)
        .take_while(|v| v.is_finite())
        .copied()
        .collect()
}

/// Year-over-year relative changes, most recent first.
fn yearly_changes(history: &[f64]) -> Vec<f64> {
    history
        .windows(2)
        .filter_map(|pair| relative_change(pair[0], pair[1]))
        .collect()
}

impl FundamentalsSnapshot {
    /// Copy of the snapshot with every non-finite number treated as absent.
    pub fn sanitized(&self) -> Self {
        Self {
            symbol: self.symbol.clone(),
            company_name: self.company_name.clone(),
            sector: self.sector.clone(),
            industry: self.industry.clone(),
            price: finite(self.price),
            market_cap: finite(self.market_cap),
            revenue: finite(self.revenue),
            net_income: finite(self.net_income),
            eps: finite(self.eps),
            pe_ratio: finite(self.pe_ratio),
            ps_ratio: finite(self.ps_ratio),
            pb_ratio: finite(self.pb_ratio),
            roe: finite(self.roe),
            debt_to_equity: finite(self.debt_to_equity),
            free_cash_flow: finite(self.free_cash_flow),
            operating_cash_flow: finite(self.operating_cash_flow),
            ebitda: finite(self.ebitda),
            outstanding_shares: finite(self.outstanding_shares),
            total_assets: finite(self.total_assets),
            total_liabilities: finite(self.total_liabilities),
            total_current_assets: finite(self.total_current_assets),
            total_current_liabilities: finite(self.total_current_liabilities),
            retained_earnings: finite(self.retained_earnings),
            working_capital: finite(self.working_capital),
            free_cash_flow_margin: finite(self.free_cash_flow_margin),
            ebitda_margin_growth: finite(self.ebitda_margin_growth),
            revenue_growth: finite(self.revenue_growth),
            average_revenue_growth: finite(self.average_revenue_growth),
            average_net_income_growth: finite(self.average_net_income_growth),
            revenue_history: finite_history(&self.revenue_history),
            net_income_history: finite_history(&self.net_income_history),
            ebitda_history: finite_history(&self.ebitda_history),
        }
    }

    /// Fill absent fields that can be computed from fields that are present.
    /// Present values are never overwritten.
    pub fn with_derived_fields(mut self) -> Self {
        if self.market_cap.is_none() {
            if let (Some(price), Some(shares)) = (self.price, self.outstanding_shares) {
                if price > 0.0 && shares > 0.0 {
                    self.market_cap = Some(price * shares);
                }
            }
        }

        self.revenue = self.revenue.or_else(|| self.revenue_history.first().copied());
        self.net_income = self.net_income.or_else(|| self.net_income_history.first().copied());
        self.ebitda = self.ebitda.or_else(|| self.ebitda_history.first().copied());

        if self.pe_ratio.is_none() {
            if let (Some(price), Some(eps)) = (self.price, self.eps) {
                if eps > 0.0 {
                    self.pe_ratio = safe_ratio(price, eps);
                }
            }
        }

        if self.ps_ratio.is_none() {
            if let (Some(market_cap), Some(revenue)) = (self.market_cap, self.revenue) {
                if revenue > 0.0 {
                    self.ps_ratio = safe_ratio(market_cap, revenue);
                }
            }
        }

        // Book equity from the balance sheet
        let equity = match (self.total_assets, self.total_liabilities) {
            (Some(assets), Some(liabilities)) if assets - liabilities > 0.0 => {
                Some(assets - liabilities)
            }
            _ => None,
        };
        if let Some(equity) = equity {
            if self.roe.is_none() {
                self.roe = self.net_income.and_then(|ni| safe_ratio(ni, equity));
            }
            if self.debt_to_equity.is_none() {
                self.debt_to_equity = self.total_liabilities.and_then(|l| safe_ratio(l, equity));
            }
            if self.pb_ratio.is_none() {
                self.pb_ratio = self.market_cap.and_then(|cap| safe_ratio(cap, equity));
            }
        }

        if self.working_capital.is_none() {
            if let (Some(current_assets), Some(current_liabilities)) =
                (self.total_current_assets, self.total_current_liabilities)
            {
                self.working_capital = Some(current_assets - current_liabilities);
            }
        }

        if self.free_cash_flow_margin.is_none() {
            if let (Some(fcf), Some(revenue)) = (self.free_cash_flow, self.revenue) {
                self.free_cash_flow_margin = safe_ratio(fcf, revenue);
            }
        }

        let revenue_changes = yearly_changes(&self.revenue_history);
        if self.revenue_growth.is_none() && self.revenue_history.len() >= 2 {
            self.revenue_growth =
                relative_change(self.revenue_history[0], self.revenue_history[1]);
        }
        if self.average_revenue_growth.is_none() {
            self.average_revenue_growth = mean(&revenue_changes);
        }
        if self.average_net_income_growth.is_none() {
            self.average_net_income_growth = mean(&yearly_changes(&self.net_income_history));
        }

        if self.ebitda_margin_growth.is_none()
            && self.ebitda_history.len() >= 2
            && self.revenue_history.len() >= 2
        {
            let latest = safe_ratio(self.ebitda_history[0], self.revenue_history[0]);
            let prior = safe_ratio(self.ebitda_history[1], self.revenue_history[1]);
            if let (Some(latest), Some(prior)) = (latest, prior) {
                self.ebitda_margin_growth = Some(latest - prior);
            }
        }

        self
    }
}
