//! Primary-market yield calculator.
//!
//! Hold-to-maturity economics for a bill bought at auction:
//! gross = amount × (yield/100) × tenor/365, tax off the gross,
//! payout = amount + net.

use serde::Serialize;

use crate::types::YieldCurveSnapshot;

/// Full breakdown of a hold-to-maturity investment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryYieldBreakdown {
    pub investment_amount: f64,
    pub tenor_days: u32,
    pub yield_percent: f64,
    pub tax_rate_percent: f64,
    pub gross_return: f64,
    pub tax_amount: f64,
    pub net_return: f64,
    pub total_payout: f64,
}

/// Net return at one published tenor, for the quick-comparison panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenorComparison {
    pub tenor_days: u32,
    pub yield_percent: f64,
    pub net_return: f64,
}

/// Compute the realized return of holding a bill to maturity.
pub fn primary_yield(
    investment_amount: f64,
    tenor_days: u32,
    yield_percent: f64,
    tax_rate_percent: f64,
) -> PrimaryYieldBreakdown {
    let gross_return = investment_amount * (yield_percent / 100.0) * tenor_days as f64 / 365.0;
    let tax_amount = gross_return * tax_rate_percent / 100.0;
    let net_return = gross_return - tax_amount;
    let total_payout = investment_amount + net_return;

    PrimaryYieldBreakdown {
        investment_amount,
        tenor_days,
        yield_percent,
        tax_rate_percent,
        gross_return,
        tax_amount,
        net_return,
        total_payout,
    }
}

/// Net returns at every tenor of the snapshot for the same investment
/// amount, ascending by tenor.
pub fn compare_net_returns(
    snapshot: &YieldCurveSnapshot,
    investment_amount: f64,
    tax_rate_percent: f64,
) -> Vec<TenorComparison> {
    snapshot
        .quotes
        .iter()
        .map(|q| {
            let b = primary_yield(
                investment_amount,
                q.tenor_days,
                q.yield_percent,
                tax_rate_percent,
            );
            TenorComparison {
                tenor_days: q.tenor_days,
                yield_percent: q.yield_percent,
                net_return: b.net_return,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
