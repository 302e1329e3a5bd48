//! Return calculators.
//!
//! Pure day-count interest arithmetic over validated inputs, the easy
//! part of the system. All rates are annualized percentages on an
//! actual/365 basis; tax applies to gross profit only.

pub mod primary;
pub mod secondary;

pub use primary::{compare_net_returns, primary_yield, PrimaryYieldBreakdown, TenorComparison};
pub use secondary::{secondary_sale, SecondarySaleBreakdown};

/// Calculator input errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CalcError {
    #[error("Holding period must be shorter than the original tenor ({holding_days} >= {original_tenor_days})")]
    HoldingExceedsTenor {
        holding_days: u32,
        original_tenor_days: u32,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
