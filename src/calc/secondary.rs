//! Secondary-market sale calculator.
//!
//! Economics of selling a bill before maturity: both the purchase price
//! and the sale price are the face value discounted at the respective
//! yield over the respective remaining period. Tax hits positive gross
//! profit only; capital losses are not taxed.

use serde::Serialize;

use super::CalcError;

/// Full breakdown of an early-sale decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondarySaleBreakdown {
    pub face_value: f64,
    pub purchase_price: f64,
    pub remaining_days: u32,
    pub sale_price: f64,
    pub gross_profit: f64,
    pub tax_amount: f64,
    pub net_profit: f64,
    /// Net profit annualized over the actual holding period, percent.
    pub annualized_yield_percent: f64,
    /// What holding to maturity would have netted after tax.
    pub net_return_at_maturity: f64,
    /// Net amount conceded for immediate liquidity.
    pub cost_of_liquidity: f64,
    /// `cost_of_liquidity` as a share of the expected net profit, percent.
    pub percent_of_profit_conceded: f64,
}

/// Price an early sale of a bill bought at auction.
///
/// Errors when the holding period consumes the whole tenor, since there is
/// nothing left to sell.
pub fn secondary_sale(
    face_value: f64,
    original_yield_percent: f64,
    original_tenor_days: u32,
    holding_days: u32,
    market_yield_percent: f64,
    tax_rate_percent: f64,
) -> Result<SecondarySaleBreakdown, CalcError> {
    if face_value <= 0.0 {
        return Err(CalcError::InvalidInput(format!(
            "face value must be positive, got {face_value}"
        )));
    }
    if holding_days == 0 {
        return Err(CalcError::InvalidInput(
            "holding period must be at least one day".to_string(),
        ));
    }
    if holding_days >= original_tenor_days {
        return Err(CalcError::HoldingExceedsTenor {
            holding_days,
            original_tenor_days,
        });
    }
    let remaining_days = original_tenor_days - holding_days;

    let purchase_price = face_value
        / (1.0 + original_yield_percent / 100.0 * original_tenor_days as f64 / 365.0);
    let sale_price =
        face_value / (1.0 + market_yield_percent / 100.0 * remaining_days as f64 / 365.0);

    let gross_profit = sale_price - purchase_price;
    let tax_amount = (gross_profit * tax_rate_percent / 100.0).max(0.0);
    let net_profit = gross_profit - tax_amount;
    let annualized_yield_percent =
        (net_profit / purchase_price) * (365.0 / holding_days as f64) * 100.0;

    // Opportunity comparison: what staying until maturity was worth.
    let gross_at_maturity = face_value - purchase_price;
    let net_return_at_maturity = gross_at_maturity * (1.0 - tax_rate_percent / 100.0);
    let cost_of_liquidity = net_return_at_maturity - net_profit;
    let percent_of_profit_conceded = if net_return_at_maturity > 0.0 {
        cost_of_liquidity / net_return_at_maturity * 100.0
    } else {
        0.0
    };

    Ok(SecondarySaleBreakdown {
        face_value,
        purchase_price,
        remaining_days,
        sale_price,
        gross_profit,
        tax_amount,
        net_profit,
        annualized_yield_percent,
        net_return_at_maturity,
        cost_of_liquidity,
        percent_of_profit_conceded,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_reference_case() {
        // 100,000 face, bought at 29%/182d, sold after 60d at market 30%.
        let b = secondary_sale(100_000.0, 29.0, 182, 60, 30.0, 20.0).unwrap();

        assert_eq!(b.remaining_days, 122);
        assert!(b.sale_price < b.face_value);
        // purchase = 100000 / (1 + 0.29*182/365) ≈ 87366.56
        assert!((b.purchase_price - 87_366.56).abs() < 0.5, "p={}", b.purchase_price);
        // sale = 100000 / (1 + 0.30*122/365) ≈ 90886.46
        assert!((b.sale_price - 90_886.46).abs() < 0.5, "s={}", b.sale_price);
        assert!(close(b.gross_profit, b.sale_price - b.purchase_price));
        assert!(close(b.tax_amount, b.gross_profit * 0.20));
        assert!(close(b.net_profit, b.gross_profit - b.tax_amount));
    }

    #[test]
    fn test_holding_equal_to_tenor_is_error() {
        let err = secondary_sale(100_000.0, 29.0, 182, 182, 30.0, 20.0).unwrap_err();
        assert_eq!(
            err,
            CalcError::HoldingExceedsTenor {
                holding_days: 182,
                original_tenor_days: 182
            }
        );
    }

    #[test]
    fn test_holding_longer_than_tenor_is_error() {
        let err = secondary_sale(100_000.0, 29.0, 91, 120, 30.0, 20.0).unwrap_err();
        assert!(matches!(err, CalcError::HoldingExceedsTenor { .. }));
    }

    #[test]
    fn test_zero_holding_days_guarded() {
        let err = secondary_sale(100_000.0, 29.0, 182, 0, 30.0, 20.0).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput(_)));
    }

    #[test]
    fn test_loss_is_not_taxed() {
        // Market yield spiked well above the purchase yield shortly
        // after buying, so the sale realizes a loss.
        let b = secondary_sale(100_000.0, 25.0, 364, 10, 45.0, 20.0).unwrap();
        assert!(b.gross_profit < 0.0);
        assert_eq!(b.tax_amount, 0.0);
        assert_eq!(b.net_profit, b.gross_profit);
    }

    #[test]
    fn test_annualized_yield_sign_follows_profit() {
        let gain = secondary_sale(100_000.0, 29.0, 182, 60, 30.0, 20.0).unwrap();
        assert!(gain.net_profit > 0.0);
        assert!(gain.annualized_yield_percent > 0.0);

        let loss = secondary_sale(100_000.0, 25.0, 364, 10, 45.0, 20.0).unwrap();
        assert!(loss.annualized_yield_percent < 0.0);
    }

    #[test]
    fn test_cost_of_liquidity_accounting() {
        let b = secondary_sale(100_000.0, 29.0, 182, 60, 30.0, 20.0).unwrap();
        let expected_maturity_net = (100_000.0 - b.purchase_price) * 0.80;
        assert!(close(b.net_return_at_maturity, expected_maturity_net));
        assert!(close(b.cost_of_liquidity, b.net_return_at_maturity - b.net_profit));
        assert!(b.percent_of_profit_conceded > 0.0);
        assert!(b.percent_of_profit_conceded < 100.0);
    }

    #[test]
    fn test_non_positive_face_value_rejected() {
        assert!(matches!(
            secondary_sale(0.0, 29.0, 182, 60, 30.0, 20.0),
            Err(CalcError::InvalidInput(_))
        ));
        assert!(matches!(
            secondary_sale(-5.0, 29.0, 182, 60, 30.0, 20.0),
            Err(CalcError::InvalidInput(_))
        ));
    }
}
