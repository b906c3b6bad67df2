//! # Profit / Loss Calculations
//!
//! Four small pricing calculations. Each follows the same pattern as the
//! rest of the crate: a JSON-serializable result and a pure function that
//! returns `None` when the inputs cannot produce a result (cost not
//! positive, divisor zero). Nothing here raises an error; a missing result
//! leaves the display empty.
//!
//! ## Example
//!
//! ```rust
//! use mathbox_core::profit_loss::{profit_or_loss, Outcome};
//!
//! let result = profit_or_loss(150.0, 100.0).unwrap();
//! assert_eq!(result.outcome, Outcome::Loss);
//! assert_eq!(result.amount, 50.0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::parse_finite;

/// Whether a sale made or lost money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Profit,
    Loss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Profit => f.write_str("Profit"),
            Outcome::Loss => f.write_str("Loss"),
        }
    }
}

/// Result of a cost/selling price comparison.
///
/// `amount` and `percentage` are absolute values; `outcome` carries the sign.
///
/// ## JSON Example
///
/// ```json
/// { "amount": 50.0, "percentage": 50.0, "outcome": "Profit" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitLossResult {
    pub amount: f64,
    pub percentage: f64,
    pub outcome: Outcome,
}

impl ProfitLossResult {
    /// Display line, e.g. `"$50.00 (50.00% profit)"`
    pub fn summary(&self) -> String {
        format!(
            "${:.2} ({:.2}% {})",
            self.amount,
            self.percentage,
            self.outcome.to_string().to_lowercase()
        )
    }
}

/// Selling price and margin derived from a markup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkupResult {
    pub selling_price: f64,
    pub margin: f64,
}

/// Profit or loss of selling at `selling_price` something bought at `cost_price`.
///
/// `None` unless `cost_price > 0`.
pub fn profit_or_loss(cost_price: f64, selling_price: f64) -> Option<ProfitLossResult> {
    if cost_price <= 0.0 {
        return None;
    }
    let amount = selling_price - cost_price;
    let percentage = (amount / cost_price) * 100.0;
    let outcome = if amount >= 0.0 { Outcome::Profit } else { Outcome::Loss };
    Some(ProfitLossResult {
        amount: amount.abs(),
        percentage: percentage.abs(),
        outcome,
    })
}

/// Selling price that yields `profit_percent` on `cost_price` (cost must be positive)
pub fn selling_price(cost_price: f64, profit_percent: f64) -> Option<f64> {
    if cost_price <= 0.0 {
        return None;
    }
    Some(cost_price * (1.0 + profit_percent / 100.0))
}

/// Cost price behind `selling_price` sold at `profit_percent` profit.
///
/// `None` when `100 + profit_percent` is zero.
pub fn cost_price(selling_price: f64, profit_percent: f64) -> Option<f64> {
    let divisor = 100.0 + profit_percent;
    if divisor == 0.0 {
        return None;
    }
    Some(selling_price * 100.0 / divisor)
}

/// Selling price and gross margin for a cost marked up by `markup_percent`
pub fn markup_margin(cost: f64, markup_percent: f64) -> Option<MarkupResult> {
    if cost <= 0.0 {
        return None;
    }
    let selling_price = cost * (1.0 + markup_percent / 100.0);
    if selling_price == 0.0 {
        return None;
    }
    let margin = (selling_price - cost) / selling_price * 100.0;
    Some(MarkupResult { selling_price, margin })
}

/// Text front door for [`profit_or_loss`]
pub fn profit_or_loss_text(cost_price: &str, selling_price: &str) -> Option<ProfitLossResult> {
    profit_or_loss(parse_finite(cost_price)?, parse_finite(selling_price)?)
}

/// Text front door for [`selling_price`]
pub fn selling_price_text(cost_price: &str, profit_percent: &str) -> Option<f64> {
    selling_price(parse_finite(cost_price)?, parse_finite(profit_percent)?)
}

/// Text front door for [`cost_price`]
pub fn cost_price_text(selling_price: &str, profit_percent: &str) -> Option<f64> {
    cost_price(parse_finite(selling_price)?, parse_finite(profit_percent)?)
}

/// Text front door for [`markup_margin`]
pub fn markup_margin_text(cost: &str, markup_percent: &str) -> Option<MarkupResult> {
    markup_margin(parse_finite(cost)?, parse_finite(markup_percent)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit() {
        let r = profit_or_loss(100.0, 150.0).unwrap();
        assert_eq!(r.amount, 50.0);
        assert_eq!(r.percentage, 50.0);
        assert_eq!(r.outcome, Outcome::Profit);
        assert_eq!(r.summary(), "$50.00 (50.00% profit)");
    }

    #[test]
    fn test_loss() {
        let r = profit_or_loss(150.0, 100.0).unwrap();
        assert_eq!(r.amount, 50.0);
        assert!((r.percentage - 33.3333).abs() < 1e-3);
        assert_eq!(r.outcome, Outcome::Loss);
    }

    #[test]
    fn test_break_even_is_profit() {
        let r = profit_or_loss(80.0, 80.0).unwrap();
        assert_eq!(r.outcome, Outcome::Profit);
        assert_eq!(r.amount, 0.0);
    }

    #[test]
    fn test_cost_must_be_positive() {
        assert!(profit_or_loss(0.0, 10.0).is_none());
        assert!(selling_price(-5.0, 10.0).is_none());
        assert!(markup_margin(0.0, 25.0).is_none());
    }

    #[test]
    fn test_selling_and_cost_price() {
        assert!((selling_price(200.0, 25.0).unwrap() - 250.0).abs() < 1e-9);
        assert!((cost_price(250.0, 25.0).unwrap() - 200.0).abs() < 1e-9);
        assert_eq!(cost_price(250.0, -100.0), None);
    }

    #[test]
    fn test_markup_to_margin() {
        let r = markup_margin(100.0, 25.0).unwrap();
        assert!((r.selling_price - 125.0).abs() < 1e-9);
        assert!((r.margin - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_front_doors() {
        assert!(profit_or_loss_text("", "10").is_none());
        assert!(selling_price_text("abc", "10").is_none());
        assert!(cost_price_text("110", "10").is_some());
        assert!(markup_margin_text("50", "100").is_some());
    }

    #[test]
    fn test_result_json() {
        let r = profit_or_loss(100.0, 150.0).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"amount":50.0,"percentage":50.0,"outcome":"Profit"}"#);
    }
}
