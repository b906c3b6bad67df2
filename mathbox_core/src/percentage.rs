//! # Percentage Formulas
//!
//! Four independent, stateless formulas. Each returns `None` when its
//! inputs are missing or would divide by zero; the display shows an
//! em-dash in that case.
//!
//! ```rust
//! use mathbox_core::percentage::{percent_of, what_percent, percent_change, adjust_by};
//!
//! assert_eq!(percent_of(20.0, 500.0), Some(100.0));
//! assert_eq!(what_percent(50.0, 200.0), Some(25.0));
//! assert_eq!(percent_change(100.0, 150.0), Some(50.0));
//! assert_eq!(adjust_by(100.0, -20.0), Some(80.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::units::parse_finite;

/// Placeholder shown when a formula has no result
pub const NO_RESULT: &str = "—";

/// What is `percent`% of `value`?
pub fn percent_of(percent: f64, value: f64) -> Option<f64> {
    Some((percent / 100.0) * value)
}

/// `value` is what percent of `total`? `None` when `total` is zero.
pub fn what_percent(value: f64, total: f64) -> Option<f64> {
    if total == 0.0 {
        return None;
    }
    Some((value / total) * 100.0)
}

/// Percentage change from `from` to `to`; negative means a decrease.
/// `None` when `from` is zero.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    Some(((to - from) / from) * 100.0)
}

/// Increase (or, with a negative percent, decrease) `value` by `percent`%
pub fn adjust_by(value: f64, percent: f64) -> Option<f64> {
    Some(value * (1.0 + percent / 100.0))
}

/// Which of the four formulas to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentFormula {
    /// What is A% of B?
    PercentOf,
    /// A is what % of B?
    WhatPercent,
    /// % change from A to B
    Change,
    /// Adjust A by B%
    AdjustBy,
}

impl PercentFormula {
    /// Run the formula on two text fields; blank or unparsable fields give `None`
    pub fn evaluate_text(&self, a: &str, b: &str) -> Option<f64> {
        let a = parse_finite(a)?;
        let b = parse_finite(b)?;
        match self {
            PercentFormula::PercentOf => percent_of(a, b),
            PercentFormula::WhatPercent => what_percent(a, b),
            PercentFormula::Change => percent_change(a, b),
            PercentFormula::AdjustBy => adjust_by(a, b),
        }
    }

    /// Human-readable question for the two operands
    pub fn describe(&self, a: &str, b: &str) -> String {
        match self {
            PercentFormula::PercentOf => format!("What is {}% of {}?", a, b),
            PercentFormula::WhatPercent => format!("{} is what % of {}?", a, b),
            PercentFormula::Change => format!("% change from {} to {}", a, b),
            PercentFormula::AdjustBy => format!("{} adjusted by {}%", a, b),
        }
    }
}

/// Format an optional result with grouping and up to 4 fraction digits
pub fn format_result(value: Option<f64>) -> String {
    match value {
        Some(v) => format_grouped(v, 4),
        None => NO_RESULT.to_string(),
    }
}

/// Format with thousands separators and at most `max_fraction_digits`
/// fraction digits, trailing zeros dropped (`1234.5` -> `"1,234.5"`).
pub fn format_grouped(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(percent_of(20.0, 500.0), Some(100.0));
        assert_eq!(what_percent(50.0, 200.0), Some(25.0));
        assert_eq!(percent_change(100.0, 150.0), Some(50.0));
        assert_eq!(percent_change(100.0, 50.0), Some(-50.0));
        assert_eq!(adjust_by(100.0, -20.0), Some(80.0));
    }

    #[test]
    fn test_zero_divisors() {
        assert_eq!(what_percent(5.0, 0.0), None);
        assert_eq!(percent_change(0.0, 10.0), None);
    }

    #[test]
    fn test_text_guards() {
        assert_eq!(PercentFormula::PercentOf.evaluate_text("", "500"), None);
        assert_eq!(PercentFormula::WhatPercent.evaluate_text("50", "x"), None);
        assert_eq!(PercentFormula::Change.evaluate_text("0", "5"), None);
        let adjusted = PercentFormula::AdjustBy.evaluate_text("200", "10").unwrap();
        assert!((adjusted - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(1234.5, 4), "1,234.5");
        assert_eq!(format_grouped(100.0, 4), "100");
        assert_eq!(format_grouped(-1234567.891234, 4), "-1,234,567.8912");
        assert_eq!(format_grouped(0.00001, 4), "0");
        assert_eq!(format_grouped(-0.00001, 4), "0");
        assert_eq!(format_grouped(220.00000000000003, 4), "220");
    }

    #[test]
    fn test_format_result_placeholder() {
        assert_eq!(format_result(None), "—");
        assert_eq!(format_result(Some(33.333333)), "33.3333");
    }
}
