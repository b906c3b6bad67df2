//! # Expression Evaluation
//!
//! Parses the small math notation used by the grapher and evaluates it
//! against a single variable `x`. The input never executes as code: it is
//! tokenized, parsed into a tree, and the tree is walked.
//!
//! Supported: numeric literals, `+ - * / ^`, parentheses, `x`, `pi`, `e`,
//! and `sin cos tan sqrt abs log ln` (`log` is base 10, trig is radians).
//!
//! ## Example
//!
//! ```rust
//! use mathbox_core::expression::evaluate;
//!
//! assert_eq!(evaluate("x^2", 3.0), 9.0);
//! assert!(evaluate("1/x", 0.0).is_nan());
//! assert!(evaluate("2 +", 1.0).is_nan());
//! ```
//!
//! ## Modules
//!
//! - [`lexer`] - Tokenizer
//! - [`parser`] - Recursive-descent parser and AST
//! - [`graph`] - Sampling an equation over a domain for plotting

pub mod graph;
pub mod lexer;
pub mod parser;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

pub use graph::{plot, plot_range, GraphPlot, GraphPoint};
pub use parser::{BinaryOperator, Function, Node};

/// A parsed equation, reusable across many sample points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Parse an equation.
    ///
    /// # Errors
    ///
    /// `CalcError::ParseError` with the character offset of the problem.
    pub fn parse(source: &str) -> CalcResult<Self> {
        let tokens = lexer::tokenize(source)?;
        let root = parser::Parser::new(tokens, source.chars().count()).parse()?;
        Ok(Expression {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Raw value at `x`; may be NaN or infinite
    pub fn eval(&self, x: f64) -> f64 {
        self.root.eval(x)
    }

    /// Value at `x`, or `None` when it is not a finite number
    pub fn eval_finite(&self, x: f64) -> Option<f64> {
        Some(self.eval(x)).filter(|v| v.is_finite())
    }

    /// Value of an expression that does not mention `x`.
    ///
    /// # Errors
    ///
    /// `CalcError::EvaluationFailed` when the result is not finite.
    pub fn value(&self) -> CalcResult<f64> {
        self.eval_finite(0.0)
            .ok_or_else(|| CalcError::evaluation_failed(&self.source, "Result is not a finite number"))
    }
}

/// Evaluate `expression` at `x`.
///
/// Any parse failure or non-finite result yields NaN ("not a number");
/// nothing is propagated to the caller.
pub fn evaluate(expression: &str, x: f64) -> f64 {
    match Expression::parse(expression) {
        Ok(expr) => expr.eval_finite(x).unwrap_or(f64::NAN),
        Err(e) => {
            debug!(expression, error = %e, "expression rejected");
            f64::NAN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(evaluate("x^2", 3.0), 9.0);
        assert_eq!(evaluate("sin(x)", 0.0), 0.0);
        assert!(evaluate("1/x", 0.0).is_nan());
    }

    #[test]
    fn test_failures_are_nan() {
        assert!(evaluate("", 1.0).is_nan());
        assert!(evaluate("alert(1)", 1.0).is_nan());
        assert!(evaluate("sqrt(x)", -4.0).is_nan());
        assert!(evaluate("ln(x)", 0.0).is_nan());
    }

    #[test]
    fn test_case_insensitive_constants() {
        assert!((evaluate("PI", 0.0) - std::f64::consts::PI).abs() < 1e-15);
        assert!((evaluate("E^x", 1.0) - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_constant_value() {
        let expr = Expression::parse("500 × 0.20").unwrap();
        assert!((expr.value().unwrap() - 100.0).abs() < 1e-9);
        let err = Expression::parse("1/0").unwrap().value().unwrap_err();
        assert_eq!(err.error_code(), "EVALUATION_FAILED");
    }

    #[test]
    fn test_parse_reports_position() {
        let err = Expression::parse("x + * 2").unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");
        assert!(matches!(err, CalcError::ParseError { position: 4, .. }));
    }

    #[test]
    fn test_deep_nesting_is_nan() {
        let parens = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(evaluate(&parens, 1.0).is_nan());
        assert!(evaluate(&format!("{}x", "-".repeat(50_000)), 1.0).is_nan());
        assert_eq!(evaluate(&format!("{}x", "-".repeat(200)), 3.0), 3.0);
    }

    proptest! {
        #[test]
        fn prop_polynomial_matches_direct(x in -1000.0f64..1000.0) {
            let expected = 2.0 * x * x - 3.0 * x + 1.0;
            let got = evaluate("2*x^2 - 3*x + 1", x);
            prop_assert!((got - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }

        #[test]
        fn prop_never_panics(input in "[0-9x+*/^().a-z -]{0,24}", x in -10.0f64..10.0) {
            let v = evaluate(&input, x);
            prop_assert!(v.is_nan() || v.is_finite());
        }
    }
}
