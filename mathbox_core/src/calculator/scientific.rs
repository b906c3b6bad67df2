//! Unary scientific keys. Each replaces the displayed value in place.

use std::f64::consts::{E, PI};

use serde::{Deserialize, Serialize};

use super::format_number;

/// Largest n whose factorial fits in an f64
pub const MAX_FACTORIAL: u32 = 170;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScientificOp {
    /// Degrees
    Sin,
    /// Degrees
    Cos,
    /// Degrees
    Tan,
    Sqrt,
    Square,
    Cube,
    Log10,
    Ln,
    Reciprocal,
    Pi,
    E,
    Factorial,
}

impl ScientificOp {
    pub const ALL: [ScientificOp; 12] = [
        ScientificOp::Sin,
        ScientificOp::Cos,
        ScientificOp::Tan,
        ScientificOp::Sqrt,
        ScientificOp::Square,
        ScientificOp::Cube,
        ScientificOp::Log10,
        ScientificOp::Ln,
        ScientificOp::Reciprocal,
        ScientificOp::Pi,
        ScientificOp::E,
        ScientificOp::Factorial,
    ];

    /// Keypad label
    pub fn label(&self) -> &'static str {
        match self {
            ScientificOp::Sin => "sin",
            ScientificOp::Cos => "cos",
            ScientificOp::Tan => "tan",
            ScientificOp::Sqrt => "√",
            ScientificOp::Square => "x²",
            ScientificOp::Cube => "x³",
            ScientificOp::Log10 => "log",
            ScientificOp::Ln => "ln",
            ScientificOp::Reciprocal => "1/x",
            ScientificOp::Pi => "π",
            ScientificOp::E => "e",
            ScientificOp::Factorial => "n!",
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        match self {
            ScientificOp::Sin => value.to_radians().sin(),
            ScientificOp::Cos => value.to_radians().cos(),
            ScientificOp::Tan => value.to_radians().tan(),
            ScientificOp::Sqrt => value.sqrt(),
            ScientificOp::Square => value * value,
            ScientificOp::Cube => value * value * value,
            ScientificOp::Log10 => value.log10(),
            ScientificOp::Ln => value.ln(),
            ScientificOp::Reciprocal => 1.0 / value,
            ScientificOp::Pi => PI,
            ScientificOp::E => E,
            ScientificOp::Factorial => factorial(value),
        }
    }

    /// History text for applying this key to `value`
    pub fn describe(&self, value: f64) -> String {
        let v = format_number(value);
        match self {
            ScientificOp::Sin | ScientificOp::Cos | ScientificOp::Tan | ScientificOp::Ln => {
                format!("{}({})", self.label(), v)
            }
            ScientificOp::Log10 => format!("log({})", v),
            ScientificOp::Sqrt => format!("√({})", v),
            ScientificOp::Square => format!("({})²", v),
            ScientificOp::Cube => format!("({})³", v),
            ScientificOp::Reciprocal => format!("1/({})", v),
            ScientificOp::Pi => "π".to_string(),
            ScientificOp::E => "e".to_string(),
            ScientificOp::Factorial => format!("{}!", v),
        }
    }
}

/// n! for non-negative integers, NaN otherwise.
///
/// Above [`MAX_FACTORIAL`] the result overflows f64, so it returns
/// infinity without recursing.
pub fn factorial(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return f64::NAN;
    }
    if value > MAX_FACTORIAL as f64 {
        return f64::INFINITY;
    }
    factorial_of(value as u32)
}

fn factorial_of(n: u32) -> f64 {
    if n <= 1 {
        1.0
    } else {
        n as f64 * factorial_of(n - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trig_in_degrees() {
        assert!((ScientificOp::Sin.apply(30.0) - 0.5).abs() < 1e-12);
        assert!((ScientificOp::Cos.apply(60.0) - 0.5).abs() < 1e-12);
        assert!((ScientificOp::Tan.apply(45.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_powers_and_logs() {
        assert_eq!(ScientificOp::Square.apply(-3.0), 9.0);
        assert_eq!(ScientificOp::Cube.apply(2.0), 8.0);
        assert_eq!(ScientificOp::Sqrt.apply(81.0), 9.0);
        assert_eq!(ScientificOp::Log10.apply(1000.0), 3.0);
        assert_eq!(ScientificOp::Reciprocal.apply(4.0), 0.25);
        assert!(ScientificOp::Reciprocal.apply(0.0).is_infinite());
    }

    #[test]
    fn test_constants_ignore_input() {
        assert_eq!(ScientificOp::Pi.apply(42.0), PI);
        assert_eq!(ScientificOp::E.apply(42.0), E);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0.0), 1.0);
        assert_eq!(factorial(5.0), 120.0);
        assert_eq!(factorial(20.0), 2_432_902_008_176_640_000.0);
        assert!(factorial(170.0).is_finite());
        assert!(factorial(171.0).is_infinite());
        assert!(factorial(1e12).is_infinite());
    }

    #[test]
    fn test_factorial_domain() {
        assert!(factorial(-1.0).is_nan());
        assert!(factorial(2.5).is_nan());
        assert!(factorial(f64::NAN).is_nan());
    }

    #[test]
    fn test_describe() {
        assert_eq!(ScientificOp::Sin.describe(30.0), "sin(30)");
        assert_eq!(ScientificOp::Square.describe(-3.0), "(-3)²");
        assert_eq!(ScientificOp::Factorial.describe(5.0), "5!");
        assert_eq!(ScientificOp::Pi.describe(7.0), "π");
    }
}
