//! # Body Mass Index
//!
//! Metric: `kg / m²`. Imperial: `703 · lb / in²`, with height entered as
//! feet plus inches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::parse_finite;

/// Pounds-per-square-inch to kilograms-per-square-meter factor
const IMPERIAL_FACTOR: f64 = 703.0;

/// Height/weight measurements in either system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "lowercase")]
pub enum BmiInput {
    Metric { weight_kg: f64, height_cm: f64 },
    Imperial { weight_lb: f64, height_ft: f64, height_in: f64 },
}

/// WHO weight bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Band for a computed BMI
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiResult {
    pub bmi: f64,
    pub category: BmiCategory,
}

impl BmiResult {
    /// One-decimal display value
    pub fn display(&self) -> String {
        format!("{:.1}", self.bmi)
    }
}

/// Compute BMI; `None` unless weight and height are both positive.
pub fn calculate(input: &BmiInput) -> Option<BmiResult> {
    let bmi = match *input {
        BmiInput::Metric { weight_kg, height_cm } => {
            let h = height_cm / 100.0;
            if h <= 0.0 || weight_kg <= 0.0 {
                return None;
            }
            weight_kg / (h * h)
        }
        BmiInput::Imperial { weight_lb, height_ft, height_in } => {
            let total_inches = height_ft * 12.0 + height_in;
            if total_inches <= 0.0 || weight_lb <= 0.0 {
                return None;
            }
            (weight_lb / (total_inches * total_inches)) * IMPERIAL_FACTOR
        }
    };
    Some(BmiResult { bmi, category: BmiCategory::from_bmi(bmi) })
}

/// Imperial input from text fields; blank feet/inches count as zero
pub fn imperial_from_text(weight_lb: &str, height_ft: &str, height_in: &str) -> Option<BmiInput> {
    Some(BmiInput::Imperial {
        weight_lb: parse_finite(weight_lb)?,
        height_ft: parse_finite(height_ft).unwrap_or(0.0),
        height_in: parse_finite(height_in).unwrap_or(0.0),
    })
}
