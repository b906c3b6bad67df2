//! Equation sampling for the grapher.
//!
//! The domain is split into [`GRAPH_STEPS`] equal steps and sampled at every
//! step boundary, both ends included. A sample whose value is not finite
//! becomes a gap (`y: None`) in the plotted line.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Expression;
use crate::units::parse_finite;

/// Number of equal steps across the domain (samples = steps + 1)
pub const GRAPH_STEPS: usize = 200;

pub const DEFAULT_X_MIN: f64 = -10.0;
pub const DEFAULT_X_MAX: f64 = 10.0;

/// Shown when no sample in the domain is finite
pub const INVALID_EQUATION: &str = "Invalid equation. Try: x^2, sin(x), 2*x+1";

/// Quick-pick equations: (label, equation)
pub const PRESETS: [(&str, &str); 6] = [
    ("x²", "x^2"),
    ("sin(x)", "sin(x)"),
    ("cos(x)", "cos(x)"),
    ("x³", "x^3"),
    ("√x", "sqrt(x)"),
    ("1/x", "1/x"),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    pub x: f64,
    /// `None` marks a gap
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPlot {
    pub equation: String,
    pub x_min: f64,
    pub x_max: f64,
    pub points: Vec<GraphPoint>,
    /// Set when nothing could be plotted
    pub error: Option<String>,
}

impl GraphPlot {
    /// Number of plotted (non-gap) samples
    pub fn finite_count(&self) -> usize {
        self.points.iter().filter(|p| p.y.is_some()).count()
    }

    /// Smallest and largest plotted y, if any
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.y)
            .fold(None, |acc, y| match acc {
                None => Some((y, y)),
                Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            })
    }
}

/// Round to 4 decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Sample `equation` over bounds given as text.
///
/// Unparsable bounds fall back to -10 / 10.
pub fn plot(equation: &str, x_min: &str, x_max: &str) -> GraphPlot {
    let min = parse_finite(x_min).unwrap_or(DEFAULT_X_MIN);
    let max = parse_finite(x_max).unwrap_or(DEFAULT_X_MAX);
    plot_range(equation, min, max)
}

/// Sample `equation` over `[min, max]`.
///
/// An empty or reversed domain produces no points and the invalid-equation
/// message, the same as an equation that is never finite.
pub fn plot_range(equation: &str, min: f64, max: f64) -> GraphPlot {
    let mut plot = GraphPlot {
        equation: equation.to_string(),
        x_min: min,
        x_max: max,
        points: Vec::new(),
        error: None,
    };

    if !(min < max) {
        debug!(min, max, "empty graph domain");
        plot.error = Some(INVALID_EQUATION.to_string());
        return plot;
    }

    let parsed = Expression::parse(equation);
    if let Err(e) = &parsed {
        debug!(equation, error = %e, "graph equation rejected");
    }

    plot.points = (0..=GRAPH_STEPS)
        .map(|i| {
            let x = min + (max - min) * i as f64 / GRAPH_STEPS as f64;
            let y = parsed.as_ref().ok().and_then(|expr| expr.eval_finite(x)).map(round4);
            GraphPoint { x: round4(x), y }
        })
        .collect();

    if plot.finite_count() == 0 {
        plot.error = Some(INVALID_EQUATION.to_string());
    }
    plot
}
