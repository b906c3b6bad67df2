//! # Arithmetic Calculator
//!
//! The keypad state machine behind the basic and scientific calculator.
//! Every key is an [`Action`]; [`Calculator::press`] folds it into the
//! current state and reports any finished calculation so the caller can
//! persist the history.
//!
//! ## Example
//!
//! ```rust
//! use mathbox_core::calculator::{Action, BinaryOp, Calculator};
//!
//! let mut calc = Calculator::new();
//! calc.press(Action::Digit(5));
//! calc.press(Action::Operator(BinaryOp::Add));
//! calc.press(Action::Digit(3));
//! let entry = calc.press(Action::Equals).unwrap();
//!
//! assert_eq!(calc.display(), "8");
//! assert_eq!(entry.expression, "5 + 3");
//! ```

pub mod history;
pub mod keys;
pub mod scientific;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use history::{History, HistoryEntry, HISTORY_KEY, MAX_HISTORY};
pub use keys::{action_for_key, parse_key_sequence};
pub use scientific::{factorial, ScientificOp};

// ============================================================================
// Keys
// ============================================================================

/// The four pending binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "×",
            BinaryOp::Divide => "÷",
        }
    }

    /// Division by zero yields 0 instead of infinity
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOp {
    Clear,
    Recall,
    Add,
    Subtract,
}

impl MemoryOp {
    pub fn label(&self) -> &'static str {
        match self {
            MemoryOp::Clear => "MC",
            MemoryOp::Recall => "MR",
            MemoryOp::Add => "M+",
            MemoryOp::Subtract => "M−",
        }
    }
}

/// A single keypad press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum Action {
    /// 0 through 9
    Digit(u8),
    Decimal,
    Operator(BinaryOp),
    Equals,
    Clear,
    Backspace,
    ToggleSign,
    Percent,
    Scientific(ScientificOp),
    Memory(MemoryOp),
}

// ============================================================================
// Number display
// ============================================================================

/// Render a number the way the display shows it.
///
/// Integers print without a fraction, negative zero prints as `0`, and very
/// large or very small magnitudes switch to exponent form (`1e+21`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{:e}", value);
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        };
    }
    value.to_string()
}

/// Read the display back as a number. Unreadable text is NaN.
pub fn parse_display(display: &str) -> f64 {
    display.trim().parse::<f64>().unwrap_or(f64::NAN)
}

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculator {
    display: String,
    previous_value: Option<f64>,
    pending: Option<BinaryOp>,
    waiting_for_operand: bool,
    /// Partial expression shown above the display, e.g. `"5 +"`
    expression: String,
    memory: f64,
    #[serde(skip)]
    history: History,
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator {
            display: "0".to_string(),
            previous_value: None,
            pending: None,
            waiting_for_operand: false,
            expression: String::new(),
            memory: 0.0,
            history: History::new(),
        }
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously saved history
    pub fn with_history(history: History) -> Self {
        Calculator {
            history,
            ..Self::default()
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    pub fn pending(&self) -> Option<BinaryOp> {
        self.pending
    }

    pub fn is_waiting_for_operand(&self) -> bool {
        self.waiting_for_operand
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Current display as a number
    pub fn value(&self) -> f64 {
        parse_display(&self.display)
    }

    /// Apply one key. Returns the history entry when the key finished a
    /// calculation.
    pub fn press(&mut self, action: Action) -> Option<HistoryEntry> {
        debug!(?action, display = %self.display, "key");
        match action {
            Action::Digit(d) => self.digit(d),
            Action::Decimal => self.decimal(),
            Action::Operator(op) => self.operator(op),
            Action::Equals => return self.equals(),
            Action::Clear => self.clear(),
            Action::Backspace => self.backspace(),
            Action::ToggleSign => self.display = format_number(-self.value()),
            Action::Percent => self.display = format_number(self.value() / 100.0),
            Action::Scientific(op) => return Some(self.scientific(op)),
            Action::Memory(op) => self.memory_key(op),
        }
        None
    }

    /// Press a sequence of keys, collecting every finished calculation
    pub fn press_all<I>(&mut self, actions: I) -> Vec<HistoryEntry>
    where
        I: IntoIterator<Item = Action>,
    {
        actions.into_iter().filter_map(|a| self.press(a)).collect()
    }

    fn digit(&mut self, d: u8) {
        let d = char::from(b'0' + d.min(9));
        if self.waiting_for_operand {
            self.display = d.to_string();
            self.waiting_for_operand = false;
        } else if self.display == "0" {
            self.display = d.to_string();
        } else {
            self.display.push(d);
        }
    }

    fn decimal(&mut self) {
        if self.waiting_for_operand {
            self.display = "0.".to_string();
            self.waiting_for_operand = false;
        } else if !self.display.contains('.') {
            self.display.push('.');
        }
    }

    /// A pending operator is always resolved first, even when no new
    /// operand was typed (`6 + -` applies `6 + 6`).
    fn operator(&mut self, next: BinaryOp) {
        let input = self.value();
        let base = match (self.previous_value, self.pending) {
            (Some(prev), Some(op)) => {
                let result = op.apply(prev, input);
                self.display = format_number(result);
                result
            }
            _ => input,
        };

        self.previous_value = Some(base);
        self.pending = Some(next);
        self.waiting_for_operand = true;
        self.expression = format!("{} {}", format_number(base), next.symbol());
    }

    fn equals(&mut self) -> Option<HistoryEntry> {
        let (prev, op) = match (self.previous_value, self.pending) {
            (Some(prev), Some(op)) => (prev, op),
            _ => return None,
        };
        let input = self.value();
        let result = op.apply(prev, input);
        if op == BinaryOp::Divide && input == 0.0 {
            debug!(dividend = prev, "division by zero shown as 0");
        }

        let expression = format!("{} {} {}", format_number(prev), op.symbol(), format_number(input));
        let entry = HistoryEntry::new(expression.clone(), format_number(result));

        self.display = entry.result.clone();
        self.expression = format!("{} =", expression);
        self.previous_value = None;
        self.pending = None;
        self.waiting_for_operand = true;
        self.history.push(entry.clone());
        Some(entry)
    }

    fn clear(&mut self) {
        self.display = "0".to_string();
        self.previous_value = None;
        self.pending = None;
        self.waiting_for_operand = false;
        self.expression.clear();
    }

    fn backspace(&mut self) {
        if self.display.contains(|c: char| c.is_ascii_alphabetic()) {
            self.display = "0".to_string();
            return;
        }
        self.display.pop();
        if self.display.is_empty() || self.display == "-" {
            self.display = "0".to_string();
        }
    }

    fn scientific(&mut self, op: ScientificOp) -> HistoryEntry {
        let input = self.value();
        let result = op.apply(input);
        let entry = HistoryEntry::new(op.describe(input), format_number(result));
        self.display = entry.result.clone();
        self.waiting_for_operand = true;
        self.history.push(entry.clone());
        entry
    }

    fn memory_key(&mut self, op: MemoryOp) {
        match op {
            MemoryOp::Clear => self.memory = 0.0,
            MemoryOp::Recall => {
                self.display = format_number(self.memory);
                self.waiting_for_operand = true;
            }
            MemoryOp::Add => {
                self.memory += self.value();
                self.waiting_for_operand = true;
            }
            MemoryOp::Subtract => {
                self.memory -= self.value();
                self.waiting_for_operand = true;
            }
        }
    }
}
