//! Keyboard bindings for the calculator.

use super::{Action, BinaryOp, MemoryOp, ScientificOp};
use crate::errors::{CalcError, CalcResult};

/// Map a single physical key name to an action.
///
/// Digits, `.`, `+ - * /`, `Enter`/`=`, `Escape`/`c`/`C`, `Backspace`
/// and `%` are bound; everything else is ignored.
pub fn action_for_key(key: &str) -> Option<Action> {
    let action = match key {
        "." => Action::Decimal,
        "+" => Action::Operator(BinaryOp::Add),
        "-" => Action::Operator(BinaryOp::Subtract),
        "*" => Action::Operator(BinaryOp::Multiply),
        "/" => Action::Operator(BinaryOp::Divide),
        "Enter" | "=" => Action::Equals,
        "Escape" | "c" | "C" => Action::Clear,
        "Backspace" => Action::Backspace,
        "%" => Action::Percent,
        _ => {
            let mut chars = key.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => c.to_digit(10).map(|d| Action::Digit(d as u8)),
                _ => None,
            };
        }
    };
    Some(action)
}

/// On-screen buttons that have no keyboard binding
fn button(word: &str) -> Option<Action> {
    let action = match word.to_lowercase().as_str() {
        "sin" => Action::Scientific(ScientificOp::Sin),
        "cos" => Action::Scientific(ScientificOp::Cos),
        "tan" => Action::Scientific(ScientificOp::Tan),
        "sqrt" | "√" => Action::Scientific(ScientificOp::Sqrt),
        "x2" | "x^2" | "x²" | "sq" => Action::Scientific(ScientificOp::Square),
        "x3" | "x^3" | "x³" | "cube" => Action::Scientific(ScientificOp::Cube),
        "log" => Action::Scientific(ScientificOp::Log10),
        "ln" => Action::Scientific(ScientificOp::Ln),
        "1/x" | "inv" => Action::Scientific(ScientificOp::Reciprocal),
        "pi" | "π" => Action::Scientific(ScientificOp::Pi),
        "e" => Action::Scientific(ScientificOp::E),
        "n!" | "!" | "fact" => Action::Scientific(ScientificOp::Factorial),
        "mc" => Action::Memory(MemoryOp::Clear),
        "mr" => Action::Memory(MemoryOp::Recall),
        "m+" => Action::Memory(MemoryOp::Add),
        "m-" | "m−" => Action::Memory(MemoryOp::Subtract),
        "neg" | "±" | "+/-" => Action::ToggleSign,
        "ac" | "clear" | "escape" => Action::Clear,
        "backspace" | "del" => Action::Backspace,
        "enter" => Action::Equals,
        "×" => Action::Operator(BinaryOp::Multiply),
        "÷" => Action::Operator(BinaryOp::Divide),
        _ => return None,
    };
    Some(action)
}

/// Parse a line of key presses such as `"12+7 sqrt ="`.
///
/// Whitespace-separated words are first tried as button names
/// (`sin`, `n!`, `mr`, `neg`, ...); otherwise each character of the word
/// is one key press.
///
/// # Errors
///
/// `CalcError::InvalidInput` naming the first character with no binding.
pub fn parse_key_sequence(line: &str) -> CalcResult<Vec<Action>> {
    let mut actions = Vec::new();
    for word in line.split_whitespace() {
        if let Some(action) = button(word) {
            actions.push(action);
            continue;
        }
        for c in word.chars() {
            let mut buf = [0u8; 4];
            let key = c.encode_utf8(&mut buf);
            let action = action_for_key(key)
                .or_else(|| button(key))
                .ok_or_else(|| CalcError::invalid_input("keys", word, format!("No key bound to '{}'", c)))?;
            actions.push(action);
        }
    }
    Ok(actions)
}
