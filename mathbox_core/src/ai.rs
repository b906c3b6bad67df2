//! # Natural-Language Math Replies
//!
//! Request and reply types for the remote "ask a math question" endpoint,
//! and the validation applied to whatever comes back. The HTTP call lives
//! in the CLI; this module only decides what a reply means.
//!
//! Two reply formats are understood:
//! - the math function's own reply, `{result, expression, explanation}` or
//!   `{error}` ([`interpret_reply`])
//! - a raw chat-completions reply whose message content holds that JSON,
//!   possibly inside a markdown code fence ([`interpret_completion`])
//!
//! ## Example
//!
//! ```rust
//! use mathbox_core::ai::interpret_reply;
//!
//! let body = r#"{"result": 100, "expression": "500 × 0.20", "explanation": "20% of 500 equals 100"}"#;
//! let answer = interpret_reply(200, body).unwrap();
//! assert_eq!(answer.result, 100.0);
//! assert_eq!(answer.agrees(), Some(true));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::calculator::format_number;
use crate::errors::{CalcError, CalcResult};
use crate::expression::Expression;

/// Model used when talking to a chat-completions endpoint directly
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Reason given for any reply that does not have the answer shape
pub const PARSE_FAILURE: &str = "Could not parse math question";

/// Reason given for a failed call with no better explanation
pub const GATEWAY_FAILURE: &str = "AI gateway error";

pub const EXAMPLE_QUERIES: [&str; 4] = [
    "what is 20% of 500?",
    "15% tip on $47.50",
    "square root of 144",
    "5000 at 7% interest for 3 years",
];

pub const SYSTEM_PROMPT: &str = r#"You are a math calculator assistant. The user will ask math questions in natural language.

Your job is to:
1. Parse the math question
2. Calculate the answer
3. Return ONLY a JSON response in this exact format:
{"result": <number>, "expression": "<the mathematical expression>", "explanation": "<brief explanation>"}

Examples:
- "what is 20% of 500" → {"result": 100, "expression": "500 × 0.20", "explanation": "20% of 500 equals 100"}
- "15% tip on $47.50" → {"result": 7.125, "expression": "47.50 × 0.15", "explanation": "15% tip on $47.50 is $7.13"}
- "compound interest 5000 at 7% for 3 years" → {"result": 6125.22, "expression": "5000 × (1 + 0.07)³", "explanation": "Compound interest: $5000 at 7% for 3 years = $6125.22"}
- "square root of 144" → {"result": 12, "expression": "√144", "explanation": "The square root of 144 is 12"}

IMPORTANT: Return ONLY valid JSON, no markdown, no code blocks, just the JSON object."#;

// ============================================================================
// Request
// ============================================================================

/// Body posted to the math function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathQuery {
    pub query: String,
}

impl MathQuery {
    /// # Errors
    ///
    /// `CalcError::MissingField` for a blank question.
    pub fn new(text: &str) -> CalcResult<Self> {
        let query = text.trim();
        if query.is_empty() {
            return Err(CalcError::missing_field("query"));
        }
        Ok(MathQuery {
            query: query.to_string(),
        })
    }

    /// Equivalent chat-completions request
    pub fn chat_request(&self, model: &str) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.query.clone(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

// ============================================================================
// Answer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathAnswer {
    pub result: f64,
    pub expression: String,
    pub explanation: String,
}

impl MathAnswer {
    /// The result as the calculator display would show it
    pub fn display_result(&self) -> String {
        format_number(self.result)
    }

    /// Evaluate the returned expression locally, when our notation can
    /// read it
    pub fn recompute(&self) -> Option<f64> {
        let source = normalize_expression(&self.expression);
        Expression::parse(&source).ok()?.value().ok()
    }

    /// Whether the local evaluation agrees with the remote result, to
    /// within display rounding. `None` when the expression is unreadable.
    pub fn agrees(&self) -> Option<bool> {
        let local = self.recompute()?;
        let tolerance = 0.005_f64.max(1e-6 * self.result.abs());
        Some((local - self.result).abs() <= tolerance)
    }
}

/// Rewrite display notation into evaluator syntax: `²` `³` become powers,
/// `√n` becomes `sqrt(n)`, currency signs and digit grouping commas go.
pub fn normalize_expression(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut chars = expression.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '²' => out.push_str("^2"),
            '³' => out.push_str("^3"),
            '$' | ',' => {}
            '√' => {
                out.push_str("sqrt");
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek() != Some(&'(') {
                    out.push('(');
                    while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit() || *d == '.') {
                        out.push(d);
                        chars.next();
                    }
                    out.push(')');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Decode an answer from a JSON value, enforcing the shape
fn answer_from_value(value: Value) -> CalcResult<MathAnswer> {
    let answer: MathAnswer = serde_json::from_value(value).map_err(|e| {
        debug!(error = %e, "reply does not have the answer shape");
        CalcError::remote_failed(None, PARSE_FAILURE)
    })?;
    if !answer.result.is_finite() {
        return Err(CalcError::remote_failed(None, PARSE_FAILURE));
    }
    Ok(answer)
}

fn error_field(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn status_error(status: u16) -> Option<CalcError> {
    match status {
        429 => Some(CalcError::RateLimited),
        402 => Some(CalcError::QuotaExhausted),
        _ => None,
    }
}

/// Interpret the math function's reply.
///
/// # Errors
///
/// - `RateLimited` / `QuotaExhausted` for 429 / 402
/// - `RemoteFailed { status: Some(_) }` for any other failure status
/// - `RemoteFailed { status: None }` for a successful reply carrying an
///   `error` field, or one without the answer shape
pub fn interpret_reply(status: u16, body: &str) -> CalcResult<MathAnswer> {
    if let Some(e) = status_error(status) {
        return Err(e);
    }
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let reason = parsed.as_ref().and_then(error_field).unwrap_or_else(|| GATEWAY_FAILURE.to_string());
        warn!(status, %reason, "math endpoint failed");
        return Err(CalcError::remote_failed(Some(status), reason));
    }

    let value = parsed.ok_or_else(|| CalcError::remote_failed(None, PARSE_FAILURE))?;
    if let Some(reason) = error_field(&value) {
        return Err(CalcError::remote_failed(None, reason));
    }
    answer_from_value(value)
}

/// Parse the model's message content, tolerating a surrounding code fence
pub fn parse_completion_content(content: &str) -> CalcResult<MathAnswer> {
    let json = strip_code_fence(content);
    let value: Value = serde_json::from_str(json).map_err(|_| {
        debug!(content, "completion content is not JSON");
        CalcError::remote_failed(None, PARSE_FAILURE)
    })?;
    if let Some(reason) = error_field(&value) {
        return Err(CalcError::remote_failed(None, reason));
    }
    answer_from_value(value)
}

/// Interpret a raw chat-completions reply
pub fn interpret_completion(status: u16, body: &str) -> CalcResult<MathAnswer> {
    if let Some(e) = status_error(status) {
        return Err(e);
    }
    if !(200..300).contains(&status) {
        warn!(status, "completion endpoint failed");
        return Err(CalcError::remote_failed(Some(status), GATEWAY_FAILURE));
    }
    let value: Value = serde_json::from_str(body).map_err(|_| CalcError::remote_failed(Some(status), GATEWAY_FAILURE))?;
    let content = value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| CalcError::remote_failed(Some(status), "No response from AI"))?;
    parse_completion_content(content)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
