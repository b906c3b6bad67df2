//! Typing speed test scoring.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SAMPLE_TEXTS: [&str; 5] = [
    "The quick brown fox jumps over the lazy dog near the riverbank on a sunny afternoon.",
    "Programming is the art of telling a computer what to do through a sequence of instructions.",
    "Success is not final and failure is not fatal. It is the courage to continue that counts.",
    "Technology has revolutionized the way we communicate and share information globally.",
    "The journey of a thousand miles begins with a single step forward into the unknown.",
];

pub fn random_text<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    SAMPLE_TEXTS.choose(rng).copied().unwrap_or(SAMPLE_TEXTS[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingScore {
    /// Words in the reference text per elapsed minute
    pub wpm: u32,
    /// Percentage of typed characters matching the reference position
    pub accuracy: u32,
}

impl TypingScore {
    /// Score `typed` against `reference`.
    ///
    /// WPM counts space-separated words of the reference and is 0 for a
    /// zero or negative elapsed time. Accuracy is 100 for empty input.
    pub fn compute(reference: &str, typed: &str, elapsed: Duration) -> Self {
        TypingScore {
            wpm: words_per_minute(reference, elapsed),
            accuracy: accuracy(reference, typed),
        }
    }
}

impl std::fmt::Display for TypingScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} WPM with {}% accuracy", self.wpm, self.accuracy)
    }
}

fn words_per_minute(reference: &str, elapsed: Duration) -> u32 {
    let millis = elapsed.num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    let words = reference.split(' ').count() as f64;
    let minutes = millis as f64 / 60_000.0;
    (words / minutes).round() as u32
}

fn accuracy(reference: &str, typed: &str) -> u32 {
    let typed_len = typed.chars().count();
    if typed_len == 0 {
        return 100;
    }
    let correct = typed
        .chars()
        .zip(reference.chars())
        .filter(|(t, r)| t == r)
        .count();
    (correct as f64 / typed_len as f64 * 100.0).round() as u32
}

/// How a reference character renders against the current input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharState {
    Correct,
    Incorrect,
    /// Next character to type
    Cursor,
    Pending,
}

pub fn char_states(reference: &str, typed: &str) -> Vec<CharState> {
    let typed: Vec<char> = typed.chars().collect();
    reference
        .chars()
        .enumerate()
        .map(|(i, r)| match typed.get(i) {
            Some(t) if *t == r => CharState::Correct,
            Some(_) => CharState::Incorrect,
            None if i == typed.len() => CharState::Cursor,
            None => CharState::Pending,
        })
        .collect()
}

/// One run of the test. The clock starts on the first typed character and
/// stops when the input equals the reference exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingSession {
    text: String,
    input: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl TypingSession {
    pub fn new(text: impl Into<String>) -> Self {
        TypingSession {
            text: text.into(),
            input: String::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_complete(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Replace the input with `value` as of `now`. Ignored once complete.
    pub fn update(&mut self, value: &str, now: DateTime<Utc>) {
        if self.is_complete() {
            return;
        }
        if self.started_at.is_none() && !value.is_empty() {
            self.started_at = Some(now);
        }
        self.input = value.to_string();
        if self.input == self.text {
            self.finished_at = Some(now);
        }
    }

    /// Final score, once complete
    pub fn score(&self) -> Option<TypingScore> {
        let elapsed = self.finished_at? - self.started_at?;
        Some(TypingScore::compute(&self.text, &self.input, elapsed))
    }

    pub fn char_states(&self) -> Vec<CharState> {
        char_states(&self.text, &self.input)
    }
}
