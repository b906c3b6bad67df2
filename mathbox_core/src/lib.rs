//! # mathbox_core - Everyday Calculator Engine
//!
//! `mathbox_core` holds the logic behind the Mathbox tools: unit conversion,
//! percentage and profit/loss formulas, BMI, a keypad calculator, an
//! equation grapher, date arithmetic, daily challenges and a typing test.
//! Every input and output type is serde-serializable, and nothing here does
//! I/O except through the [`storage::KeyValueStore`] port.
//!
//! ## Design Philosophy
//!
//! - **Quiet failures**: Bad input produces no result (`None`, an empty
//!   string or NaN), not an error, wherever a user is mid-typing
//! - **Typed errors where they matter**: Storage and remote replies return
//!   [`CalcError`]
//! - **No code execution**: Equations are parsed into a tree and walked
//! - **Injected storage**: History, streaks and challenges go through a
//!   key-value trait, so tests use [`storage::MemoryStore`]
//!
//! ## Quick Start
//!
//! ```rust
//! use mathbox_core::units::{convert, UnitCategory};
//! use mathbox_core::expression::evaluate;
//!
//! assert_eq!(convert(UnitCategory::Length, "kilometer", "meter", "1.5"), "1500.0000");
//! assert_eq!(evaluate("x^2 + 1", 2.0), 5.0);
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Unit tables and conversion
//! - [`percentage`] - Percentage formulas and number formatting
//! - [`profit_loss`] - Profit, loss, markup and margin
//! - [`bmi`] - Body mass index
//! - [`calculator`] - Keypad state machine, scientific keys, history
//! - [`expression`] - Equation parser, evaluator and grapher
//! - [`dates`] - Age, birthday countdown, time zones
//! - [`challenges`] - Daily challenge and streak
//! - [`typing`] - Typing test scoring
//! - [`ai`] - Natural-language math reply handling
//! - [`storage`] - Key-value port, in-memory and file-backed stores
//! - [`errors`] - Structured error types

pub mod ai;
pub mod bmi;
pub mod calculator;
pub mod challenges;
pub mod dates;
pub mod errors;
pub mod expression;
pub mod percentage;
pub mod profit_loss;
pub mod storage;
pub mod typing;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculator::{Action, Calculator, History, HistoryEntry};
pub use errors::{CalcError, CalcResult};
pub use expression::{evaluate, Expression};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use units::{convert, UnitCategory};
