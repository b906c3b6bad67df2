//! # Date and Time Arithmetic
//!
//! - [`age`] - Calendar-aware age, totals and next birthday
//! - [`countdown`] - Birthday countdown with a one-shot celebration
//! - [`time_zone`] - Fixed-offset wall-clock conversion
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use mathbox_core::dates::age_breakdown;
//!
//! let birth = NaiveDate::from_ymd_opt(2000, 3, 1).unwrap();
//! let now = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let age = age_breakdown(birth, now).unwrap();
//! assert_eq!((age.years, age.months, age.days), (23, 11, 0));
//! ```

pub mod age;
pub mod countdown;
pub mod time_zone;

pub use age::{age_breakdown, days_in_month, days_until_birthday, next_birthday, AgeBreakdown};
pub use countdown::{BirthdayCountdown, CountdownParts, CountdownTick};
pub use time_zone::{convert_time, find_zone, Zone, ZonePair, ZONES};
