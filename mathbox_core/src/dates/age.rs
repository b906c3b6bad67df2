//! Calendar-aware age and next-birthday arithmetic.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Age as a calendar difference plus flat elapsed totals.
///
/// ## JSON Example
///
/// ```json
/// {
///   "years": 23, "months": 11, "days": 0,
///   "total_days": 8737, "total_hours": 209688,
///   "total_minutes": 12581280, "total_seconds": 754876800
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBreakdown {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub total_days: i64,
    pub total_hours: i64,
    pub total_minutes: i64,
    pub total_seconds: i64,
}

/// Number of days in `month` (1-12) of `year`. 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// `(year, month)` of the month before the given one
fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Age of someone born on `birth` as of `now`.
///
/// The calendar part starts from the naive field differences. A negative
/// day count borrows the length of the month before `now`'s month (and
/// keeps borrowing further back for a birth day that month is too short
/// to cover); a negative month count borrows a year.
///
/// Totals are whole units of the elapsed time since midnight on `birth`.
///
/// Returns `None` when `birth` is after `now`.
pub fn age_breakdown(birth: NaiveDate, now: NaiveDateTime) -> Option<AgeBreakdown> {
    let born = birth.and_time(NaiveTime::MIN);
    if born > now {
        return None;
    }

    let today = now.date();
    let mut years = today.year() - birth.year();
    let mut months = today.month() as i32 - birth.month() as i32;
    let mut days = today.day() as i32 - birth.day() as i32;

    // Borrow as many previous months as needed so `days` is never negative
    let (mut borrow_year, mut borrow_month) = (today.year(), today.month());
    while days < 0 {
        (borrow_year, borrow_month) = previous_month(borrow_year, borrow_month);
        months -= 1;
        days += days_in_month(borrow_year, borrow_month) as i32;
    }
    while months < 0 {
        years -= 1;
        months += 12;
    }

    let elapsed = (now - born).num_milliseconds();
    Some(AgeBreakdown {
        years,
        months,
        days,
        total_days: elapsed / MILLIS_PER_DAY,
        total_hours: elapsed / MILLIS_PER_HOUR,
        total_minutes: elapsed / MILLIS_PER_MINUTE,
        total_seconds: elapsed / MILLIS_PER_SECOND,
    })
}

/// `birth`'s month/day in `year`. Feb 29 outside a leap year rolls over
/// to Mar 1.
pub fn birthday_in(year: i32, birth: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birth.month(), birth.day()).or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Midnight of the next birthday strictly after `now`
pub fn next_birthday(birth: NaiveDate, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let this_year = birthday_in(now.year(), birth)?.and_time(NaiveTime::MIN);
    if this_year > now {
        return Some(this_year);
    }
    Some(birthday_in(now.year() + 1, birth)?.and_time(NaiveTime::MIN))
}

/// Whole days until the next birthday, rounded up
pub fn days_until_birthday(birth: NaiveDate, now: NaiveDateTime) -> Option<i64> {
    let remaining = (next_birthday(birth, now)? - now).num_milliseconds();
    Some((remaining + MILLIS_PER_DAY - 1).div_euclid(MILLIS_PER_DAY))
}
