//! Live countdown to the next birthday.
//!
//! The countdown itself is a pure value: the caller ticks it with the
//! current time (once a second in the CLI) and it reports the remaining
//! parts plus whether this tick should celebrate.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::age::next_birthday;

/// Remaining time split into display units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownParts {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CountdownParts {
    /// Split a duration; negative durations clamp to zero
    pub fn from_duration(remaining: Duration) -> Self {
        let total = remaining.num_seconds().max(0);
        CountdownParts {
            days: total / 86_400,
            hours: total % 86_400 / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == CountdownParts::default()
    }
}

impl std::fmt::Display for CountdownParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d {:02}h {:02}m {:02}s", self.days, self.hours, self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownTick {
    pub parts: CountdownParts,
    /// True on exactly one tick: the first one at or past the target
    pub celebrate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayCountdown {
    birth: NaiveDate,
    target: Option<NaiveDateTime>,
    celebrated: bool,
}

impl BirthdayCountdown {
    pub fn new(birth: NaiveDate, now: NaiveDateTime) -> Self {
        BirthdayCountdown {
            birth,
            target: next_birthday(birth, now),
            celebrated: false,
        }
    }

    pub fn birth(&self) -> NaiveDate {
        self.birth
    }

    pub fn target(&self) -> Option<NaiveDateTime> {
        self.target
    }

    /// Recompute the target from `now` and re-arm the celebration
    pub fn retarget(&mut self, now: NaiveDateTime) {
        self.target = next_birthday(self.birth, now);
        self.celebrated = false;
    }

    /// Switch to a new birth date
    pub fn set_birth(&mut self, birth: NaiveDate, now: NaiveDateTime) {
        self.birth = birth;
        self.retarget(now);
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> CountdownTick {
        let Some(target) = self.target else {
            return CountdownTick {
                parts: CountdownParts::default(),
                celebrate: false,
            };
        };

        let parts = CountdownParts::from_duration(target - now);
        let reached = now >= target;
        let celebrate = reached && !self.celebrated;
        if celebrate {
            self.celebrated = true;
        }
        CountdownTick { parts, celebrate }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn test_parts() {
        let mut countdown = BirthdayCountdown::new(date(1990, 6, 3), at(2025, 6, 1, 22, 59, 30));
        let tick = countdown.tick(at(2025, 6, 1, 22, 59, 30));
        assert_eq!(
            tick.parts,
            CountdownParts {
                days: 1,
                hours: 1,
                minutes: 0,
                seconds: 30
            }
        );
        assert!(!tick.celebrate);
        assert_eq!(tick.parts.to_string(), "1d 01h 00m 30s");
    }

    #[test]
    fn test_celebrates_once() {
        let start = at(2025, 6, 2, 23, 59, 58);
        let mut countdown = BirthdayCountdown::new(date(1990, 6, 3), start);

        assert!(!countdown.tick(at(2025, 6, 2, 23, 59, 59)).celebrate);
        let hit = countdown.tick(at(2025, 6, 3, 0, 0, 0));
        assert!(hit.celebrate);
        assert!(hit.parts.is_zero());
        assert!(!countdown.tick(at(2025, 6, 3, 0, 0, 1)).celebrate);
        assert!(!countdown.tick(at(2025, 6, 3, 0, 0, 2)).celebrate);
    }

    #[test]
    fn test_retarget_rearms() {
        let mut countdown = BirthdayCountdown::new(date(1990, 6, 3), at(2025, 6, 2, 12, 0, 0));
        assert!(countdown.tick(at(2025, 6, 3, 0, 0, 5)).celebrate);

        countdown.retarget(at(2025, 6, 3, 0, 0, 5));
        assert_eq!(countdown.target(), Some(at(2026, 6, 3, 0, 0, 0)));
        assert!(!countdown.tick(at(2025, 6, 3, 0, 0, 6)).celebrate);
    }

    #[test]
    fn test_set_birth() {
        let now = at(2025, 1, 1, 0, 0, 0);
        let mut countdown = BirthdayCountdown::new(date(1990, 6, 3), now);
        countdown.set_birth(date(1991, 2, 14), now);
        assert_eq!(countdown.target(), Some(at(2025, 2, 14, 0, 0, 0)));
    }
}
