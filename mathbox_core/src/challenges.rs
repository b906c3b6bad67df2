//! # Daily Challenges
//!
//! A built-in catalog of small daily challenges, user-added custom ones,
//! the challenge of the day, and the completion streak. Everything is kept
//! in the key-value store under three keys:
//!
//! | Key | Value |
//! |-----|-------|
//! | `customChallenges` | array of [`Challenge`] |
//! | `dailyChallenge` | [`DailyChallenge`] |
//! | `challengeStreak` | [`Streak`] |
//!
//! Completing a challenge never talks to a remote service. When a user id
//! is known the caller receives a [`CompletionRecord`] to forward wherever
//! it likes.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};
use crate::storage::{load_json, store_json, KeyValueStore};

pub const CUSTOM_CHALLENGES_KEY: &str = "customChallenges";
pub const DAILY_CHALLENGE_KEY: &str = "dailyChallenge";
pub const STREAK_KEY: &str = "challengeStreak";

/// Points credited per completion
pub const POINTS_PER_COMPLETION: u32 = 10;

/// Streak length at which the progress bar is full
pub const STREAK_GOAL: u32 = 30;

pub const FIRST_COMPLETION_MESSAGE: &str = "Great start! 🎉";
pub const NOT_YET_MESSAGE: &str = "No worries! You can try again tomorrow 💪";

pub const MOTIVATIONAL_QUOTES: [&str; 8] = [
    "You're on fire! Keep going! 🔥",
    "Amazing progress! You're unstoppable! 🚀",
    "Look at you go! So proud! 🌟",
    "You're building amazing habits! 💪",
    "One step at a time, you're crushing it! ⭐",
    "Your consistency is inspiring! 🎯",
    "Small actions, big results! Keep it up! 🌱",
    "You're doing great! Don't stop now! 💫",
];

// ============================================================================
// Challenges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeCategory {
    Fitness,
    Creativity,
    Kindness,
    Mindfulness,
    Fun,
}

impl std::fmt::Display for ChallengeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChallengeCategory::Fitness => "fitness",
            ChallengeCategory::Creativity => "creativity",
            ChallengeCategory::Kindness => "kindness",
            ChallengeCategory::Mindfulness => "mindfulness",
            ChallengeCategory::Fun => "fun",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub text: String,
    pub category: ChallengeCategory,
    pub emoji: String,
}

impl Challenge {
    /// Text for sharing with friends
    pub fn share_text(&self) -> String {
        format!("Today's challenge: {} {}\n\nJoin me at Challenge Me!", self.emoji, self.text)
    }
}

use ChallengeCategory::*;

const BUILT_IN: [(&str, ChallengeCategory, &str); 40] = [
    ("Do 20 jumping jacks right now!", Fitness, "💪"),
    ("Take a 10-minute walk outside", Fitness, "🚶"),
    ("Hold a plank for 30 seconds", Fitness, "🏋️"),
    ("Do 15 squats with perfect form", Fitness, "🦵"),
    ("Stretch for 5 minutes", Fitness, "🧘"),
    ("Take the stairs instead of the elevator today", Fitness, "🪜"),
    ("Do 10 push-ups (modified is okay!)", Fitness, "💥"),
    ("Dance to your favorite song", Fitness, "💃"),
    ("Draw something you see right now", Creativity, "🎨"),
    ("Write a haiku about your day", Creativity, "✍️"),
    ("Take a photo of something beautiful", Creativity, "📸"),
    ("Doodle for 5 minutes without judgment", Creativity, "🖍️"),
    ("Create a new recipe with ingredients you have", Creativity, "👨‍🍳"),
    ("Write down 3 ideas (any ideas!)", Creativity, "💡"),
    ("Rearrange something in your space", Creativity, "🎭"),
    ("Make up a short story about your pet or favorite object", Creativity, "📖"),
    ("Compliment someone genuinely", Kindness, "💝"),
    ("Send a thank you message to someone", Kindness, "💌"),
    ("Hold the door open for someone", Kindness, "🚪"),
    ("Share something you love with someone", Kindness, "🎁"),
    ("Call or text someone you haven't talked to in a while", Kindness, "📞"),
    ("Leave a positive review for a local business", Kindness, "⭐"),
    ("Donate something you don't use anymore", Kindness, "🤲"),
    ("Smile at 5 strangers today", Kindness, "😊"),
    ("Take 5 deep breaths slowly", Mindfulness, "🧘‍♀️"),
    ("Write down 3 things you're grateful for", Mindfulness, "🙏"),
    ("Sit in silence for 2 minutes", Mindfulness, "🤫"),
    ("Notice 5 things you can see, 4 you can touch, 3 you can hear", Mindfulness, "👀"),
    ("Drink a glass of water mindfully", Mindfulness, "💧"),
    ("Put your phone away for 30 minutes", Mindfulness, "📵"),
    ("Watch the sunset or sunrise", Mindfulness, "🌅"),
    ("Journal about how you feel right now", Mindfulness, "📝"),
    ("Learn one fun fact and share it", Fun, "🤓"),
    ("Try a new food or drink", Fun, "🍜"),
    ("Listen to a song in a language you don't speak", Fun, "🎵"),
    ("Wear something colorful today", Fun, "🌈"),
    ("Make someone laugh", Fun, "😂"),
    ("Do something with your non-dominant hand", Fun, "✋"),
    ("Watch a 5-minute video on something you know nothing about", Fun, "📺"),
    ("Create a weird face and take a selfie", Fun, "🤪"),
];

/// The built-in catalog, ids 1 through 40
pub static CATALOG: Lazy<Vec<Challenge>> = Lazy::new(|| {
    BUILT_IN
        .iter()
        .enumerate()
        .map(|(i, (text, category, emoji))| Challenge {
            id: i as u64 + 1,
            text: text.to_string(),
            category: *category,
            emoji: emoji.to_string(),
        })
        .collect()
});

/// Today's pick, reused until the date changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallenge {
    pub date: NaiveDate,
    pub challenge: Challenge,
    #[serde(default)]
    pub revealed: bool,
}

// ============================================================================
// Streak
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub count: u32,
    /// Stored as `YYYY-MM-DD`, or `""` before the first completion
    #[serde(default, with = "last_completed")]
    pub last_completed: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub emoji: &'static str,
    pub text: &'static str,
}

impl Streak {
    /// Still alive on `today`: completed today or yesterday
    pub fn is_current(&self, today: NaiveDate) -> bool {
        match self.last_completed {
            Some(last) => last == today || last == today - Duration::days(1),
            None => false,
        }
    }

    /// The streak as it should be shown on `today`; a broken streak reads 0
    pub fn as_of(&self, today: NaiveDate) -> Streak {
        if self.is_current(today) {
            *self
        } else {
            Streak::default()
        }
    }

    pub fn milestone(&self) -> Milestone {
        let (emoji, text) = match self.count {
            c if c >= 30 => ("🌈", "Legend Mode!"),
            c if c >= 7 => ("💪", "Strong!"),
            c if c >= 3 => ("🏅", "Getting it!"),
            _ => ("🔥", "Keep going!"),
        };
        Milestone { emoji, text }
    }

    /// Fill of the progress bar, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        (self.count as f64 / STREAK_GOAL as f64).min(1.0)
    }
}

/// Dates are written as `YYYY-MM-DD`. Reading also accepts a full ISO
/// timestamp (only the date part is kept) and `""` for no date.
mod last_completed {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakUpdate {
    /// First completion, or first after a broken streak
    Started,
    Extended,
    /// Already completed today; count unchanged
    AlreadyCounted,
}

/// Payload for crediting a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub user_id: String,
    pub challenge_text: String,
    pub challenge_category: ChallengeCategory,
    pub points_earned: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub challenge: Challenge,
    pub streak: Streak,
    pub update: StreakUpdate,
    /// Encouragement to show, if any
    pub message: Option<String>,
    pub record: Option<CompletionRecord>,
}

// ============================================================================
// Book
// ============================================================================

/// Challenge state over a key-value store
pub struct ChallengeBook<'s> {
    store: &'s mut dyn KeyValueStore,
    custom: Vec<Challenge>,
}

impl<'s> ChallengeBook<'s> {
    /// Load custom challenges from `store`. Unreadable data starts empty.
    pub fn load(store: &'s mut dyn KeyValueStore) -> Self {
        let custom = load_json::<Vec<Challenge>, _>(&*store, CUSTOM_CHALLENGES_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "discarding unreadable custom challenges");
                None
            })
            .unwrap_or_default();
        ChallengeBook { store, custom }
    }

    pub fn custom(&self) -> &[Challenge] {
        &self.custom
    }

    /// Catalog followed by custom challenges
    pub fn all(&self) -> Vec<&Challenge> {
        CATALOG.iter().chain(self.custom.iter()).collect()
    }

    /// Add a custom challenge (category fun, emoji ✨, id from `now`).
    ///
    /// # Errors
    ///
    /// `CalcError::InvalidInput` for blank text.
    pub fn add_custom(&mut self, text: &str, now: DateTime<Utc>) -> CalcResult<Challenge> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CalcError::invalid_input("challenge", text, "Challenge text cannot be empty"));
        }
        let challenge = Challenge {
            id: now.timestamp_millis().max(0) as u64,
            text: text.to_string(),
            category: ChallengeCategory::Fun,
            emoji: "✨".to_string(),
        };
        self.custom.push(challenge.clone());
        store_json(&mut *self.store, CUSTOM_CHALLENGES_KEY, &self.custom)?;
        info!(id = challenge.id, "custom challenge added");
        Ok(challenge)
    }

    /// Today's challenge, picking and saving a new one when the stored
    /// pick is from another day
    pub fn daily<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) -> CalcResult<Challenge> {
        Ok(self.daily_entry(today, rng)?.challenge)
    }

    /// Reveal today's challenge. Stays revealed until a new one is picked.
    pub fn reveal<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) -> CalcResult<DailyChallenge> {
        let mut daily = self.daily_entry(today, rng)?;
        if !daily.revealed {
            daily.revealed = true;
            store_json(&mut *self.store, DAILY_CHALLENGE_KEY, &daily)?;
            debug!(id = daily.challenge.id, %today, "daily challenge revealed");
        }
        Ok(daily)
    }

    /// Today's stored pick with its reveal state, picking one if needed
    pub fn daily_entry<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) -> CalcResult<DailyChallenge> {
        match load_json::<DailyChallenge, _>(&*self.store, DAILY_CHALLENGE_KEY) {
            Ok(Some(saved)) if saved.date == today => return Ok(saved),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "discarding unreadable daily challenge"),
        }
        self.pick(today, rng)
    }

    /// Pick a random challenge from the catalog and custom list and make it
    /// today's
    pub fn new_challenge<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) -> CalcResult<Challenge> {
        Ok(self.pick(today, rng)?.challenge)
    }

    fn pick<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) -> CalcResult<DailyChallenge> {
        let challenge = self
            .all()
            .choose(rng)
            .map(|c| (*c).clone())
            .ok_or_else(|| CalcError::Internal {
                message: "challenge catalog is empty".to_string(),
            })?;
        let daily = DailyChallenge {
            date: today,
            challenge,
            revealed: false,
        };
        store_json(&mut *self.store, DAILY_CHALLENGE_KEY, &daily)?;
        debug!(id = daily.challenge.id, %today, "daily challenge picked");
        Ok(daily)
    }

    /// Streak as of `today`. A broken streak is reset in the store.
    pub fn streak(&mut self, today: NaiveDate) -> CalcResult<Streak> {
        let saved = match load_json::<Streak, _>(&*self.store, STREAK_KEY) {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "discarding unreadable streak");
                None
            }
        };
        let Some(saved) = saved else {
            return Ok(Streak::default());
        };
        let current = saved.as_of(today);
        if current != saved {
            info!(count = saved.count, "streak broken, resetting");
            store_json(&mut *self.store, STREAK_KEY, &current)?;
        }
        Ok(current)
    }

    /// Mark today's challenge done.
    ///
    /// The first completion of a day extends the streak; later ones on the
    /// same day leave it unchanged. `user_id` produces a
    /// [`CompletionRecord`] worth [`POINTS_PER_COMPLETION`].
    pub fn complete<R: Rng + ?Sized>(
        &mut self,
        today: NaiveDate,
        user_id: Option<&str>,
        rng: &mut R,
    ) -> CalcResult<Completion> {
        let challenge = self.daily(today, rng)?;
        let before = self.streak(today)?;

        let (streak, update) = if before.last_completed == Some(today) {
            (before, StreakUpdate::AlreadyCounted)
        } else {
            let streak = Streak {
                count: before.count + 1,
                last_completed: Some(today),
            };
            store_json(&mut *self.store, STREAK_KEY, &streak)?;
            let update = if before.count == 0 {
                StreakUpdate::Started
            } else {
                StreakUpdate::Extended
            };
            (streak, update)
        };

        let message = match update {
            StreakUpdate::Started => Some(FIRST_COMPLETION_MESSAGE.to_string()),
            StreakUpdate::Extended => MOTIVATIONAL_QUOTES.choose(rng).map(|q| q.to_string()),
            StreakUpdate::AlreadyCounted => None,
        };

        let record = user_id.map(|id| CompletionRecord {
            user_id: id.to_string(),
            challenge_text: challenge.text.clone(),
            challenge_category: challenge.category,
            points_earned: POINTS_PER_COMPLETION,
        });

        info!(count = streak.count, ?update, "challenge completed");
        Ok(Completion {
            challenge,
            streak,
            update,
            message,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_catalog() {
        assert_eq!(CATALOG.len(), 40);
        assert_eq!(CATALOG[0].id, 1);
        assert_eq!(CATALOG[39].id, 40);
        for category in [Fitness, Creativity, Kindness, Mindfulness, Fun] {
            assert_eq!(CATALOG.iter().filter(|c| c.category == category).count(), 8);
        }
    }

    #[test]
    fn test_daily_is_stable_within_a_day() {
        let mut store = MemoryStore::new();
        let mut book = ChallengeBook::load(&mut store);
        let mut rng = rng();
        let first = book.daily(day(2025, 3, 1), &mut rng).unwrap();
        for _ in 0..5 {
            assert_eq!(book.daily(day(2025, 3, 1), &mut rng).unwrap(), first);
        }
    }

    #[test]
    fn test_daily_changes_with_date() {
        let mut store = MemoryStore::new();
        let saved = DailyChallenge {
            date: day(2025, 2, 28),
            challenge: CATALOG[0].clone(),
            revealed: true,
        };
        store_json(&mut store, DAILY_CHALLENGE_KEY, &saved).unwrap();

        let mut book = ChallengeBook::load(&mut store);
        book.daily(day(2025, 3, 1), &mut rng()).unwrap();
        drop(book);

        let stored: DailyChallenge = load_json(&store, DAILY_CHALLENGE_KEY).unwrap().unwrap();
        assert_eq!(stored.date, day(2025, 3, 1));
        assert!(!stored.revealed);
    }

    #[test]
    fn test_reveal_persists_until_new_pick() {
        let mut store = MemoryStore::new();
        let mut book = ChallengeBook::load(&mut store);
        let mut rng = rng();
        let today = day(2025, 3, 1);

        let hidden = book.daily_entry(today, &mut rng).unwrap();
        assert!(!hidden.revealed);
        let shown = book.reveal(today, &mut rng).unwrap();
        assert!(shown.revealed);
        assert_eq!(shown.challenge, hidden.challenge);
        assert!(book.daily_entry(today, &mut rng).unwrap().revealed);

        book.new_challenge(today, &mut rng).unwrap();
        assert!(!book.daily_entry(today, &mut rng).unwrap().revealed);
        drop(book);

        let stored: DailyChallenge = load_json(&store, DAILY_CHALLENGE_KEY).unwrap().unwrap();
        assert!(!stored.revealed);
    }

    #[test]
    fn test_add_custom() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let mut book = ChallengeBook::load(&mut store);
        let added = book.add_custom("  Juggle three oranges ", now).unwrap();
        assert_eq!(added.text, "Juggle three oranges");
        assert_eq!(added.category, ChallengeCategory::Fun);
        assert_eq!(added.emoji, "✨");
        assert_eq!(added.id, now.timestamp_millis() as u64);
        assert_eq!(book.all().len(), 41);

        assert!(book.add_custom("   ", now).is_err());
        drop(book);

        let reloaded = ChallengeBook::load(&mut store);
        assert_eq!(reloaded.custom().len(), 1);
    }

    #[test]
    fn test_streak_progression() {
        let mut store = MemoryStore::new();
        let mut book = ChallengeBook::load(&mut store);
        let mut rng = rng();

        let first = book.complete(day(2025, 3, 1), None, &mut rng).unwrap();
        assert_eq!(first.streak.count, 1);
        assert_eq!(first.update, StreakUpdate::Started);
        assert_eq!(first.message.as_deref(), Some(FIRST_COMPLETION_MESSAGE));

        let again = book.complete(day(2025, 3, 1), None, &mut rng).unwrap();
        assert_eq!(again.streak.count, 1);
        assert_eq!(again.update, StreakUpdate::AlreadyCounted);
        assert!(again.message.is_none());

        let next = book.complete(day(2025, 3, 2), None, &mut rng).unwrap();
        assert_eq!(next.streak.count, 2);
        assert_eq!(next.update, StreakUpdate::Extended);
        assert!(MOTIVATIONAL_QUOTES.contains(&next.message.as_deref().unwrap()));
    }

    #[test]
    fn test_broken_streak_resets() {
        let mut store = MemoryStore::new();
        let stale = Streak {
            count: 9,
            last_completed: Some(day(2025, 3, 1)),
        };
        store_json(&mut store, STREAK_KEY, &stale).unwrap();

        let mut book = ChallengeBook::load(&mut store);
        assert_eq!(book.streak(day(2025, 3, 2)).unwrap().count, 9);
        assert_eq!(book.streak(day(2025, 3, 4)).unwrap(), Streak::default());

        let done = book.complete(day(2025, 3, 4), None, &mut rng()).unwrap();
        assert_eq!(done.streak.count, 1);
        assert_eq!(done.update, StreakUpdate::Started);
    }

    #[test]
    fn test_completion_record_needs_user() {
        let mut store = MemoryStore::new();
        let mut book = ChallengeBook::load(&mut store);
        let done = book.complete(day(2025, 3, 1), Some("user-1"), &mut rng()).unwrap();
        let record = done.record.unwrap();
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.points_earned, 10);
        assert_eq!(record.challenge_text, done.challenge.text);
    }

    #[test]
    fn test_streak_wire_format() {
        let streak = Streak {
            count: 3,
            last_completed: Some(day(2025, 1, 2)),
        };
        assert_eq!(
            serde_json::to_string(&streak).unwrap(),
            r#"{"count":3,"lastCompleted":"2025-01-02"}"#
        );

        let legacy: Streak = serde_json::from_str(r#"{"count":4,"lastCompleted":"2025-01-02T18:30:00.000Z"}"#).unwrap();
        assert_eq!(legacy.last_completed, Some(day(2025, 1, 2)));
        let empty: Streak = serde_json::from_str(r#"{"count":0,"lastCompleted":""}"#).unwrap();
        assert_eq!(empty.last_completed, None);
    }

    #[test]
    fn test_milestones_and_progress() {
        let at = |count| Streak {
            count,
            last_completed: None,
        };
        assert_eq!(at(0).milestone().text, "Keep going!");
        assert_eq!(at(3).milestone().text, "Getting it!");
        assert_eq!(at(7).milestone().text, "Strong!");
        assert_eq!(at(30).milestone().text, "Legend Mode!");
        assert_eq!(at(15).progress(), 0.5);
        assert_eq!(at(45).progress(), 1.0);
    }

    #[test]
    fn test_share_text() {
        let text = CATALOG[36].share_text();
        assert_eq!(text, "Today's challenge: 😂 Make someone laugh\n\nJoin me at Challenge Me!");
    }
}
