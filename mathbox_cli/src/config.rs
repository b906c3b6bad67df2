//! Application configuration from CLI flags, environment and the settings file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mathbox_core::ai::DEFAULT_MODEL;
use mathbox_core::percentage::PercentFormula;
use mathbox_core::UnitCategory;

/// Mathbox - everyday calculators in the terminal.
#[derive(Parser, Debug)]
#[command(name = "mathbox", version, about)]
pub struct AppConfig {
    /// Settings file (default: ~/.mathbox/config.toml).
    #[arg(long, global = true, env = "MATHBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Key-value store file for history, streaks and challenges.
    #[arg(long, global = true, env = "MATHBOX_STORE")]
    pub store: Option<PathBuf>,

    /// Keep state in memory only; nothing is written to disk.
    #[arg(long, global = true, conflicts_with = "store")]
    pub ephemeral: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Log filter directive: `-v` flags win over the settings file.
    pub fn log_level<'a>(&self, settings: &'a Settings) -> &'a str {
        match self.verbose {
            0 => settings.log.level.as_str(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Store file to open, or `None` for an in-memory store.
    ///
    /// `--ephemeral` wins, then `--store`, then `[storage] path`, then
    /// `~/.mathbox/store.json`.
    pub fn store_path(&self, settings: &Settings) -> Option<PathBuf> {
        if self.ephemeral {
            return None;
        }
        self.store
            .clone()
            .or_else(|| settings.storage.path.clone())
            .or_else(default_store_path)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a value between two units of one category.
    Convert {
        /// length, weight, temperature, volume, speed or area
        category: UnitCategory,
        /// Value to convert
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Source unit (key, label or symbol); defaults to the category's first unit
        #[arg(long)]
        from: Option<String>,
        /// Target unit; defaults to the category's second unit
        #[arg(long)]
        to: Option<String>,
        /// Exchange the source and target units
        #[arg(long)]
        swap: bool,
    },

    /// List units, for one category or all.
    Units { category: Option<UnitCategory> },

    /// Percentage formulas.
    Percent {
        #[arg(value_enum)]
        formula: PercentKind,
        #[arg(allow_hyphen_values = true)]
        a: String,
        #[arg(allow_hyphen_values = true)]
        b: String,
    },

    /// Profit, loss and markup.
    #[command(subcommand)]
    Profit(ProfitCommand),

    /// Body mass index.
    #[command(subcommand)]
    Bmi(BmiCommand),

    /// Press calculator keys, e.g. `mathbox calc 5 + 3 =`.
    Calc {
        /// Keys or button words (sin, sqrt, x2, n!, m+, mr, neg, ac, ...)
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        keys: Vec<String>,
    },

    /// Show or clear the calculator history.
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        /// Remove all entries
        #[arg(long)]
        clear: bool,
    },

    /// Evaluate an expression in `x`.
    Eval {
        #[arg(allow_hyphen_values = true)]
        expression: String,
        /// Value substituted for `x`
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        x: f64,
    },

    /// Plot an equation as a text chart.
    Graph {
        /// Equation in `x`, or a preset name (see --presets)
        #[arg(allow_hyphen_values = true, required_unless_present = "presets")]
        equation: Option<String>,
        #[arg(long, default_value = "-10", allow_hyphen_values = true)]
        min: String,
        #[arg(long, default_value = "10", allow_hyphen_values = true)]
        max: String,
        /// Chart width in columns
        #[arg(long, default_value = "60")]
        width: usize,
        /// Chart height in rows
        #[arg(long, default_value = "20")]
        height: usize,
        /// List preset equations
        #[arg(long)]
        presets: bool,
    },

    /// Age breakdown and birthday countdown.
    Age {
        /// Birth date, YYYY-MM-DD
        birth: NaiveDate,
        /// Keep updating the countdown every second
        #[arg(long)]
        watch: bool,
        /// Stop watching after this many updates
        #[arg(long, requires = "watch")]
        ticks: Option<u64>,
    },

    /// Ask a math question in plain language.
    Ask {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        query: Vec<String>,
        /// Gateway URL; overrides `[ai] endpoint`
        #[arg(long, env = "MATHBOX_AI_ENDPOINT")]
        endpoint: Option<String>,
    },

    /// Daily challenge and streak.
    Challenge {
        #[command(subcommand)]
        action: Option<ChallengeCommand>,
    },

    /// Convert a clock time between zones.
    Time {
        /// HH:MM; defaults to the current UTC time
        time: Option<String>,
        #[arg(long, default_value = mathbox_core::dates::time_zone::DEFAULT_FROM_ZONE)]
        from: String,
        #[arg(long, default_value = mathbox_core::dates::time_zone::DEFAULT_TO_ZONE)]
        to: String,
        /// Exchange the two zones
        #[arg(long)]
        swap: bool,
    },

    /// List supported time zones.
    Zones,

    /// Typing speed test: type the shown text and press Enter.
    Typing,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentKind {
    /// What is A% of B?
    Of,
    /// A is what % of B?
    What,
    /// % change from A to B
    Change,
    /// Adjust A by B%
    Adjust,
}

impl From<PercentKind> for PercentFormula {
    fn from(kind: PercentKind) -> Self {
        match kind {
            PercentKind::Of => PercentFormula::PercentOf,
            PercentKind::What => PercentFormula::WhatPercent,
            PercentKind::Change => PercentFormula::Change,
            PercentKind::Adjust => PercentFormula::AdjustBy,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ProfitCommand {
    /// Profit or loss from cost and selling price
    Outcome { cost: String, selling: String },
    /// Selling price for a profit percentage
    Selling {
        cost: String,
        #[arg(allow_hyphen_values = true)]
        profit_percent: String,
    },
    /// Cost price from a selling price and profit percentage
    Cost {
        selling: String,
        #[arg(allow_hyphen_values = true)]
        profit_percent: String,
    },
    /// Selling price and margin from a markup
    Markup { cost: String, markup_percent: String },
}

#[derive(Subcommand, Debug)]
pub enum BmiCommand {
    /// Kilograms and centimeters
    Metric { weight_kg: String, height_cm: String },
    /// Pounds, feet and inches
    Imperial {
        weight_lb: String,
        feet: String,
        #[arg(default_value = "0")]
        inches: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ChallengeCommand {
    /// Show today's challenge (the default)
    Today,
    /// Pick a different challenge for today
    New,
    /// Uncover today's challenge
    Reveal,
    /// Mark today's challenge as done
    Done {
        /// Signed-in user id; prints the completion record
        #[arg(long)]
        user: Option<String>,
    },
    /// Add a custom challenge
    Add {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// List every challenge
    List,
    /// Show the current streak
    Streak,
    /// Print share text for today's challenge
    Share,
}

// ============================================================================
// Settings file
// ============================================================================

/// Contents of `config.toml`. Every section is optional.
///
/// ```toml
/// [storage]
/// path = "/home/me/.mathbox/store.json"
///
/// [ai]
/// endpoint = "https://example.invalid/functions/v1/ask-math"
/// api_key_env = "MATHBOX_AI_KEY"
/// timeout_secs = 30
/// protocol = "function"
///
/// [log]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub ai: AiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: Option<PathBuf>,
}

/// How the gateway expects to be called
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProtocol {
    /// POST `{query}`, reply is the answer object
    #[default]
    Function,
    /// OpenAI-style chat completions
    Chat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub endpoint: Option<String>,
    /// Environment variable holding the bearer key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub protocol: AiProtocol,
    /// Model name, used by the chat protocol
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        AiSettings {
            endpoint: None,
            api_key_env: "MATHBOX_AI_KEY".to_string(),
            timeout_secs: 30,
            protocol: AiProtocol::Function,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// tried and a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Settings::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = Self::from_toml(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

fn mathbox_dir() -> Option<PathBuf> {
    dirs_next::home_dir().map(|h| h.join(".mathbox"))
}

/// `~/.mathbox/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    mathbox_dir().map(|d| d.join("config.toml"))
}

/// `~/.mathbox/store.json`
pub fn default_store_path() -> Option<PathBuf> {
    mathbox_dir().map(|d| d.join("store.json"))
}
