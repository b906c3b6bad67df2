//! Application entry point and dispatch.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

use mathbox_core::ai::MathQuery;
use mathbox_core::bmi::{self, BmiInput};
use mathbox_core::calculator::{format_number, parse_key_sequence};
use mathbox_core::challenges::{Challenge, ChallengeBook, Streak, STREAK_GOAL};
use mathbox_core::dates::time_zone::parse_clock;
use mathbox_core::dates::{age_breakdown, find_zone, BirthdayCountdown, ZonePair, ZONES};
use mathbox_core::expression::graph::PRESETS;
use mathbox_core::expression::plot;
use mathbox_core::percentage::{format_grouped, format_result, PercentFormula, NO_RESULT};
use mathbox_core::profit_loss;
use mathbox_core::typing::{char_states, random_text, CharState, TypingScore};
use mathbox_core::units::{parse_finite, ConverterState};
use mathbox_core::{CalcError, Calculator, Expression, FileStore, History, KeyValueStore, MemoryStore, UnitCategory};

use crate::ai_client::AiClient;
use crate::chart;
use crate::config::{AppConfig, BmiCommand, ChallengeCommand, Command, PercentKind, ProfitCommand, Settings};
use crate::ticker::CountdownTicker;

/// Run the application.
pub async fn run(config: &AppConfig, settings: &Settings) -> Result<()> {
    match &config.command {
        Command::Convert {
            category,
            value,
            from,
            to,
            swap,
        } => emit(convert(*category, value, from.as_deref(), to.as_deref(), *swap)?),
        Command::Units { category } => emit(list_units(*category)),
        Command::Percent { formula, a, b } => emit(percent(*formula, a, b)),
        Command::Profit(cmd) => emit(profit(cmd)),
        Command::Bmi(cmd) => emit(body_mass_index(cmd)),
        Command::Calc { keys } => {
            let mut store = open_store(config, settings)?;
            emit(calc(keys, store.as_mut())?)
        }
        Command::History { limit, clear } => {
            let mut store = open_store(config, settings)?;
            emit(history(store.as_mut(), *limit, *clear)?)
        }
        Command::Eval { expression, x } => emit(eval(expression, *x)?),
        Command::Graph {
            equation,
            min,
            max,
            width,
            height,
            presets,
        } => {
            if *presets {
                return emit(list_presets());
            }
            let equation = equation.as_deref().unwrap_or_default();
            emit(graph(equation, min, max, *width, *height)?)
        }
        Command::Age { birth, watch, ticks } => {
            let now = Local::now().naive_local();
            emit(age(*birth, now)?)?;
            if *watch {
                watch_birthday(*birth, *ticks).await?;
            }
            Ok(())
        }
        Command::Ask { query, endpoint } => ask(settings, &query.join(" "), endpoint.as_deref()).await,
        Command::Challenge { action } => {
            let mut store = open_store(config, settings)?;
            let action = action.clone().unwrap_or(ChallengeCommand::Today);
            let today = Local::now().date_naive();
            emit(challenge(store.as_mut(), &action, today)?)
        }
        Command::Time { time, from, to, swap } => {
            let input = time.clone().unwrap_or_else(|| Utc::now().format("%H:%M").to_string());
            emit(zone_time(&input, from, to, *swap)?)
        }
        Command::Zones => emit(list_zones()),
        Command::Typing => typing_test(),
    }
}

fn emit(text: String) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", text.trim_end())?;
    Ok(())
}

/// File store at the configured path, or an in-memory store
pub fn open_store(config: &AppConfig, settings: &Settings) -> Result<Box<dyn KeyValueStore>> {
    match config.store_path(settings) {
        Some(path) => {
            let store = FileStore::open(&path).with_context(|| format!("opening store {}", path.display()))?;
            Ok(Box::new(store))
        }
        None => {
            debug!("using in-memory store");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

// ============================================================================
// Converters and formulas
// ============================================================================

pub fn convert(category: UnitCategory, value: &str, from: Option<&str>, to: Option<&str>, swap: bool) -> Result<String> {
    let mut state = ConverterState::new(category);
    if let Some(from) = from {
        state.set_from_unit(from)?;
    }
    if let Some(to) = to {
        state.set_to_unit(to)?;
    }
    if swap {
        state.swap();
    }
    state.set_input(value);
    if state.result.is_empty() {
        bail!("'{}' is not a number", value);
    }
    let from = category.unit(&state.from_unit)?;
    let to = category.unit(&state.to_unit)?;
    Ok(format!("{} {} = {} {}", value.trim(), from.symbol, state.result, to.symbol))
}

pub fn list_units(category: Option<UnitCategory>) -> String {
    let categories = match category {
        Some(c) => vec![c],
        None => UnitCategory::ALL.to_vec(),
    };
    let mut out = String::new();
    for category in categories {
        out.push_str(&format!("{}:\n", category));
        for unit in category.units() {
            out.push_str(&format!("  {:<16} {}\n", unit.key, unit.label));
        }
    }
    out
}

pub fn percent(kind: PercentKind, a: &str, b: &str) -> String {
    let formula = PercentFormula::from(kind);
    let value = formula.evaluate_text(a, b);
    let mut result = format_result(value);
    if value.is_some() && matches!(formula, PercentFormula::WhatPercent | PercentFormula::Change) {
        result.push('%');
    }
    format!("{} {}", formula.describe(a, b), result)
}

pub fn profit(cmd: &ProfitCommand) -> String {
    let money = |v: Option<f64>| v.map_or_else(|| NO_RESULT.to_string(), |v| format!("${:.2}", v));
    match cmd {
        ProfitCommand::Outcome { cost, selling } => match profit_loss::profit_or_loss_text(cost, selling) {
            Some(r) => format!("{}: {}", r.outcome, r.summary()),
            None => NO_RESULT.to_string(),
        },
        ProfitCommand::Selling { cost, profit_percent } => {
            format!("Selling price: {}", money(profit_loss::selling_price_text(cost, profit_percent)))
        }
        ProfitCommand::Cost { selling, profit_percent } => {
            format!("Cost price: {}", money(profit_loss::cost_price_text(selling, profit_percent)))
        }
        ProfitCommand::Markup { cost, markup_percent } => match profit_loss::markup_margin_text(cost, markup_percent) {
            Some(r) => format!("Selling price: ${:.2}\nMargin: {:.2}%", r.selling_price, r.margin),
            None => NO_RESULT.to_string(),
        },
    }
}

pub fn body_mass_index(cmd: &BmiCommand) -> String {
    let input = match cmd {
        BmiCommand::Metric { weight_kg, height_cm } => parse_finite(weight_kg)
            .zip(parse_finite(height_cm))
            .map(|(weight_kg, height_cm)| BmiInput::Metric { weight_kg, height_cm }),
        BmiCommand::Imperial { weight_lb, feet, inches } => bmi::imperial_from_text(weight_lb, feet, inches),
    };
    match input.as_ref().and_then(bmi::calculate) {
        Some(r) => format!("BMI {} ({})", r.display(), r.category),
        None => NO_RESULT.to_string(),
    }
}

// ============================================================================
// Calculator and evaluator
// ============================================================================

/// Press `keys` on a calculator seeded with the stored history.
pub fn calc(keys: &[String], store: &mut dyn KeyValueStore) -> Result<String> {
    let actions = parse_key_sequence(&keys.join(" "))?;
    let mut calculator = Calculator::with_history(History::load(store));
    let recorded = calculator.press_all(actions);
    if !recorded.is_empty() {
        calculator.history().save(store)?;
        info!(entries = recorded.len(), "calculator history saved");
    }

    let mut out = String::new();
    if !calculator.expression().is_empty() {
        out.push_str(calculator.expression());
        out.push('\n');
    }
    out.push_str(calculator.display());
    if calculator.memory() != 0.0 {
        out.push_str(&format!("\nM = {}", format_number(calculator.memory())));
    }
    Ok(out)
}

pub fn history(store: &mut dyn KeyValueStore, limit: usize, clear: bool) -> Result<String> {
    if clear {
        History::new().save(store)?;
        return Ok("History cleared".to_string());
    }
    let history = History::load(store);
    if history.is_empty() {
        return Ok("No calculations yet".to_string());
    }
    Ok(history
        .iter()
        .take(limit)
        .map(|e| format!("{}  {}", e.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"), e.display()))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn eval(expression: &str, x: f64) -> Result<String> {
    let parsed = Expression::parse(expression)?;
    Ok(format_number(parsed.eval_finite(x).unwrap_or(f64::NAN)))
}

pub fn graph(equation: &str, min: &str, max: &str, width: usize, height: usize) -> Result<String> {
    let equation = PRESETS
        .iter()
        .find(|(label, _)| *label == equation)
        .map_or(equation, |(_, eq)| *eq);
    let plot = plot(equation, min, max);
    if let Some(error) = &plot.error {
        bail!("{}", error);
    }
    chart::render(&plot, width, height).context("nothing to draw")
}

pub fn list_presets() -> String {
    PRESETS
        .iter()
        .map(|(label, eq)| format!("{:<8} {}", label, eq))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Dates
// ============================================================================

pub fn age(birth: NaiveDate, now: NaiveDateTime) -> Result<String> {
    let age = age_breakdown(birth, now).context("birth date is in the future")?;
    let mut countdown = BirthdayCountdown::new(birth, now);
    let tick = countdown.tick(now);
    let grouped = |v: i64| format_grouped(v as f64, 0);
    Ok(format!(
        "{} years, {} months, {} days\n\
         {} days · {} hours · {} minutes · {} seconds\n\
         Next birthday in {}",
        age.years,
        age.months,
        age.days,
        grouped(age.total_days),
        grouped(age.total_hours),
        grouped(age.total_minutes),
        grouped(age.total_seconds),
        tick.parts,
    ))
}

async fn watch_birthday(birth: NaiveDate, ticks: Option<u64>) -> Result<()> {
    let mut ticker = CountdownTicker::new();
    let countdown = BirthdayCountdown::new(birth, Local::now().naive_local());
    let mut rx = ticker.start(countdown, Duration::from_secs(1), || Local::now().naive_local());

    let mut out = std::io::stdout();
    let mut seen = 0u64;
    while let Some(tick) = rx.recv().await {
        if tick.celebrate {
            writeln!(out, "\n🎉 Happy birthday! 🎉")?;
        }
        write!(out, "\rNext birthday in {}   ", tick.parts)?;
        out.flush()?;
        seen += 1;
        if ticks.is_some_and(|limit| seen >= limit) {
            break;
        }
    }
    ticker.stop();
    writeln!(out)?;
    Ok(())
}

pub fn zone_time(input: &str, from: &str, to: &str, swap: bool) -> Result<String> {
    let mut pair = ZonePair {
        from: from.to_string(),
        to: to.to_string(),
    };
    if swap {
        pair.swap();
    }
    let from = find_zone(&pair.from)?;
    let to = find_zone(&pair.to)?;
    parse_clock(input)?;
    Ok(format!("{} {} = {} {}", input.trim(), from.label, pair.convert(input), to.label))
}

pub fn list_zones() -> String {
    ZONES
        .iter()
        .map(|z| {
            let sign = if z.offset_minutes < 0 { '-' } else { '+' };
            let offset = z.offset_minutes.abs();
            format!("{:<20} UTC{}{:02}:{:02}  {}", z.key, sign, offset / 60, offset % 60, z.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Challenges
// ============================================================================

fn streak_line(streak: &Streak) -> String {
    let milestone = streak.milestone();
    let filled = (streak.progress() * 20.0).round() as usize;
    format!(
        "{} {} day streak, {}\n[{}{}] {}/{}",
        milestone.emoji,
        streak.count,
        milestone.text,
        "#".repeat(filled),
        ".".repeat(20 - filled),
        streak.count.min(STREAK_GOAL),
        STREAK_GOAL
    )
}

pub fn challenge(store: &mut dyn KeyValueStore, action: &ChallengeCommand, today: NaiveDate) -> Result<String> {
    let mut rng = rand::thread_rng();
    let mut book = ChallengeBook::load(store);
    let out = match action {
        ChallengeCommand::Today => {
            let daily = book.daily_entry(today, &mut rng)?;
            let streak = book.streak(today)?;
            if daily.revealed {
                format!("{}\n\n{}", challenge_card(&daily.challenge), streak_line(&streak))
            } else {
                format!(
                    "🎁 Today's challenge is waiting. Run `mathbox challenge reveal` to see it.\n\n{}",
                    streak_line(&streak)
                )
            }
        }
        ChallengeCommand::New | ChallengeCommand::Reveal => {
            if matches!(action, ChallengeCommand::New) {
                book.new_challenge(today, &mut rng)?;
            }
            let daily = book.reveal(today, &mut rng)?;
            let streak = book.streak(today)?;
            format!("{}\n\n{}", challenge_card(&daily.challenge), streak_line(&streak))
        }
        ChallengeCommand::Done { user } => {
            let completion = book.complete(today, user.as_deref(), &mut rng)?;
            let mut out = format!("Done: {} {}\n", completion.challenge.emoji, completion.challenge.text);
            if let Some(message) = &completion.message {
                out.push_str(message);
                out.push('\n');
            }
            out.push_str(&streak_line(&completion.streak));
            if let Some(record) = &completion.record {
                out.push('\n');
                out.push_str(&serde_json::to_string(record)?);
            }
            out
        }
        ChallengeCommand::Add { text } => {
            let challenge = book.add_custom(&text.join(" "), Utc::now())?;
            format!("Added: {} {}", challenge.emoji, challenge.text)
        }
        ChallengeCommand::List => book
            .all()
            .iter()
            .map(|c| format!("{} {} ({})", c.emoji, c.text, c.category))
            .collect::<Vec<_>>()
            .join("\n"),
        ChallengeCommand::Streak => streak_line(&book.streak(today)?),
        ChallengeCommand::Share => book.daily(today, &mut rng)?.share_text(),
    };
    Ok(out)
}

fn challenge_card(challenge: &Challenge) -> String {
    format!("{} {}\n({})", challenge.emoji, challenge.text, challenge.category)
}

// ============================================================================
// Typing test and AI
// ============================================================================

fn typing_test() -> Result<()> {
    let text = random_text(&mut rand::thread_rng());
    emit(format!("Type this text and press Enter:\n\n{}\n", text))?;

    let started = Utc::now();
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let elapsed = Utc::now() - started;
    let typed = line.trim_end_matches(['\r', '\n']);

    emit(typing_report(text, typed, elapsed))
}

pub fn typing_report(text: &str, typed: &str, elapsed: chrono::Duration) -> String {
    let score = TypingScore::compute(text, typed, elapsed);
    let marks: String = char_states(text, typed)
        .into_iter()
        .map(|s| if s == CharState::Incorrect { '^' } else { ' ' })
        .collect();
    if typed == text {
        format!("Test complete! {}", score)
    } else if marks.trim().is_empty() {
        format!("Not finished. {}", score)
    } else {
        format!("{}\n{}\nNot finished. {}", text, marks.trim_end(), score)
    }
}

async fn ask(settings: &Settings, query: &str, endpoint: Option<&str>) -> Result<()> {
    let query = MathQuery::new(query)?;
    let client = AiClient::from_settings(&settings.ai, endpoint)?;
    let answer = match client.ask(&query).await {
        Ok(answer) => answer,
        Err(e) => return Err(notification(e)),
    };

    let mut out = format!("{} = {}\n{}", answer.expression, answer.display_result(), answer.explanation);
    if answer.agrees() == Some(false) {
        let local = answer.recompute().map(format_number).unwrap_or_default();
        warn!(expression = %answer.expression, remote = answer.result, %local, "gateway result disagrees with local evaluation");
        out.push_str(&format!("\n(local evaluation gives {})", local));
    }
    emit(out)
}

/// Wrap a gateway error under its notification title
fn notification(error: CalcError) -> anyhow::Error {
    match error.notification_title() {
        "Error" => error.into(),
        title => anyhow::Error::new(error).context(title),
    }
}
