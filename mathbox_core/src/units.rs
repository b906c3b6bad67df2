//! # Unit Conversion
//!
//! Table-driven conversion across six measurement categories. Every category
//! has one implicit base unit with rate 1 (meter, kilogram, celsius, liter,
//! meters/second, square meter); every other unit is expressed as "how many
//! of me make one base unit".
//!
//! - Scalar categories: `value / rate[from] * rate[to]`, shown to 4 decimals
//! - Temperature: normalize to Celsius, then apply the target's formula,
//!   shown to 2 decimals
//!
//! ## Example
//!
//! ```rust
//! use mathbox_core::units::{convert, UnitCategory};
//!
//! assert_eq!(convert(UnitCategory::Length, "meter", "centimeter", "2"), "200.0000");
//! assert_eq!(convert(UnitCategory::Temperature, "celsius", "fahrenheit", "100"), "212.00");
//! assert_eq!(convert(UnitCategory::Length, "meter", "foot", "abc"), "");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Unit Table
// ============================================================================

/// How a unit relates to its category's base unit
#[derive(Debug, Clone, Copy)]
pub enum UnitKind {
    /// Number of this unit in one base unit
    Rate(f64),
    /// Temperature scale: pure functions to and from Celsius
    Scale {
        to_base: fn(f64) -> f64,
        from_base: fn(f64) -> f64,
    },
}

/// A single unit entry in the conversion table
#[derive(Debug, Clone, Copy)]
pub struct Unit {
    /// Table key, e.g. `"fluid_ounce"`
    pub key: &'static str,
    /// Display label, e.g. `"Fluid Ounce (fl oz)"`
    pub label: &'static str,
    /// Short symbol accepted as an alias, e.g. `"fl oz"`
    pub symbol: &'static str,
    /// Relation to the base unit
    pub kind: UnitKind,
}

impl Unit {
    const fn rate(key: &'static str, label: &'static str, symbol: &'static str, rate: f64) -> Self {
        Unit { key, label, symbol, kind: UnitKind::Rate(rate) }
    }

    /// Convert a value in this unit to the category's base unit
    pub fn to_base(&self, value: f64) -> f64 {
        match self.kind {
            UnitKind::Rate(rate) => value / rate,
            UnitKind::Scale { to_base, .. } => to_base(value),
        }
    }

    /// Convert a base-unit value into this unit
    pub fn from_base(&self, value: f64) -> f64 {
        match self.kind {
            UnitKind::Rate(rate) => value * rate,
            UnitKind::Scale { from_base, .. } => from_base(value),
        }
    }
}

fn identity(c: f64) -> f64 {
    c
}

fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

fn celsius_to_fahrenheit(c: f64) -> f64 {
    (c * 9.0 / 5.0) + 32.0
}

fn kelvin_to_celsius(k: f64) -> f64 {
    k - 273.15
}

fn celsius_to_kelvin(c: f64) -> f64 {
    c + 273.15
}

static LENGTH_UNITS: [Unit; 8] = [
    Unit::rate("meter", "Meter (m)", "m", 1.0),
    Unit::rate("kilometer", "Kilometer (km)", "km", 0.001),
    Unit::rate("centimeter", "Centimeter (cm)", "cm", 100.0),
    Unit::rate("millimeter", "Millimeter (mm)", "mm", 1000.0),
    Unit::rate("mile", "Mile (mi)", "mi", 0.000621371),
    Unit::rate("yard", "Yard (yd)", "yd", 1.09361),
    Unit::rate("foot", "Foot (ft)", "ft", 3.28084),
    Unit::rate("inch", "Inch (in)", "in", 39.3701),
];

static WEIGHT_UNITS: [Unit; 6] = [
    Unit::rate("kilogram", "Kilogram (kg)", "kg", 1.0),
    Unit::rate("gram", "Gram (g)", "g", 1000.0),
    Unit::rate("milligram", "Milligram (mg)", "mg", 1_000_000.0),
    Unit::rate("pound", "Pound (lb)", "lb", 2.20462),
    Unit::rate("ounce", "Ounce (oz)", "oz", 35.274),
    Unit::rate("ton", "Metric Ton (t)", "t", 0.001),
];

static TEMPERATURE_UNITS: [Unit; 3] = [
    Unit {
        key: "celsius",
        label: "Celsius (°C)",
        symbol: "c",
        kind: UnitKind::Scale { to_base: identity, from_base: identity },
    },
    Unit {
        key: "fahrenheit",
        label: "Fahrenheit (°F)",
        symbol: "f",
        kind: UnitKind::Scale { to_base: fahrenheit_to_celsius, from_base: celsius_to_fahrenheit },
    },
    Unit {
        key: "kelvin",
        label: "Kelvin (K)",
        symbol: "k",
        kind: UnitKind::Scale { to_base: kelvin_to_celsius, from_base: celsius_to_kelvin },
    },
];

static VOLUME_UNITS: [Unit; 7] = [
    Unit::rate("liter", "Liter (L)", "l", 1.0),
    Unit::rate("milliliter", "Milliliter (mL)", "ml", 1000.0),
    Unit::rate("gallon", "Gallon (gal)", "gal", 0.264172),
    Unit::rate("quart", "Quart (qt)", "qt", 1.05669),
    Unit::rate("pint", "Pint (pt)", "pt", 2.11338),
    Unit::rate("cup", "Cup", "cup", 4.22675),
    Unit::rate("fluid_ounce", "Fluid Ounce (fl oz)", "fl oz", 33.814),
];

static SPEED_UNITS: [Unit; 4] = [
    Unit::rate("mps", "Meters/Second (m/s)", "m/s", 1.0),
    Unit::rate("kph", "Kilometers/Hour (km/h)", "km/h", 3.6),
    Unit::rate("mph", "Miles/Hour (mph)", "mph", 2.23694),
    Unit::rate("knot", "Knot (kn)", "kn", 1.94384),
];

static AREA_UNITS: [Unit; 7] = [
    Unit::rate("square_meter", "Square Meter (m²)", "m2", 1.0),
    Unit::rate("square_kilometer", "Square Kilometer (km²)", "km2", 0.000001),
    Unit::rate("square_mile", "Square Mile (mi²)", "mi2", 3.861e-7),
    Unit::rate("square_yard", "Square Yard (yd²)", "yd2", 1.19599),
    Unit::rate("square_foot", "Square Foot (ft²)", "ft2", 10.7639),
    Unit::rate("hectare", "Hectare (ha)", "ha", 0.0001),
    Unit::rate("acre", "Acre", "ac", 0.000247105),
];

// ============================================================================
// Categories
// ============================================================================

/// Measurement category; each owns a fixed, ordered unit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Length,
    Weight,
    Temperature,
    Volume,
    Speed,
    Area,
}

impl UnitCategory {
    /// All categories in menu order
    pub const ALL: [UnitCategory; 6] = [
        UnitCategory::Length,
        UnitCategory::Weight,
        UnitCategory::Temperature,
        UnitCategory::Volume,
        UnitCategory::Speed,
        UnitCategory::Area,
    ];

    /// Lowercase key used in JSON and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            UnitCategory::Length => "length",
            UnitCategory::Weight => "weight",
            UnitCategory::Temperature => "temperature",
            UnitCategory::Volume => "volume",
            UnitCategory::Speed => "speed",
            UnitCategory::Area => "area",
        }
    }

    /// The category's units in declaration order (base unit first)
    pub fn units(&self) -> &'static [Unit] {
        match self {
            UnitCategory::Length => &LENGTH_UNITS,
            UnitCategory::Weight => &WEIGHT_UNITS,
            UnitCategory::Temperature => &TEMPERATURE_UNITS,
            UnitCategory::Volume => &VOLUME_UNITS,
            UnitCategory::Speed => &SPEED_UNITS,
            UnitCategory::Area => &AREA_UNITS,
        }
    }

    /// Decimal places used when formatting a result
    pub fn decimals(&self) -> usize {
        match self {
            UnitCategory::Temperature => 2,
            _ => 4,
        }
    }

    /// Default (from, to) pair: the first two declared units
    pub fn default_pair(&self) -> (&'static Unit, &'static Unit) {
        let units = self.units();
        (&units[0], &units[1])
    }

    /// Look up a unit by key, label or symbol (case-insensitive)
    pub fn find_unit(&self, name: &str) -> Option<&'static Unit> {
        UNIT_INDEX.get(&(*self, normalize_alias(name))).copied()
    }

    /// Like [`find_unit`](Self::find_unit) but with a structured error
    pub fn unit(&self, name: &str) -> CalcResult<&'static Unit> {
        self.find_unit(name)
            .ok_or_else(|| CalcError::unknown_unit(self.key(), name))
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for UnitCategory {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        UnitCategory::ALL
            .iter()
            .copied()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| CalcError::invalid_input("category", s, "Unknown conversion category"))
    }
}

fn normalize_alias(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// (category, alias) -> unit, built once from the static tables
static UNIT_INDEX: Lazy<HashMap<(UnitCategory, String), &'static Unit>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for category in UnitCategory::ALL {
        for unit in category.units() {
            for alias in [unit.key, unit.label, unit.symbol] {
                index.insert((category, normalize_alias(alias)), unit);
            }
        }
    }
    index
});

// ============================================================================
// Conversion
// ============================================================================

/// Convert a numeric value between two units of the same category.
///
/// # Errors
///
/// `CalcError::UnknownUnit` when either unit is not in `category`.
pub fn try_convert(category: UnitCategory, from: &str, to: &str, value: f64) -> CalcResult<f64> {
    let from_unit = category.unit(from)?;
    let to_unit = category.unit(to)?;
    Ok(to_unit.from_base(from_unit.to_base(value)))
}

/// Convert user text and format for display.
///
/// Returns an empty string when the text is not a finite number or a unit
/// is not in the category; the display simply clears.
pub fn convert(category: UnitCategory, from: &str, to: &str, input: &str) -> String {
    let Some(value) = parse_finite(input) else {
        return String::new();
    };
    match try_convert(category, from, to, value) {
        Ok(converted) => format_fixed(converted, category.decimals()),
        Err(e) => {
            debug!(error = %e, "conversion skipped");
            String::new()
        }
    }
}

/// Parse text as a finite `f64`
pub fn parse_finite(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fixed-point formatting with `decimals` fraction digits. A value that
/// rounds to zero never carries a minus sign.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    match text.strip_prefix('-') {
        Some(magnitude) if magnitude.bytes().all(|b| b == b'0' || b == b'.') => magnitude.to_string(),
        _ => text,
    }
}

// ============================================================================
// Converter State
// ============================================================================

/// State behind the converter screen: one category, a from/to pair, the
/// typed input and the formatted result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterState {
    pub category: UnitCategory,
    pub from_unit: String,
    pub to_unit: String,
    pub input: String,
    pub result: String,
}

impl Default for ConverterState {
    fn default() -> Self {
        ConverterState {
            category: UnitCategory::Length,
            from_unit: "meter".to_string(),
            to_unit: "foot".to_string(),
            input: String::new(),
            result: String::new(),
        }
    }
}

impl ConverterState {
    /// Start on a category with its default unit pair
    pub fn new(category: UnitCategory) -> Self {
        let mut state = ConverterState::default();
        state.set_category(category);
        state
    }

    /// Switch category: reset to the first two units, clear input and result
    pub fn set_category(&mut self, category: UnitCategory) {
        let (from, to) = category.default_pair();
        self.category = category;
        self.from_unit = from.key.to_string();
        self.to_unit = to.key.to_string();
        self.input.clear();
        self.result.clear();
    }

    /// Replace the input text and recompute
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.recompute();
    }

    /// Select the source unit
    pub fn set_from_unit(&mut self, name: &str) -> CalcResult<()> {
        self.from_unit = self.category.unit(name)?.key.to_string();
        self.recompute();
        Ok(())
    }

    /// Select the target unit
    pub fn set_to_unit(&mut self, name: &str) -> CalcResult<()> {
        self.to_unit = self.category.unit(name)?.key.to_string();
        self.recompute();
        Ok(())
    }

    /// Exchange from/to; recompute only when there is input
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from_unit, &mut self.to_unit);
        if !self.input.is_empty() {
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        self.result = convert(self.category, &self.from_unit, &self.to_unit, &self.input);
    }
}
