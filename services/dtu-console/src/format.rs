//! Date and number formatting templates shared by every locale
//!
//! Only message bundles differ between locales; the templates below are
//! applied unchanged to each registered catalog.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Unit suffixes supported by unit-style number formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Byte,
    Kilobyte,
    Megabyte,
    Celsius,
}

impl Unit {
    fn suffix(self) -> &'static str {
        match self {
            Unit::Byte => " byte",
            Unit::Kilobyte => " kB",
            Unit::Megabyte => " MB",
            Unit::Celsius => "°C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberStyle {
    Decimal,
    Percent,
    Unit(Unit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFormat {
    pub style: NumberStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_fraction_digits: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_fraction_digits: Option<u8>,
}

impl NumberFormat {
    const fn new(style: NumberStyle) -> Self {
        Self {
            style,
            minimum_fraction_digits: None,
            maximum_fraction_digits: None,
        }
    }

    const fn digits(style: NumberStyle, min: u8, max: u8) -> Self {
        Self {
            style,
            minimum_fraction_digits: Some(min),
            maximum_fraction_digits: Some(max),
        }
    }

    pub fn format(&self, value: f64) -> String {
        let (value, default_max) = match self.style {
            NumberStyle::Percent => (value * 100.0, 0),
            _ => (value, 3),
        };
        let min = self.minimum_fraction_digits.unwrap_or(0);
        let max = self.maximum_fraction_digits.unwrap_or(default_max).max(min);

        let number = fraction_digits(value, min, max);
        match self.style {
            NumberStyle::Decimal => number,
            NumberStyle::Percent => format!("{}%", number),
            NumberStyle::Unit(unit) => format!("{}{}", number, unit.suffix()),
        }
    }
}

/// Round to `max` fraction digits, then drop trailing zeros down to `min`
fn fraction_digits(value: f64, min: u8, max: u8) -> String {
    let rounded = format!("{:.*}", max as usize, value);
    let Some((int, frac)) = rounded.split_once('.') else {
        return rounded;
    };

    let mut frac = frac.to_string();
    while frac.len() > min as usize && frac.ends_with('0') {
        frac.pop();
    }
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{}.{}", int, frac)
    }
}

/// 24-hour numeric date and time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateTimeFormat {
    pub pattern: String,
}

impl DateTimeFormat {
    pub fn format(&self, value: &NaiveDateTime) -> String {
        value.format(&self.pattern).to_string()
    }
}

/// Named date/time and number formats, serialized for display by the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatTemplates {
    pub datetime: BTreeMap<String, DateTimeFormat>,
    pub numbers: BTreeMap<String, NumberFormat>,
}

impl Default for FormatTemplates {
    fn default() -> Self {
        Self::canonical()
    }
}

impl FormatTemplates {
    /// The template every locale is registered with
    pub fn canonical() -> Self {
        let datetime = BTreeMap::from([(
            "datetime".to_string(),
            DateTimeFormat {
                pattern: "%-m/%-d/%Y, %H:%M:%S".to_string(),
            },
        )]);

        let numbers = [
            ("decimal", NumberFormat::new(NumberStyle::Decimal)),
            (
                "decimalNoDigits",
                NumberFormat::digits(NumberStyle::Decimal, 0, 0),
            ),
            (
                "decimalOneDigit",
                NumberFormat::digits(NumberStyle::Decimal, 1, 1),
            ),
            (
                "decimalTwoDigits",
                NumberFormat::digits(NumberStyle::Decimal, 2, 2),
            ),
            ("percent", NumberFormat::new(NumberStyle::Percent)),
            (
                "percentOneDigit",
                NumberFormat::digits(NumberStyle::Percent, 1, 1),
            ),
            ("byte", NumberFormat::new(NumberStyle::Unit(Unit::Byte))),
            (
                "kilobyte",
                NumberFormat::new(NumberStyle::Unit(Unit::Kilobyte)),
            ),
            (
                "megabyte",
                NumberFormat::new(NumberStyle::Unit(Unit::Megabyte)),
            ),
            (
                "celsius",
                NumberFormat {
                    style: NumberStyle::Unit(Unit::Celsius),
                    minimum_fraction_digits: None,
                    maximum_fraction_digits: Some(1),
                },
            ),
        ]
        .into_iter()
        .map(|(key, format)| (key.to_string(), format))
        .collect();

        Self { datetime, numbers }
    }

    pub fn format_number(&self, key: &str, value: f64) -> Option<String> {
        self.numbers.get(key).map(|f| f.format(value))
    }

    pub fn format_datetime(&self, key: &str, value: &NaiveDateTime) -> Option<String> {
        self.datetime.get(key).map(|f| f.format(value))
    }
}
