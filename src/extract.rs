//! Turns a thermostat's status page into a typed [`DeviceState`].
//!
//! The devices render their state as an HTML description list. The values sit
//! in `dd` nodes; when matching `dt` labels are present they identify each
//! field, otherwise the document-order position does: 0 = current temperature,
//! 1 = current humidity, 2 = power flag, 3 = on-threshold, 4 = off-threshold.
//! All markup quirks (unit suffixes, whitespace, label variants) are handled
//! here so nothing else in the crate depends on the page's shape.

use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::models::device::{DeviceError, DeviceState};

const FIELD_COUNT: usize = 5;

static DD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());
static DT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt").unwrap());

/// Field roles in positional order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Field {
    Temperature,
    Humidity,
    Power,
    SetpointOn,
    SetpointOff,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Power => "power",
            Field::SetpointOn => "on-threshold",
            Field::SetpointOff => "off-threshold",
        }
    }

    /// Known `dt` label spellings across firmware revisions, lowercase,
    /// trailing colon already stripped.
    fn matches_label(self, label: &str) -> bool {
        let aliases: &[&str] = match self {
            Field::Temperature => &["temperature", "current temperature", "temp"],
            Field::Humidity => &["humidity", "current humidity", "relative humidity"],
            Field::Power => &["power", "state", "status"],
            Field::SetpointOn => &["on", "turn on", "on under", "on threshold"],
            Field::SetpointOff => &["off", "turn off", "off over", "off threshold"],
        };
        aliases.contains(&label)
    }
}

const ALL_FIELDS: [Field; FIELD_COUNT] = [
    Field::Temperature,
    Field::Humidity,
    Field::Power,
    Field::SetpointOn,
    Field::SetpointOff,
];

/// Extract a device state from raw status markup.
///
/// Pure: identical markup always yields the identical result. Never fills in
/// defaults — a missing or malformed field fails the whole record.
pub fn extract(markup: &str) -> Result<DeviceState, DeviceError> {
    let document = Html::parse_document(markup);

    let values: Vec<String> = document
        .select(&DD)
        .map(|dd| dd.text().collect::<String>().trim().to_string())
        .collect();
    if values.len() < FIELD_COUNT {
        return Err(DeviceError::Parse(format!(
            "incomplete state: expected {} fields, found {}",
            FIELD_COUNT,
            values.len()
        )));
    }

    let labels: Vec<String> = document
        .select(&DT)
        .map(|dt| {
            dt.text()
                .collect::<String>()
                .trim()
                .trim_end_matches(':')
                .trim_end()
                .to_lowercase()
        })
        .collect();

    let ordered = match resolve_by_label(&labels, &values) {
        Some(fields) => fields,
        // No usable labels: fall back to the positional contract.
        None => [
            values[0].as_str(),
            values[1].as_str(),
            values[2].as_str(),
            values[3].as_str(),
            values[4].as_str(),
        ],
    };

    Ok(DeviceState {
        temperature_c: parse_numeric(Field::Temperature, ordered[0])?,
        humidity_pct: parse_numeric(Field::Humidity, ordered[1])?,
        // Device convention: "0" means off, any other token means on.
        power_on: ordered[2] != "0",
        setpoint_on_c: parse_numeric(Field::SetpointOn, ordered[3])?,
        setpoint_off_c: parse_numeric(Field::SetpointOff, ordered[4])?,
    })
}

/// Label-keyed resolution: only used when every field resolves to exactly one
/// labeled value. Anything short of that keeps the positional contract, which
/// is what the device firmware is known to guarantee.
fn resolve_by_label<'a>(labels: &'a [String], values: &'a [String]) -> Option<[&'a str; FIELD_COUNT]> {
    if labels.len() != values.len() {
        return None;
    }

    let mut resolved: [Option<&str>; FIELD_COUNT] = [None; FIELD_COUNT];
    for (label, value) in labels.iter().zip(values) {
        for (slot, field) in ALL_FIELDS.iter().enumerate() {
            if field.matches_label(label) {
                if resolved[slot].is_some() {
                    return None; // duplicate label, ambiguous
                }
                resolved[slot] = Some(value.as_str());
                break;
            }
        }
    }

    match resolved {
        [Some(a), Some(b), Some(c), Some(d), Some(e)] => Some([a, b, c, d, e]),
        _ => None,
    }
}

/// Parse one numeric field, tolerating the unit suffixes the status page
/// appends ("ºC" on temperatures, "%" on humidity).
fn parse_numeric(field: Field, raw: &str) -> Result<f64, DeviceError> {
    let stripped = raw
        .trim()
        .trim_end_matches('%')
        .trim_end_matches("ºC")
        .trim_end_matches("°C")
        .trim();

    match stripped.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DeviceError::Parse(format!(
            "malformed value for {}: {:?}",
            field.name(),
            raw
        ))),
    }
}
