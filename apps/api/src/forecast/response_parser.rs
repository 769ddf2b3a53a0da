//! Forecast Response Parser — recovers the forecast table from the model's reply.
//!
//! The reply is free text with markdown sections and, somewhere, the JSON array the
//! "DataFrame Output" section was asked to contain. Extraction is a heuristic:
//! the first `[ {..}, {..} ]` shaped substring anywhere in the text is taken as the
//! payload. The rendered narrative is produced whatever happens to the payload.
//!
//! Row validation is tolerant. A row that is incomplete, ill-typed, outside the
//! forecast window, has a gender other than Male/Female, names a region or occupation
//! other than the one asked for, or repeats a (year, gender) pair is dropped, and the
//! drop is recorded as a `RowRejection` on the outcome.

use std::borrow::Cow;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::OnceLock;

use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::forecast::precision::{decimal_from_f64, round_coordinate, round_percentage};
use crate::forecast::query::ForecastWindow;
use crate::models::observation::{Gender, HistoricalObservation, OccupationType, Region};

/// A model-produced row. Same shape and wire keys as a historical observation.
pub type ForecastRow = HistoricalObservation;

/// Ordered rows, at most one per (year, gender).
pub type ForecastDataset = Vec<ForecastRow>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// Position of the object in the decoded array.
    pub index: usize,
    pub reason: String,
}

/// Terminal result of parsing one reply. Every variant carries the narrative.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Forecast {
        narrative: String,
        window: ForecastWindow,
        dataset: ForecastDataset,
        rejected: Vec<RowRejection>,
    },
    /// Payload decoded but no row survived validation. Not an error; no chart.
    EmptyForecast {
        narrative: String,
        window: ForecastWindow,
        rejected: Vec<RowRejection>,
    },
    NoStructuredData {
        narrative: String,
        window: ForecastWindow,
        raw_text: String,
    },
    MalformedStructuredData {
        narrative: String,
        window: ForecastWindow,
        diagnostic: String,
        payload: String,
    },
}

impl ForecastOutcome {
    pub fn narrative(&self) -> &str {
        match self {
            ForecastOutcome::Forecast { narrative, .. }
            | ForecastOutcome::EmptyForecast { narrative, .. }
            | ForecastOutcome::NoStructuredData { narrative, .. }
            | ForecastOutcome::MalformedStructuredData { narrative, .. } => narrative,
        }
    }

    pub fn window(&self) -> ForecastWindow {
        match self {
            ForecastOutcome::Forecast { window, .. }
            | ForecastOutcome::EmptyForecast { window, .. }
            | ForecastOutcome::NoStructuredData { window, .. }
            | ForecastOutcome::MalformedStructuredData { window, .. } => *window,
        }
    }

    /// Rows to chart. Empty for every variant except `Forecast`.
    pub fn dataset(&self) -> &[ForecastRow] {
        match self {
            ForecastOutcome::Forecast { dataset, .. } => dataset,
            _ => &[],
        }
    }

    pub fn rejected(&self) -> &[RowRejection] {
        match self {
            ForecastOutcome::Forecast { rejected, .. }
            | ForecastOutcome::EmptyForecast { rejected, .. } => rejected,
            _ => &[],
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ForecastOutcome::Forecast { .. } => "forecast",
            ForecastOutcome::EmptyForecast { .. } => "empty_forecast",
            ForecastOutcome::NoStructuredData { .. } => "no_structured_data",
            ForecastOutcome::MalformedStructuredData { .. } => "malformed_structured_data",
        }
    }
}

/// At least one `{...}` inside `[...]`, across line breaks, lazily.
/// Empty brackets in the narrative are never taken for the payload.
fn array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\[(\s*\{.*?\}\s*,?)+\s*\]").expect("array pattern is a valid regex")
    })
}

/// Parses a raw reply into an outcome. No hidden state: same input, same output.
pub fn parse_forecast_reply(
    raw: &str,
    region: Region,
    occupation: OccupationType,
    window: ForecastWindow,
) -> ForecastOutcome {
    let text = normalize_reply(raw);
    let narrative = render_narrative(&text);

    let Some(found) = array_pattern().find(&text) else {
        return ForecastOutcome::NoStructuredData {
            narrative,
            window,
            raw_text: raw.to_string(),
        };
    };
    let payload = found.as_str();

    let objects: Vec<Map<String, Value>> = match serde_json::from_str(payload) {
        Ok(objects) => objects,
        Err(e) => {
            return ForecastOutcome::MalformedStructuredData {
                narrative,
                window,
                diagnostic: e.to_string(),
                payload: payload.to_string(),
            }
        }
    };

    let (dataset, rejected) = validate_rows(&objects, region, occupation, &window);
    if dataset.is_empty() {
        ForecastOutcome::EmptyForecast {
            narrative,
            window,
            rejected,
        }
    } else {
        ForecastOutcome::Forecast {
            narrative,
            window,
            dataset,
            rejected,
        }
    }
}

/// Strips a leading code fence (with its language tag) or a bare `json` marker,
/// plus surrounding whitespace. A stripped opening fence takes its closing fence with
/// it, wherever that closing fence is; the text after it is kept.
pub fn normalize_reply(raw: &str) -> Cow<'_, str> {
    let text = raw.trim_start();

    if let Some(fenced) = text.strip_prefix("```") {
        let body = fenced.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        return match body.find("```") {
            Some(close) => {
                let joined = format!("{}{}", &body[..close], &body[close + 3..]);
                Cow::Owned(joined.trim().to_string())
            }
            None => Cow::Borrowed(body.trim()),
        };
    }

    match text.strip_prefix("json") {
        Some(rest) if rest.starts_with(char::is_whitespace) || rest.starts_with('[') => {
            Cow::Borrowed(rest.trim_start())
        }
        _ => Cow::Borrowed(text),
    }
}

/// CommonMark to HTML, with pipe tables so the Final Forecast Table renders as one.
pub fn render_narrative(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn validate_rows(
    objects: &[Map<String, Value>],
    region: Region,
    occupation: OccupationType,
    window: &ForecastWindow,
) -> (ForecastDataset, Vec<RowRejection>) {
    let mut dataset = Vec::with_capacity(objects.len());
    let mut rejected = Vec::new();
    let mut seen: HashSet<(i32, Gender)> = HashSet::new();

    for (index, object) in objects.iter().enumerate() {
        let row = match decode_row(object) {
            Ok(row) => row,
            Err(reason) => {
                rejected.push(RowRejection { index, reason });
                continue;
            }
        };

        if row.region != region.label() {
            rejected.push(RowRejection {
                index,
                reason: format!("region '{}' does not match {}", row.region, region),
            });
            continue;
        }

        if row.occupation_type != occupation.label() {
            rejected.push(RowRejection {
                index,
                reason: format!(
                    "occupation '{}' does not match {}",
                    row.occupation_type, occupation
                ),
            });
            continue;
        }

        if !window.contains(row.year) {
            rejected.push(RowRejection {
                index,
                reason: format!(
                    "year {} outside forecast window {}-{}",
                    row.year, window.start_year, window.end_year
                ),
            });
            continue;
        }

        if !seen.insert((row.year, row.gender)) {
            rejected.push(RowRejection {
                index,
                reason: format!("duplicate row for {} {}", row.year, row.gender),
            });
            continue;
        }

        dataset.push(row);
    }

    (dataset, rejected)
}

fn decode_row(object: &Map<String, Value>) -> Result<ForecastRow, String> {
    let gender = text_field(object, "Gender")?;
    Ok(ForecastRow {
        region: text_field(object, "RegionName")?,
        year: year_field(object, "Year")?,
        gender: Gender::from_str(&gender)?,
        occupation_type: text_field(object, "OccupationType")?,
        employment_percentage: round_percentage(decimal_field(object, "EmploymentPercentage")?),
        margin_of_error_percentage: round_percentage(decimal_field(
            object,
            "MarginofErrorPercentage",
        )?),
        longitude: round_coordinate(decimal_field(object, "Longitude")?),
        latitude: round_coordinate(decimal_field(object, "Latitude")?),
    })
}

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value, String> {
    match object.get(key) {
        None | Some(Value::Null) => Err(format!("missing field {key}")),
        Some(value) => Ok(value),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Result<String, String> {
    match field(object, key)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        other => Err(format!("{key} must be a non-empty string, got {other}")),
    }
}

/// Integers, integral floats (`2024.0`) and numeric strings are accepted.
fn year_field(object: &Map<String, Value>, key: &str) -> Result<i32, String> {
    let value = field(object, key)?;
    let year = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    year.and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| format!("{key} must be an integer year, got {value}"))
}

fn decimal_field(object: &Map<String, Value>, key: &str) -> Result<Decimal, String> {
    let value = field(object, key)?;
    let decimal = match value {
        Value::Number(n) => n.as_f64().and_then(decimal_from_f64),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    decimal.ok_or_else(|| format!("{key} must be a number, got {value}"))
}
