//! Forecast Render Adapter — shapes a forecast dataset for the charting front end.
//!
//! One stacked bar series per gender, x = year, y = employment percentage.
//! No chart is produced for an empty dataset; the caller shows the narrative only.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::forecast::query::ForecastWindow;
use crate::forecast::response_parser::ForecastRow;
use crate::models::observation::{Gender, Region};

pub const FEMALE_COLOR: &str = "#B1172C";
pub const MALE_COLOR: &str = "#4292C3";
pub const X_AXIS_TITLE: &str = "Year";
pub const Y_AXIS_TITLE: &str = "Percentage Employed (Relative to Total Employment in the Year)";

/// Series order on the chart. Female first, matching the colour legend.
const SERIES_ORDER: [Gender; 2] = [Gender::Female, Gender::Male];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: Gender,
    pub color: &'static str,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis_title: &'static str,
    pub y_axis_title: &'static str,
    pub bar_mode: &'static str,
    /// Whole years only on the x axis.
    pub x_tick_step: u32,
    pub series: Vec<ChartSeries>,
}

pub fn series_color(gender: Gender) -> &'static str {
    match gender {
        Gender::Female => FEMALE_COLOR,
        Gender::Male => MALE_COLOR,
    }
}

pub fn chart_title(region: Region, window: &ForecastWindow) -> String {
    format!(
        "Employment Trends for {} from {} to {}",
        region, window.start_year, window.end_year
    )
}

/// Returns `None` for an empty dataset. Genders with no rows get no series.
pub fn build_chart(
    dataset: &[ForecastRow],
    region: Region,
    window: &ForecastWindow,
) -> Option<ChartSpec> {
    if dataset.is_empty() {
        return None;
    }

    let series = SERIES_ORDER
        .iter()
        .filter_map(|&gender| {
            let mut points: Vec<ChartPoint> = dataset
                .iter()
                .filter(|row| row.gender == gender)
                .map(|row| ChartPoint {
                    year: row.year,
                    value: row.employment_percentage,
                })
                .collect();
            if points.is_empty() {
                return None;
            }
            points.sort_by_key(|p| p.year);
            Some(ChartSeries {
                name: gender,
                color: series_color(gender),
                points,
            })
        })
        .collect();

    Some(ChartSpec {
        title: chart_title(region, window),
        x_axis_title: X_AXIS_TITLE,
        y_axis_title: Y_AXIS_TITLE,
        bar_mode: "stack",
        x_tick_step: 1,
        series,
    })
}
