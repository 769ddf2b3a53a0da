use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::observation::{HistoricalObservation, OccupationType, Region};

pub const MIN_HORIZON_YEARS: u32 = 1;
pub const MAX_HORIZON_YEARS: u32 = 10;
pub const MAX_HINT_CHARS: usize = 600;
/// Most recent year assumed when no history exists for the pair.
pub const BASELINE_YEAR: i32 = 2023;

/// A validated prediction request. Built once per request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub region: Region,
    pub occupation: OccupationType,
    pub horizon_years: u32,
    pub hint: Option<String>,
}

impl ForecastQuery {
    pub fn new(
        region: Region,
        occupation: OccupationType,
        horizon_years: u32,
        hint: Option<String>,
    ) -> Result<Self, AppError> {
        if !(MIN_HORIZON_YEARS..=MAX_HORIZON_YEARS).contains(&horizon_years) {
            return Err(AppError::Validation(format!(
                "horizon_years must be between {MIN_HORIZON_YEARS} and {MAX_HORIZON_YEARS}, got {horizon_years}"
            )));
        }

        let hint = hint.filter(|h| !h.trim().is_empty());
        if let Some(h) = &hint {
            let chars = h.chars().count();
            if chars > MAX_HINT_CHARS {
                return Err(AppError::Validation(format!(
                    "hint must be at most {MAX_HINT_CHARS} characters, got {chars}"
                )));
            }
        }

        Ok(Self {
            region,
            occupation,
            horizon_years,
            hint,
        })
    }
}

/// Inclusive range of forecast years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub start_year: i32,
    pub end_year: i32,
}

impl ForecastWindow {
    /// `start = max(history year, or BASELINE_YEAR) + 1`, `end = start + horizon - 1`.
    pub fn from_history(history: &[HistoricalObservation], horizon_years: u32) -> Self {
        let most_recent = history
            .iter()
            .map(|o| o.year)
            .max()
            .unwrap_or(BASELINE_YEAR);
        let start_year = most_recent + 1;
        let span = horizon_years.max(MIN_HORIZON_YEARS) as i32;
        Self {
            start_year,
            end_year: start_year + span - 1,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::Gender;
    use rust_decimal::Decimal;

    fn observation(year: i32) -> HistoricalObservation {
        HistoricalObservation {
            region: "Wales".to_string(),
            year,
            gender: Gender::Male,
            occupation_type: "2: professional occupations".to_string(),
            employment_percentage: Decimal::new(1234, 2),
            margin_of_error_percentage: Decimal::new(50, 2),
            longitude: Decimal::new(-317, 2),
            latitude: Decimal::new(5148, 2),
        }
    }

    #[test]
    fn test_window_starts_after_most_recent_year() {
        let history = vec![observation(2022), observation(2021), observation(2023)];
        let window = ForecastWindow::from_history(&history, 5);
        assert_eq!(window.start_year, 2024);
        assert_eq!(window.end_year, 2028);
    }

    #[test]
    fn test_window_without_history_uses_baseline() {
        let window = ForecastWindow::from_history(&[], 3);
        assert_eq!(window.start_year, BASELINE_YEAR + 1);
        assert_eq!(window.end_year, BASELINE_YEAR + 3);
    }

    #[test]
    fn test_single_year_horizon_collapses_window() {
        let window = ForecastWindow::from_history(&[observation(2019)], 1);
        assert_eq!(window.start_year, 2020);
        assert_eq!(window.start_year, window.end_year);
        assert_eq!(window.years().collect::<Vec<_>>(), vec![2020]);
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = ForecastWindow {
            start_year: 2024,
            end_year: 2026,
        };
        assert!(window.contains(2024));
        assert!(window.contains(2026));
        assert!(!window.contains(2023));
        assert!(!window.contains(2027));
    }

    #[test]
    fn test_query_rejects_out_of_range_horizon() {
        for horizon in [0, 11] {
            let result = ForecastQuery::new(
                Region::Wales,
                OccupationType::Professional,
                horizon,
                None,
            );
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn test_query_rejects_long_hint() {
        let hint = "x".repeat(MAX_HINT_CHARS + 1);
        let result = ForecastQuery::new(Region::England, OccupationType::Managers, 3, Some(hint));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_query_drops_blank_hint() {
        let query = ForecastQuery::new(
            Region::Scotland,
            OccupationType::SkilledTrades,
            2,
            Some("   ".to_string()),
        )
        .unwrap();
        assert!(query.hint.is_none());
    }
}
