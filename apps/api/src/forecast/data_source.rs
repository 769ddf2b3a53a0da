//! Historical Data Source — read-only access to past observations.
//!
//! `PgObservationSource` reads the `employment_data` table. Stored floats are
//! converted to decimals at the table's precision on the way out.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::forecast::precision::{decimal_from_f64, round_coordinate, round_percentage};
use crate::models::observation::{
    EmploymentDataRow, Gender, HistoricalObservation, OccupationType, Region,
};

#[async_trait]
pub trait HistoricalDataSource: Send + Sync {
    /// All observations for the pair. No pagination.
    async fn fetch_observations(
        &self,
        region: Region,
        occupation: OccupationType,
    ) -> Result<Vec<HistoricalObservation>, AppError>;
}

pub struct PgObservationSource {
    pool: PgPool,
}

impl PgObservationSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoricalDataSource for PgObservationSource {
    async fn fetch_observations(
        &self,
        region: Region,
        occupation: OccupationType,
    ) -> Result<Vec<HistoricalObservation>, AppError> {
        let rows = sqlx::query_as::<_, EmploymentDataRow>(
            r#"
            SELECT "RegionName", "Year", "Gender", "OccupationType",
                   "EmploymentPercentage", "MarginofErrorPercentage",
                   "Longitude", "Latitude"
            FROM employment_data
            WHERE "RegionName" = $1 AND "OccupationType" = $2
            ORDER BY "Year", "Gender"
            "#,
        )
        .bind(region.label())
        .bind(occupation.label())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(into_observation).collect())
    }
}

/// Drops rows that cannot take part in a forecast: unknown gender or non-finite numbers.
pub fn into_observation(row: EmploymentDataRow) -> Option<HistoricalObservation> {
    let gender = match row.gender.parse::<Gender>() {
        Ok(gender) => gender,
        Err(reason) => {
            warn!(
                "Skipping employment_data row {} {}: {reason}",
                row.region_name, row.year
            );
            return None;
        }
    };

    let numbers = (
        decimal_from_f64(row.employment_percentage),
        decimal_from_f64(row.margin_of_error_percentage),
        decimal_from_f64(row.longitude),
        decimal_from_f64(row.latitude),
    );
    let (Some(employment), Some(margin), Some(longitude), Some(latitude)) = numbers else {
        warn!(
            "Skipping employment_data row {} {} {}: non-finite value",
            row.region_name, row.year, row.gender
        );
        return None;
    };

    Some(HistoricalObservation {
        region: row.region_name,
        year: row.year,
        gender,
        occupation_type: row.occupation_type,
        employment_percentage: round_percentage(employment),
        margin_of_error_percentage: round_percentage(margin),
        longitude: round_coordinate(longitude),
        latitude: round_coordinate(latitude),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn row(gender: &str, pct: f64) -> EmploymentDataRow {
        EmploymentDataRow {
            region_name: "England".to_string(),
            year: 2022,
            gender: gender.to_string(),
            occupation_type: "1: managers, directors and senior officials".to_string(),
            employment_percentage: pct,
            margin_of_error_percentage: 0.345,
            longitude: -1.1743197,
            latitude: 52.3555177,
        }
    }

    #[test]
    fn test_row_converts_with_table_precision() {
        let observation = into_observation(row("Female", 14.505)).unwrap();
        assert_eq!(observation.gender, Gender::Female);
        assert_eq!(observation.employment_percentage, Decimal::from_str("14.50").unwrap());
        assert_eq!(observation.margin_of_error_percentage, Decimal::from_str("0.34").unwrap());
        assert_eq!(observation.longitude, Decimal::from_str("-1.17432").unwrap());
        assert_eq!(observation.latitude, Decimal::from_str("52.355518").unwrap());
    }

    #[test]
    fn test_unknown_gender_is_skipped() {
        assert!(into_observation(row("All", 10.0)).is_none());
    }

    #[test]
    fn test_non_finite_value_is_skipped() {
        assert!(into_observation(row("Male", f64::NAN)).is_none());
    }
}
