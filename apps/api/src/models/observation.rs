use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Regions covered by the historical employment dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    England,
    #[serde(rename = "Northern Ireland")]
    NorthernIreland,
    Wales,
    Scotland,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::England,
        Region::NorthernIreland,
        Region::Wales,
        Region::Scotland,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Region::England => "England",
            Region::NorthernIreland => "Northern Ireland",
            Region::Wales => "Wales",
            Region::Scotland => "Scotland",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// SOC major groups, using the labels stored in `employment_data.OccupationType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupationType {
    #[serde(rename = "1: managers, directors and senior officials")]
    Managers,
    #[serde(rename = "2: professional occupations")]
    Professional,
    #[serde(rename = "3: associate prof & tech occupations")]
    AssociateProfessional,
    #[serde(rename = "4: administrative and secretarial occupations")]
    Administrative,
    #[serde(rename = "5: skilled trades occupations")]
    SkilledTrades,
    #[serde(rename = "6: caring, leisure and other service occupations")]
    CaringLeisure,
    #[serde(rename = "7: sales and customer service occupations")]
    SalesCustomerService,
    #[serde(rename = "8: process, plant and machine operatives")]
    ProcessPlantMachine,
}

impl OccupationType {
    pub const ALL: [OccupationType; 8] = [
        OccupationType::Managers,
        OccupationType::Professional,
        OccupationType::AssociateProfessional,
        OccupationType::Administrative,
        OccupationType::SkilledTrades,
        OccupationType::CaringLeisure,
        OccupationType::SalesCustomerService,
        OccupationType::ProcessPlantMachine,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OccupationType::Managers => "1: managers, directors and senior officials",
            OccupationType::Professional => "2: professional occupations",
            OccupationType::AssociateProfessional => "3: associate prof & tech occupations",
            OccupationType::Administrative => "4: administrative and secretarial occupations",
            OccupationType::SkilledTrades => "5: skilled trades occupations",
            OccupationType::CaringLeisure => "6: caring, leisure and other service occupations",
            OccupationType::SalesCustomerService => "7: sales and customer service occupations",
            OccupationType::ProcessPlantMachine => "8: process, plant and machine operatives",
        }
    }
}

impl fmt::Display for OccupationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = String;

    /// Exact match only. The model is instructed to emit `Male` or `Female`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            other => Err(format!("gender must be Male or Female, got '{other}'")),
        }
    }
}

/// Raw row of the `employment_data` table. Floats as stored; converted to
/// `HistoricalObservation` (rounded decimals) before use.
#[derive(Debug, Clone, FromRow)]
pub struct EmploymentDataRow {
    #[sqlx(rename = "RegionName")]
    pub region_name: String,
    #[sqlx(rename = "Year")]
    pub year: i32,
    #[sqlx(rename = "Gender")]
    pub gender: String,
    #[sqlx(rename = "OccupationType")]
    pub occupation_type: String,
    #[sqlx(rename = "EmploymentPercentage")]
    pub employment_percentage: f64,
    #[sqlx(rename = "MarginofErrorPercentage")]
    pub margin_of_error_percentage: f64,
    #[sqlx(rename = "Longitude")]
    pub longitude: f64,
    #[sqlx(rename = "Latitude")]
    pub latitude: f64,
}

/// One historical observation for a (region, occupation) pair.
///
/// Serializes with the canonical DataFrame keys, which is also the shape the
/// model is asked to reproduce for forecast rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalObservation {
    #[serde(rename = "RegionName")]
    pub region: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "OccupationType")]
    pub occupation_type: String,
    #[serde(rename = "EmploymentPercentage", with = "rust_decimal::serde::float")]
    pub employment_percentage: Decimal,
    #[serde(rename = "MarginofErrorPercentage", with = "rust_decimal::serde::float")]
    pub margin_of_error_percentage: Decimal,
    #[serde(rename = "Longitude", with = "rust_decimal::serde::float")]
    pub longitude: Decimal,
    #[serde(rename = "Latitude", with = "rust_decimal::serde::float")]
    pub latitude: Decimal,
}
