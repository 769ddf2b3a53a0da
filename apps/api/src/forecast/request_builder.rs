//! Forecast Request Builder — renders the query, the historical rows and the
//! output contract into a single prompt.
//!
//! Pure function of its inputs: identical query and rows give byte-identical text.

use serde::Serialize;

use crate::forecast::precision::{round_coordinate, round_percentage};
use crate::forecast::prompts::{
    PromptContract, DATAFRAME_SECTION_RULES, FORECAST_CONTRACT, FORECAST_PROMPT_TEMPLATE,
    HINT_TEMPLATE, TABLE_SECTION_RULES,
};
use crate::forecast::query::{ForecastQuery, ForecastWindow};
use crate::models::observation::HistoricalObservation;

/// The rendered prompt plus the window it asks for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRequest {
    pub text: String,
    pub window: ForecastWindow,
}

pub fn build_forecast_request(
    query: &ForecastQuery,
    history: &[HistoricalObservation],
) -> Result<ForecastRequest, serde_json::Error> {
    build_with_contract(&FORECAST_CONTRACT, query, history)
}

pub fn build_with_contract(
    contract: &PromptContract,
    query: &ForecastQuery,
    history: &[HistoricalObservation],
) -> Result<ForecastRequest, serde_json::Error> {
    let window = ForecastWindow::from_history(history, query.horizon_years);

    let rounded: Vec<HistoricalObservation> = history.iter().map(round_observation).collect();
    let history_json = serde_json::to_string_pretty(&rounded)?;

    let years = window
        .years()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = FORECAST_PROMPT_TEMPLATE
        .replace("{sections}", &render_sections(contract, query, &window))
        .replace("{considerations}", &render_considerations(contract))
        .replace("{columns}", &contract.columns.join(", "))
        .replace("{horizon}", &query.horizon_years.to_string())
        .replace("{start_year}", &window.start_year.to_string())
        .replace("{end_year}", &window.end_year.to_string())
        .replace("{years}", &format!("[{years}]"))
        .replace("{rounding_policy}", contract.rounding_policy)
        .replace("{percentage_dp}", &contract.percentage_dp.to_string())
        .replace("{coordinate_dp}", &contract.coordinate_dp.to_string())
        .replace("{margin_rule}", contract.margin_of_error_rule)
        .replace("{genders}", &contract.allowed_genders.join(" or "))
        .replace("{region}", query.region.label())
        .replace("{occupation}", query.occupation.label())
        // Data last, so nothing inside it is mistaken for a placeholder.
        .replace("{history_json}", &history_json);

    if let Some(hint) = &query.hint {
        text.push_str(&HINT_TEMPLATE.replace("{hint}", hint));
    }

    Ok(ForecastRequest { text, window })
}

fn round_observation(o: &HistoricalObservation) -> HistoricalObservation {
    HistoricalObservation {
        employment_percentage: round_percentage(o.employment_percentage),
        margin_of_error_percentage: round_percentage(o.margin_of_error_percentage),
        longitude: round_coordinate(o.longitude),
        latitude: round_coordinate(o.latitude),
        ..o.clone()
    }
}

fn render_sections(
    contract: &PromptContract,
    query: &ForecastQuery,
    window: &ForecastWindow,
) -> String {
    let example_json = format!(
        r#"[{{"RegionName": "{region}", "Year": {year}, "Gender": "Male" or "Female", "OccupationType": "{occupation}", "EmploymentPercentage": <number, {pdp} dp>, "MarginofErrorPercentage": <number, {pdp} dp>, "Longitude": <number, {cdp} dp>, "Latitude": <number, {cdp} dp>}}]"#,
        region = query.region.label(),
        year = window.start_year,
        occupation = query.occupation.label(),
        pdp = contract.percentage_dp,
        cdp = contract.coordinate_dp,
    );

    let table_rules = TABLE_SECTION_RULES
        .replace("{label}", contract.table_label())
        .replace("{header}", &contract.table_header())
        .replace("{separator}", &contract.table_separator());
    let dataframe_rules = DATAFRAME_SECTION_RULES
        .replace("{label}", contract.dataframe_label())
        .replace("{table_label}", contract.table_label())
        .replace("{example_json}", &example_json);

    contract
        .sections
        .iter()
        .zip(contract.section_notes.iter())
        .enumerate()
        .map(|(i, (label, note))| {
            let mut entry = format!("{}. **{label}** ({note})", i + 1);
            if *label == contract.table_label() {
                entry.push('\n');
                entry.push_str(&table_rules);
            } else if *label == contract.dataframe_label() {
                entry.push('\n');
                entry.push_str(&dataframe_rules);
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_considerations(contract: &PromptContract) -> String {
    contract
        .considerations
        .iter()
        .map(|(title, body)| format!("- **{title}**: {body}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::{Gender, OccupationType, Region};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn observation(year: i32, gender: Gender, pct: &str) -> HistoricalObservation {
        HistoricalObservation {
            region: "Wales".to_string(),
            year,
            gender,
            occupation_type: "2: professional occupations".to_string(),
            employment_percentage: Decimal::from_str(pct).unwrap(),
            margin_of_error_percentage: Decimal::from_str("0.505").unwrap(),
            longitude: Decimal::from_str("-3.17912345").unwrap(),
            latitude: Decimal::from_str("51.4816665").unwrap(),
        }
    }

    fn query(horizon: u32, hint: Option<&str>) -> ForecastQuery {
        ForecastQuery::new(
            Region::Wales,
            OccupationType::Professional,
            horizon,
            hint.map(str::to_string),
        )
        .unwrap()
    }

    fn history() -> Vec<HistoricalObservation> {
        vec![
            observation(2021, Gender::Male, "11.115"),
            observation(2022, Gender::Female, "12.125"),
            observation(2023, Gender::Male, "12.5"),
        ]
    }

    #[test]
    fn test_request_is_deterministic() {
        let hint = Some("Consider remote work");
        let a = build_forecast_request(&query(5, hint), &history()).unwrap();
        let b = build_forecast_request(&query(5, hint), &history()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_request_window_follows_history() {
        let request = build_forecast_request(&query(5, None), &history()).unwrap();
        assert_eq!(request.window.start_year, 2024);
        assert_eq!(request.window.end_year, 2028);
        assert!(request.text.contains("[2024, 2025, 2026, 2027, 2028]"));
        assert!(request.text.contains("5-year forecast (2024-2028)"));
    }

    #[test]
    fn test_request_without_history_uses_baseline() {
        let request = build_forecast_request(&query(2, None), &[]).unwrap();
        assert_eq!(request.window.start_year, 2024);
        assert_eq!(request.window.end_year, 2025);
        assert!(request
            .text
            .contains("Historical data for Wales (2: professional occupations):\n[]"));
    }

    #[test]
    fn test_history_is_rounded_half_to_even() {
        let request = build_forecast_request(&query(1, None), &history()).unwrap();
        assert!(request.text.contains("\"EmploymentPercentage\": 11.12"));
        assert!(request.text.contains("\"EmploymentPercentage\": 12.12"));
        assert!(request.text.contains("\"MarginofErrorPercentage\": 0.5"));
        assert!(request.text.contains("\"Longitude\": -3.179123"));
        assert!(request.text.contains("\"Latitude\": 51.481666"));
    }

    #[test]
    fn test_sections_appear_in_order() {
        let request = build_forecast_request(&query(3, None), &history()).unwrap();
        let positions: Vec<usize> = FORECAST_CONTRACT
            .sections
            .iter()
            .enumerate()
            .map(|(i, label)| {
                request
                    .text
                    .find(&format!("{}. **{label}**", i + 1))
                    .unwrap_or_else(|| panic!("missing section {label}"))
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_table_contract_is_spelled_out() {
        let request = build_forecast_request(&query(3, None), &history()).unwrap();
        assert!(request.text.contains(
            "| RegionName | Year | Gender | OccupationType | EmploymentPercentage | MarginofErrorPercentage | Longitude | Latitude |"
        ));
        assert!(request.text.contains("|---|---|---|---|---|---|---|---|"));
        assert!(request.text.contains("Round-Half-to-Even"));
        assert!(request.text.contains("ONLY a JSON array"));
    }

    #[test]
    fn test_hint_is_appended_verbatim_after_contract() {
        let hint = "Account for the {region} steel plant closure in 2025.";
        let request = build_forecast_request(&query(3, Some(hint)), &history()).unwrap();
        assert!(request.text.ends_with(hint));
        let contract_end = request.text.find("Margin of Error Interpretation").unwrap();
        assert!(request.text.find(hint).unwrap() > contract_end);
    }

    #[test]
    fn test_no_hint_leaves_no_guidance_block() {
        let request = build_forecast_request(&query(3, None), &history()).unwrap();
        assert!(!request.text.contains("additional information"));
    }
}
