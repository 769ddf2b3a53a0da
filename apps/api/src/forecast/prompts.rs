// Output contract for the forecast prompt.
// Section labels are matched by the reader of the reply, so they are reproduced
// verbatim by the model and must not be reworded here without updating the parser.

use crate::forecast::precision::{COORDINATE_DP, PERCENTAGE_DP};

/// Canonical DataFrame Output keys, in column order.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    "RegionName",
    "Year",
    "Gender",
    "OccupationType",
    "EmploymentPercentage",
    "MarginofErrorPercentage",
    "Longitude",
    "Latitude",
];

/// Everything the model is told about the shape of its reply.
#[derive(Debug, Clone, Copy)]
pub struct PromptContract {
    /// Five labeled sections, in order. The last one is JSON-only.
    pub sections: [&'static str; 5],
    pub section_notes: [&'static str; 5],
    pub rounding_policy: &'static str,
    pub percentage_dp: u32,
    pub coordinate_dp: u32,
    pub columns: [&'static str; 8],
    pub margin_of_error_rule: &'static str,
    pub allowed_genders: [&'static str; 2],
    pub considerations: [(&'static str, &'static str); 4],
}

pub const FORECAST_CONTRACT: PromptContract = PromptContract {
    sections: [
        "Data Preprocessing Details",
        "Error-Aware Forecasting",
        "Trend Analysis & Forecasting Method",
        "Final Forecast Table",
        "DataFrame Output",
    ],
    section_notes: [
        "symmetric rounding, missing value handling, precision constraints",
        "margin of error calculations",
        "linear trend analysis with yearly changes computed separately for males and females",
        "a single Markdown table and nothing else",
        "a single JSON array and nothing else",
    ],
    rounding_policy: "Round-Half-to-Even (banker's rounding)",
    percentage_dp: PERCENTAGE_DP,
    coordinate_dp: COORDINATE_DP,
    columns: CANONICAL_COLUMNS,
    margin_of_error_rule:
        "Avg Margin of Error = sum(previous margins of error) / number of years",
    allowed_genders: ["Male", "Female"],
    considerations: [
        (
            "Data Limitations",
            "Forecast accuracy depends on available historical data.",
        ),
        (
            "Linearity Assumption",
            "Trends may be influenced by external factors.",
        ),
        (
            "Occupation & Region Specificity",
            "Results should not be generalized.",
        ),
        (
            "Margin of Error Interpretation",
            "The constant margin of error assumption should be used cautiously.",
        ),
    ],
};

impl PromptContract {
    pub fn table_label(&self) -> &'static str {
        self.sections[3]
    }

    pub fn dataframe_label(&self) -> &'static str {
        self.sections[4]
    }

    /// `| RegionName | Year | ... | Latitude |`
    pub fn table_header(&self) -> String {
        format!("| {} |", self.columns.join(" | "))
    }

    /// `|---|---|...|` with one cell per column.
    pub fn table_separator(&self) -> String {
        format!("|{}", "---|".repeat(self.columns.len()))
    }
}

/// Forecast prompt template.
/// Replace: {columns}, {horizon}, {start_year}, {end_year}, {region}, {occupation},
///          {history_json}, {years}, {rounding_policy}, {percentage_dp},
///          {coordinate_dp}, {margin_rule}, {genders}, {sections}, {considerations}
pub const FORECAST_PROMPT_TEMPLATE: &str = r#"Analyze employment data with columns [{columns}] to predict employment trends for {horizon} years starting from {start_year}.

Historical data for {region} ({occupation}):
{history_json}

Follow this protocol:
1. Generate one prediction per year and per gender for {years}.

2. **Data Preprocessing**
- Apply symmetric rounding ({rounding_policy}) for all values.
- Handle missing values via seasonal-trend decomposition.
- Enforce precision constraints:
  - EmploymentPercentage: {percentage_dp} decimal places.
  - MarginofErrorPercentage: {percentage_dp} decimal places.
  - Longitude and Latitude: {coordinate_dp} decimal places.

3. **Error-Aware Forecasting**
- Estimate the margin of error percentage as the average of past values:
  {margin_rule}.

Final output must follow these constraints:
- EmploymentPercentage rounded using {rounding_policy}.
- MarginofErrorPercentage displayed with {percentage_dp} decimal precision.
- Fixed {coordinate_dp}-decimal geocoordinates.
- Gender must be {genders}.

Begin your answer with exactly this sentence:
"I will analyze the provided employment data for {region} ({occupation}) and generate a {horizon}-year forecast ({start_year}-{end_year}) following the specified protocol."

The forecast must contain the following sections, in this order.
The section headings must be exactly the same as written here.
{sections}

Additionally, highlight key considerations:
{considerations}"#;

/// Section 4 body rules. Replace: {label}, {header}, {separator}.
pub const TABLE_SECTION_RULES: &str = r#"   This section must contain ONLY a Markdown table with the header row
   {header}
   followed by the separator row
   {separator}
   and one row per forecast entry. Columns are separated by pipes (|) and rows by new lines.
   No other text may be included in the "{label}" section."#;

/// Section 5 body rules. Replace: {label}, {table_label}, {example_json}.
pub const DATAFRAME_SECTION_RULES: &str = r#"   The "{label}" section must contain ONLY a JSON array of objects, one per row of the
   "{table_label}", using exactly these keys and value types:
   {example_json}
   No other text, headers, code fences or formatting symbols are allowed in this section."#;

/// Appended only when the caller supplied a hint. Replace: {hint}.
pub const HINT_TEMPLATE: &str = r#"

Use the following additional information as supplementary guidance. It does not change the required sections or formats above:
{hint}"#;
