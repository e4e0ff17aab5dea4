use serde::Serialize;

use crate::model::{
    ContrailsImpactBucket, EmissionsBreakdown, EmissionsPerPax, EmissionsSource, FlightEmissions,
    FlightEmissionsResponse, TypicalFlightEmissionsResponse,
};

pub const MISSING_VALUE: &str = "XX";
pub const PASSENGER_TABLE_HEADERS: [&str; 5] = ["Type", "Economy", "Premium", "Business", "First"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatMode {
    #[default]
    Precise,
    Coarse,
}

pub fn grams_to_kilograms(value: Option<f64>) -> Option<f64> {
    value.map(|grams| grams / 1000.0)
}

pub fn per_pax_to_kilograms(per_pax: &EmissionsPerPax) -> EmissionsPerPax {
    per_pax.map(|grams| grams / 1000.0)
}

fn breakdown_to_kilograms(breakdown: &EmissionsBreakdown) -> EmissionsBreakdown {
    EmissionsBreakdown {
        ttw: breakdown.ttw.as_ref().map(per_pax_to_kilograms),
        wtt: breakdown.wtt.as_ref().map(per_pax_to_kilograms),
    }
}

pub fn flight_response_to_kilograms(mut response: FlightEmissionsResponse) -> FlightEmissionsResponse {
    for entry in &mut response.flight_emissions {
        entry.emissions_grams_per_pax = entry.emissions_grams_per_pax.as_ref().map(per_pax_to_kilograms);
        entry.emissions_breakdown = entry.emissions_breakdown.as_ref().map(breakdown_to_kilograms);
    }
    response
}

pub fn typical_response_to_kilograms(
    mut response: TypicalFlightEmissionsResponse,
) -> TypicalFlightEmissionsResponse {
    for entry in &mut response.typical_flight_emissions {
        entry.emissions_grams_per_pax = entry.emissions_grams_per_pax.as_ref().map(per_pax_to_kilograms);
    }
    response
}

pub fn well_to_wake(breakdown: &EmissionsBreakdown) -> EmissionsPerPax {
    match (&breakdown.ttw, &breakdown.wtt) {
        (Some(ttw), Some(wtt)) => ttw.zip_with(wtt, |ttw, wtt| ttw + wtt),
        _ => EmissionsPerPax::default(),
    }
}

fn clamp_discount(discount: f64) -> f64 {
    if discount.is_nan() {
        0.0
    } else {
        discount.clamp(0.0, 1.0)
    }
}

pub fn saf_reduction(base: &EmissionsPerPax, discount: f64) -> EmissionsPerPax {
    let d = clamp_discount(discount);
    base.map(|v| v * -d)
}

pub fn total_with_saf(base: &EmissionsPerPax, discount: f64) -> EmissionsPerPax {
    let d = clamp_discount(discount);
    base.map(|v| v * (1.0 - d))
}

// Half rounds up, like the web calculator; also folds -0 into 0.
fn round_half_up(value: f64) -> f64 {
    let rounded = (value + 0.5).floor();
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn format_value(value: Option<f64>, mode: FormatMode) -> String {
    match (value, mode) {
        (Some(v), FormatMode::Precise) => format!("{:.1}", round_half_up(v * 10.0) / 10.0),
        (Some(v), FormatMode::Coarse) => format!("{} kg", round_half_up(v)),
        (None, FormatMode::Precise) => MISSING_VALUE.to_string(),
        (None, FormatMode::Coarse) => format!("{MISSING_VALUE} kg"),
    }
}

pub fn format_per_pax(per_pax: Option<&EmissionsPerPax>, mode: FormatMode) -> [String; 4] {
    let classes = per_pax.map(EmissionsPerPax::classes).unwrap_or_default();
    classes.map(|v| format_value(v, mode))
}

pub fn contrails_label(bucket: Option<ContrailsImpactBucket>) -> &'static str {
    match bucket {
        Some(ContrailsImpactBucket::Negligible) => "Low",
        Some(ContrailsImpactBucket::Moderate) => "Medium",
        Some(ContrailsImpactBucket::Severe) => "High",
        Some(ContrailsImpactBucket::Unspecified)
        | Some(ContrailsImpactBucket::Unrecognized)
        | None => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub label: String,
    pub cells: [String; 4],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BreakdownRow>,
    pub muted: bool,
}

impl BreakdownRow {
    pub fn new(label: &str, per_pax: Option<&EmissionsPerPax>, mode: FormatMode) -> Self {
        Self {
            label: label.to_string(),
            cells: format_per_pax(per_pax, mode),
            children: Vec::new(),
            muted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownTable {
    pub headers: [&'static str; 5],
    pub rows: Vec<BreakdownRow>,
}

fn non_empty(per_pax: Option<&EmissionsPerPax>) -> Option<&EmissionsPerPax> {
    per_pax.filter(|p| !p.is_empty())
}

/// `None` unless the flight has both a total (given or derivable) and a breakdown.
pub fn passenger_table(
    entry: &FlightEmissions,
    typical: Option<&EmissionsPerPax>,
    mode: FormatMode,
) -> Option<BreakdownTable> {
    let breakdown = entry.emissions_breakdown.as_ref().filter(|b| !b.is_empty())?;
    let wtw = match non_empty(entry.emissions_grams_per_pax.as_ref()) {
        Some(given) => *given,
        None => well_to_wake(breakdown),
    };
    if wtw.is_empty() {
        return None;
    }

    let mut total = BreakdownRow::new("Well-to-Wake", Some(&wtw), mode);
    total.children = vec![
        BreakdownRow::new("Tank-to-Wake", breakdown.ttw.as_ref(), mode),
        BreakdownRow::new("Well-to-Tank", breakdown.wtt.as_ref(), mode),
    ];

    let mut rows = vec![total];

    if entry.source == Some(EmissionsSource::Easa) {
        if let Some(discount) = entry.saf_discount() {
            rows.push(BreakdownRow::new(
                "SAF reduction",
                Some(&saf_reduction(&wtw, discount)),
                mode,
            ));
            rows.push(BreakdownRow::new(
                "Total incl. SAF",
                Some(&total_with_saf(&wtw, discount)),
                mode,
            ));
        }
    }

    if let Some(typical) = non_empty(typical) {
        let mut row = BreakdownRow::new("Typical", Some(typical), mode);
        row.muted = true;
        rows.push(row);
    }

    Some(BreakdownTable {
        headers: PASSENGER_TABLE_HEADERS,
        rows,
    })
}

pub fn route_table(typical: &EmissionsPerPax, mode: FormatMode) -> Option<BreakdownTable> {
    let typical = non_empty(Some(typical))?;
    Some(BreakdownTable {
        headers: PASSENGER_TABLE_HEADERS,
        rows: vec![BreakdownRow::new("Typical", Some(typical), mode)],
    })
}
