use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightLeg {
    pub origin: String,
    pub destination: String,
    pub operating_carrier_code: String,
    pub flight_number: String,
    pub departure_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateMessage {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for DateMessage {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for DateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub origin: String,
    pub destination: String,
    pub operating_carrier_code: String,
    pub flight_number: u32,
    pub departure_date: DateMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEmissionsRequest {
    pub flights: Vec<Flight>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_emissions_inputs: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_emissions_breakdown: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypicalFlightEmissionsRequest {
    pub markets: Vec<Market>,
}

/// Grams as returned by the API; kilograms once a response has passed
/// through [`crate::transform`]. `None` means unknown for that class and is
/// never the same thing as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsPerPax {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_economy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<f64>,
}

impl EmissionsPerPax {
    pub fn is_empty(&self) -> bool {
        self.classes().iter().all(Option::is_none)
    }

    pub fn classes(&self) -> [Option<f64>; 4] {
        [self.economy, self.premium_economy, self.business, self.first]
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            economy: self.economy.map(&f),
            premium_economy: self.premium_economy.map(&f),
            business: self.business.map(&f),
            first: self.first.map(&f),
        }
    }

    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let both = |a: Option<f64>, b: Option<f64>| a.zip(b).map(|(a, b)| f(a, b));
        Self {
            economy: both(self.economy, other.economy),
            premium_economy: both(self.premium_economy, other.premium_economy),
            business: both(self.business, other.business),
            first: both(self.first, other.first),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionsBreakdown {
    #[serde(
        rename = "ttwEmissionsGramsPerPax",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ttw: Option<EmissionsPerPax>,
    #[serde(
        rename = "wttEmissionsGramsPerPax",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub wtt: Option<EmissionsPerPax>,
}

impl EmissionsBreakdown {
    pub fn is_empty(&self) -> bool {
        self.ttw.is_none() && self.wtt.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContrailsImpactBucket {
    #[serde(rename = "CONTRAILS_IMPACT_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "CONTRAILS_IMPACT_NEGLIGIBLE")]
    Negligible,
    #[serde(rename = "CONTRAILS_IMPACT_MODERATE")]
    Moderate,
    #[serde(rename = "CONTRAILS_IMPACT_SEVERE")]
    Severe,
    #[serde(other)]
    #[serde(rename = "CONTRAILS_IMPACT_UNRECOGNIZED")]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionsSource {
    #[serde(rename = "SOURCE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "TIM")]
    Tim,
    #[serde(rename = "EASA")]
    Easa,
    #[serde(other)]
    #[serde(rename = "SOURCE_UNRECOGNIZED")]
    Unrecognized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsInputEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_strategy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EasaLabelData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saf_discount_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsInputs {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub emissions_input_entries: BTreeMap<String, EmissionsInputEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easa_label_data: Option<EasaLabelData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEmissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight: Option<Flight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_grams_per_pax: Option<EmissionsPerPax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_breakdown: Option<EmissionsBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EmissionsSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrails_impact_bucket: Option<ContrailsImpactBucket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_inputs: Option<EmissionsInputs>,
}

impl FlightEmissions {
    pub fn saf_discount(&self) -> Option<f64> {
        self.emissions_inputs
            .as_ref()
            .and_then(|inputs| inputs.easa_label_data.as_ref())
            .and_then(|easa| easa.saf_discount_percentage)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypicalFlightEmissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<Market>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_grams_per_pax: Option<EmissionsPerPax>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
    #[serde(default)]
    pub patch: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dated: Option<String>,
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEmissionsResponse {
    #[serde(default)]
    pub flight_emissions: Vec<FlightEmissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<ModelVersion>,
}

impl FlightEmissionsResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_usable(&self) -> bool {
        self.flight_emissions
            .first()
            .is_some_and(|entry| entry.emissions_grams_per_pax.is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypicalFlightEmissionsResponse {
    #[serde(default)]
    pub typical_flight_emissions: Vec<TypicalFlightEmissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<ModelVersion>,
}

impl TypicalFlightEmissionsResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_usable(&self) -> bool {
        self.typical_flight_emissions
            .first()
            .is_some_and(|entry| entry.emissions_grams_per_pax.is_some())
    }
}
