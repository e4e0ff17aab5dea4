use serde::Serialize;

use crate::model::{EmissionsInputEntry, EmissionsSource, FlightEmissions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub text: &'static str,
    pub href: &'static str,
    pub note: &'static str,
}

const fn cite(text: &'static str, href: &'static str, note: &'static str) -> Citation {
    Citation { text, href, note }
}

const EEA_REPORT: Citation = cite(
    "EEA Report",
    "https://www.eea.europa.eu/publications/emep-eea-guidebook-2019/part-b-sectoral-guidance-chapters/1-energy/1-a-combustion/1-a-3-a-aviation/view",
    "No 13/2019 1.A.3.a Aviation 1 Master emissions calculator 2019",
);
const EEA_2023_GUIDEBOOK: Citation = cite(
    "EMEP/EEA air pollutant emission inventory guidebook",
    "https://www.eea.europa.eu/publications/emep-eea-guidebook-2023/part-b-sectoral-guidance-chapters/1-energy/1-a-combustion/1-a-3-a-aviation.3/view",
    "2023 Annex 1",
);
const CORSIA: Citation = cite(
    "CORSIA",
    "https://www.icao.int/environmental-protection/CORSIA/Documents/CORSIA_Eligible_Fuels/CORSIA_Supporting_Document_CORSIA%20Eligible%20Fuels_LCA_Methodology_V5.pdf",
    "Eligible Fuels Life Cycle Assessment Methodology",
);
const ISO_14083: Citation = cite("ISO 14083", "https://www.iso.org/standard/78864.html", "");
const BTS: Citation = cite(
    "U.S. Department of Transportation Bureau of Transportation Statistics",
    "https://www.bts.gov/airline-data-downloads",
    "",
);
const CH_AVIATION: Citation = cite("ch-aviation", "https://www.ch-aviation.com/", "");
const US_LOAD_FACTOR: Citation = cite(
    "Derived from historical data for the U.S.",
    "https://fred.stlouisfed.org/series/LOADFACTOR",
    "from 2019",
);
const SCHEDULES_CONFIG: Citation = cite(
    "OAG",
    "https://oag.com/",
    "Aircraft Configuration/Version (ACV) from published flight schedules (OAG, Innovata and individual airlines)",
);
const FLEET_CONFIG: Citation = cite(
    "OAG",
    "https://oag.com/",
    "Fleet-level aircraft configuration from the \"Seats (Equipment Configuration) File\"",
);
const IATA_RP_1726: Citation = cite(
    "IATA RP 1726",
    "https://www.iata.org/en/programs/environment/passenger-emissions-methodology/",
    "",
);
const EASA_LABEL: Citation = cite("EASA Environmental Label", "https://www.flightemissions.eu/", "");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionCategory {
    FuelBurn,
    LoadFactor,
    CargoMassFraction,
    SeatsPerClass,
}

impl AttributionCategory {
    pub const ALL: [Self; 4] = [
        Self::FuelBurn,
        Self::LoadFactor,
        Self::CargoMassFraction,
        Self::SeatsPerClass,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "totalFuelBurnEstimatedKg" => Some(Self::FuelBurn),
            "loadFactor" => Some(Self::LoadFactor),
            "cargoMassFraction" => Some(Self::CargoMassFraction),
            "seatsPerClass" => Some(Self::SeatsPerClass),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::FuelBurn => "totalFuelBurnEstimatedKg",
            Self::LoadFactor => "loadFactor",
            Self::CargoMassFraction => "cargoMassFraction",
            Self::SeatsPerClass => "seatsPerClass",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::FuelBurn => "Fuel Burn Estimates",
            Self::LoadFactor => "Passenger Load Factor",
            Self::CargoMassFraction => "Cargo Mass Fraction",
            Self::SeatsPerClass => "Passenger Seat Configuration",
        }
    }

    pub fn citations(self, entry: &EmissionsInputEntry) -> Vec<Citation> {
        let source = entry.data_source.as_deref().unwrap_or_default();
        match (self, source) {
            (Self::FuelBurn, "EEA") => {
                let mut citations = vec![EEA_REPORT];
                if entry.data_strategy.as_deref() == Some("EEA2023_CORRECTION_FACTOR") {
                    citations.push(EEA_2023_GUIDEBOOK);
                }
                citations.extend([CORSIA, ISO_14083]);
                citations
            }
            (Self::LoadFactor, "T100") | (Self::CargoMassFraction, "T100") => vec![BTS],
            (Self::LoadFactor, "CH_AVIATION") => vec![CH_AVIATION],
            (Self::LoadFactor, "GLOBAL_DEFAULT") => vec![US_LOAD_FACTOR],
            (Self::SeatsPerClass, "OPERATING_CARRIER_CONFIG") => vec![SCHEDULES_CONFIG],
            (Self::SeatsPerClass, "OAG_SEATS_EQUIPMENT_CONFIG") => vec![FLEET_CONFIG],
            (Self::SeatsPerClass, "REFERENCE_CONFIG") => vec![SCHEDULES_CONFIG, FLEET_CONFIG],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionRow {
    pub title: &'static str,
    pub citations: Vec<Citation>,
}

pub const ATTRIBUTION_HEADERS: [&str; 2] = ["Data Type", "Source"];

/// Data sources behind one flight's estimate.
pub fn attribution_rows(entry: &FlightEmissions) -> Vec<AttributionRow> {
    if entry.source == Some(EmissionsSource::Easa) {
        return match entry.saf_discount() {
            Some(_) => vec![AttributionRow {
                title: AttributionCategory::FuelBurn.title(),
                citations: vec![EASA_LABEL],
            }],
            None => Vec::new(),
        };
    }

    let entries = match entry.emissions_inputs.as_ref() {
        Some(inputs) if !inputs.emissions_input_entries.is_empty() => {
            &inputs.emissions_input_entries
        }
        _ => return Vec::new(),
    };

    let mut rows: Vec<AttributionRow> = AttributionCategory::ALL
        .iter()
        .filter_map(|&category| {
            let citations = category.citations(entries.get(category.key())?);
            (!citations.is_empty()).then_some(AttributionRow {
                title: category.title(),
                citations,
            })
        })
        .collect();

    rows.push(AttributionRow {
        title: "Seat Area Ratios",
        citations: vec![IATA_RP_1726],
    });
    rows
}
