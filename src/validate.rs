use chrono::{Days, NaiveDate};

use crate::itinerary;
use crate::model::FlightLeg;

pub const AIRPORT_CODE_HINT: &str = "3-letter IATA airport code";
pub const CARRIER_CODE_HINT: &str = "2-character IATA airline code";
pub const FLIGHT_NUMBER_HINT: &str = "Numbers only";
pub const DATE_IN_PAST_HINT: &str = "Departure date should be in the future";
pub const DATE_TOO_FAR_HINT: &str = "Departure date cannot be more than a year in the future";

pub const MAX_DAYS_AHEAD: u64 = 365;

fn is_airport_code(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_carrier_code(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn is_flight_number(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn airport_code_hint(value: Option<&str>) -> Option<&'static str> {
    match value {
        Some(v) if is_airport_code(v) => None,
        _ => Some(AIRPORT_CODE_HINT),
    }
}

pub fn carrier_code_hint(value: Option<&str>) -> Option<&'static str> {
    match value {
        Some(v) if is_carrier_code(v) => None,
        _ => Some(CARRIER_CODE_HINT),
    }
}

/// An empty flight number has no hint; the row is still incomplete.
pub fn flight_number_hint(value: Option<&str>) -> Option<&'static str> {
    match value {
        Some(v) if !v.is_empty() && !is_flight_number(v) => Some(FLIGHT_NUMBER_HINT),
        _ => None,
    }
}

pub fn departure_date_hint(value: Option<NaiveDate>) -> Option<&'static str> {
    departure_date_hint_on(value, itinerary::today())
}

/// A missing date counts as `today`, so it never produces a hint.
pub fn departure_date_hint_on(value: Option<NaiveDate>, today: NaiveDate) -> Option<&'static str> {
    let date = value.unwrap_or(today);
    let latest = today.checked_add_days(Days::new(MAX_DAYS_AHEAD))?;

    if date < today {
        Some(DATE_IN_PAST_HINT)
    } else if date > latest {
        Some(DATE_TOO_FAR_HINT)
    } else {
        None
    }
}

pub fn is_airport_code_error(value: Option<&str>) -> bool {
    value.is_some_and(|v| !is_airport_code(v))
}

pub fn is_carrier_code_error(value: Option<&str>) -> bool {
    value.is_some_and(|v| !is_carrier_code(v))
}

pub fn is_flight_number_error(value: Option<&str>) -> bool {
    value.is_some_and(|v| !is_flight_number(v))
}

pub fn is_leg_valid(leg: &FlightLeg) -> bool {
    LegInput::from_leg(leg).is_valid()
}

pub fn is_leg_valid_on(leg: &FlightLeg, today: NaiveDate) -> bool {
    LegInput::from_leg(leg).is_valid_on(today)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegField {
    Origin,
    Destination,
    Carrier,
    FlightNumber,
}

impl LegField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Destination => "destination",
            Self::Carrier => "carrier code",
            Self::FlightNumber => "flight number",
        }
    }
}

/// Raw form state for one leg. `None` is "never touched", which is not the
/// same as an empty string the user typed and deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegInput {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub carrier: Option<String>,
    pub flight_number: Option<String>,
    pub departure_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegHints {
    pub origin: Option<&'static str>,
    pub destination: Option<&'static str>,
    pub carrier: Option<&'static str>,
    pub flight_number: Option<&'static str>,
    pub departure_date: Option<&'static str>,
}

impl LegHints {
    pub fn is_clear(&self) -> bool {
        self.iter().all(|(_, hint)| hint.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&'static str>)> {
        [
            (LegField::Origin.label(), self.origin),
            (LegField::Destination.label(), self.destination),
            (LegField::Carrier.label(), self.carrier),
            (LegField::FlightNumber.label(), self.flight_number),
            ("departure date", self.departure_date),
        ]
        .into_iter()
    }
}

impl LegInput {
    pub fn from_leg(leg: &FlightLeg) -> Self {
        Self {
            origin: Some(leg.origin.clone()),
            destination: Some(leg.destination.clone()),
            carrier: Some(leg.operating_carrier_code.clone()),
            flight_number: Some(leg.flight_number.clone()),
            departure_date: leg.departure_date,
        }
    }

    pub fn set(&mut self, field: LegField, value: &str) {
        let slot = match field {
            LegField::Origin => &mut self.origin,
            LegField::Destination => &mut self.destination,
            LegField::Carrier => &mut self.carrier,
            LegField::FlightNumber => &mut self.flight_number,
        };
        *slot = Some(value.to_string());
    }

    pub fn hints_on(&self, today: NaiveDate) -> LegHints {
        LegHints {
            origin: airport_code_hint(self.origin.as_deref()),
            destination: airport_code_hint(self.destination.as_deref()),
            carrier: carrier_code_hint(self.carrier.as_deref()),
            flight_number: flight_number_hint(self.flight_number.as_deref()),
            departure_date: departure_date_hint_on(self.departure_date, today),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_on(itinerary::today())
    }

    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        present(&self.origin)
            && present(&self.destination)
            && present(&self.carrier)
            && present(&self.flight_number)
            && self.hints_on(today).is_clear()
    }

    pub fn problems_on(&self, today: NaiveDate) -> Vec<String> {
        let mut problems: Vec<String> = self
            .hints_on(today)
            .iter()
            .filter_map(|(label, hint)| hint.map(|h| format!("{label}: {h}")))
            .collect();

        if self.flight_number.as_deref().unwrap_or_default().is_empty() {
            problems.push(format!("{}: required", LegField::FlightNumber.label()));
        }
        problems
    }

    pub fn to_leg(&self) -> FlightLeg {
        let upper = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_ascii_uppercase();

        FlightLeg {
            origin: upper(&self.origin),
            destination: upper(&self.destination),
            operating_carrier_code: upper(&self.carrier),
            flight_number: self
                .flight_number
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            departure_date: self.departure_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problems_name_the_failing_fields() {
        let input = LegInput {
            origin: Some("ZR".into()),
            destination: Some("BOS".into()),
            carrier: Some("LX".into()),
            flight_number: Some("".into()),
            departure_date: None,
        };
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let problems = input.problems_on(today);
        assert_eq!(
            problems,
            vec![
                "origin: 3-letter IATA airport code".to_string(),
                "flight number: required".to_string(),
            ]
        );
    }
}
