use chrono::NaiveDate;

use crate::error::EmissionsError;
use crate::itinerary;
use crate::model::{
    DateMessage, Flight, FlightEmissionsRequest, FlightLeg, Market, TypicalFlightEmissionsRequest,
};
use crate::validate::{self, LegInput};

pub fn flight_to_wire(leg: &FlightLeg, today: NaiveDate) -> Result<Flight, EmissionsError> {
    let input = LegInput::from_leg(leg);
    if !input.is_valid_on(today) {
        return Err(EmissionsError::Validation(format!(
            "invalid flight {}: {}",
            itinerary::encode(std::slice::from_ref(leg)),
            input.problems_on(today).join(", ")
        )));
    }

    let leg = input.to_leg();
    let flight_number = leg.flight_number.parse::<u32>().map_err(|_| {
        EmissionsError::Validation(format!("flight number {} is out of range", leg.flight_number))
    })?;

    Ok(Flight {
        origin: leg.origin,
        destination: leg.destination,
        operating_carrier_code: leg.operating_carrier_code,
        flight_number,
        departure_date: DateMessage::from(leg.departure_date.unwrap_or(today)),
    })
}

pub fn flight_request(legs: &[FlightLeg]) -> Result<FlightEmissionsRequest, EmissionsError> {
    flight_request_on(legs, itinerary::today())
}

pub fn flight_request_on(
    legs: &[FlightLeg],
    today: NaiveDate,
) -> Result<FlightEmissionsRequest, EmissionsError> {
    if legs.is_empty() {
        return Err(EmissionsError::Validation(
            "at least one flight leg required".into(),
        ));
    }

    let flights = legs
        .iter()
        .map(|leg| flight_to_wire(leg, today))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FlightEmissionsRequest {
        flights,
        include_emissions_inputs: true,
        include_emissions_breakdown: true,
    })
}

pub fn typical_request(request: &FlightEmissionsRequest) -> TypicalFlightEmissionsRequest {
    TypicalFlightEmissionsRequest {
        markets: request
            .flights
            .iter()
            .map(|f| Market {
                origin: f.origin.clone(),
                destination: f.destination.clone(),
            })
            .collect(),
    }
}

/// Typical emissions are only looked up for the first leg of an itinerary.
pub fn typical_request_for_first_leg(
    legs: &[FlightLeg],
) -> Option<TypicalFlightEmissionsRequest> {
    let first = legs.first()?;
    let mut market = itinerary::market_from_leg(first);
    market.origin = market.origin.trim().to_ascii_uppercase();
    market.destination = market.destination.trim().to_ascii_uppercase();
    Some(TypicalFlightEmissionsRequest {
        markets: vec![market],
    })
}

pub fn market_request(
    origin: &str,
    destination: &str,
) -> Result<TypicalFlightEmissionsRequest, EmissionsError> {
    for code in [origin, destination] {
        if validate::airport_code_hint(Some(code)).is_some() {
            return Err(EmissionsError::InvalidAirport(code.to_string()));
        }
    }

    Ok(TypicalFlightEmissionsRequest {
        markets: vec![Market {
            origin: origin.to_ascii_uppercase(),
            destination: destination.to_ascii_uppercase(),
        }],
    })
}
