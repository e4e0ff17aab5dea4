pub mod attribution;
pub mod calculator;
pub mod config;
pub mod error;
pub mod fetch;
pub mod itinerary;
pub mod logging;
pub mod mcp;
pub mod model;
pub mod proxy;
pub mod request;
pub mod table;
pub mod transform;
pub mod validate;

use serde::Serialize;
use url::Url;

use attribution::AttributionRow;
use calculator::Submission;
use error::EmissionsError;
use fetch::{EmissionsClient, EmissionsTransport};
use model::{FlightEmissionsResponse, FlightLeg, TypicalFlightEmissionsResponse};
use transform::{BreakdownTable, FormatMode};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightReport {
    pub flight: FlightEmissionsResponse,
    pub typical: TypicalFlightEmissionsResponse,
}

impl FlightReport {
    pub fn is_empty(&self) -> bool {
        self.flight.flight_emissions.is_empty()
    }

    pub fn passenger_table(&self, mode: FormatMode) -> Option<BreakdownTable> {
        let entry = self.flight.flight_emissions.first()?;
        let typical = self
            .typical
            .typical_flight_emissions
            .first()
            .and_then(|t| t.emissions_grams_per_pax.as_ref());
        transform::passenger_table(entry, typical, mode)
    }

    pub fn attribution(&self) -> Vec<AttributionRow> {
        self.flight
            .flight_emissions
            .first()
            .map(attribution::attribution_rows)
            .unwrap_or_default()
    }

    pub fn contrails(&self) -> &'static str {
        transform::contrails_label(
            self.flight
                .flight_emissions
                .first()
                .and_then(|e| e.contrails_impact_bucket),
        )
    }
}

pub async fn flight_emissions<T: EmissionsTransport>(
    client: &EmissionsClient<T>,
    leg: &FlightLeg,
) -> Result<FlightReport, EmissionsError> {
    let legs = std::slice::from_ref(leg);
    let submission = Submission {
        generation: 0,
        flight_request: request::flight_request(legs)?,
        typical_request: request::typical_request_for_first_leg(legs),
    };

    let outcome = calculator::fetch(client, &submission).await;
    Ok(FlightReport {
        flight: outcome.flight,
        typical: outcome.typical,
    })
}

pub async fn route_emissions<T: EmissionsTransport>(
    client: &EmissionsClient<T>,
    origin: &str,
    destination: &str,
) -> Result<TypicalFlightEmissionsResponse, EmissionsError> {
    let request = request::market_request(origin, destination)?;
    Ok(client.get_typical_flight_emissions(&request).await)
}

pub fn generate_calculator_url(base: &str, legs: &[FlightLeg]) -> Result<Url, EmissionsError> {
    let page = Url::parse(base)
        .map_err(|e| EmissionsError::Config(format!("invalid calculator URL \"{base}\": {e}")))?;
    Ok(itinerary::with_itinerary(&page, legs))
}
