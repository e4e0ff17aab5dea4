use chrono::NaiveDate;
use tracing::debug;
use url::Url;

use crate::fetch::{EmissionsClient, EmissionsTransport};
use crate::itinerary;
use crate::model::{
    FlightEmissionsRequest, FlightEmissionsResponse, FlightLeg, ModelVersion,
    TypicalFlightEmissionsRequest, TypicalFlightEmissionsResponse,
};
use crate::request;
use crate::validate::{LegField, LegHints, LegInput};

pub const FLIGHT_NOT_FOUND_MESSAGE: &str =
    "We could not find this flight. Please check the flight info and try again.";
pub const CODE_SHARE_NOTE: &str = "(Note that code shares are not supported.)";
pub const ROUTE_NOT_FOUND_MESSAGE: &str =
    "We could not find this route. Please check the route info and try again.";
pub const LATEST_MODEL_VERSION_ADVISORY: &str = "This data is using the latest model version.";

#[derive(Debug, Clone, PartialEq)]
pub struct LegLink {
    pub leg: FlightLeg,
    pub title: String,
    pub subtitle: String,
    pub href: Url,
}

impl LegLink {
    pub fn new(page: &Url, leg: &FlightLeg, today: NaiveDate) -> Self {
        let departing = leg.departure_date.unwrap_or(today).format("%a, %b %-d, %Y");
        Self {
            leg: leg.clone(),
            title: format!("{} to {}", leg.origin, leg.destination),
            subtitle: format!(
                "{}{} · Departing {departing}",
                leg.operating_carrier_code, leg.flight_number
            ),
            href: itinerary::with_itinerary(page, std::slice::from_ref(leg)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculatorState {
    Empty,
    SingleLeg(LegInput),
    MultiLeg(Vec<LegLink>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub generation: u64,
    pub flight_request: FlightEmissionsRequest,
    pub typical_request: Option<TypicalFlightEmissionsRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub generation: u64,
    pub flight: FlightEmissionsResponse,
    pub typical: TypicalFlightEmissionsResponse,
}

/// Runs both lookups for a submission concurrently. Neither waits on the
/// other's success; a failed lookup just yields its empty response.
pub async fn fetch<T: EmissionsTransport>(
    client: &EmissionsClient<T>,
    submission: &Submission,
) -> FetchOutcome {
    let typical = async {
        match &submission.typical_request {
            Some(req) => client.get_typical_flight_emissions(req).await,
            None => TypicalFlightEmissionsResponse::empty(),
        }
    };
    let (flight, typical) = tokio::join!(
        client.get_flight_emissions(&submission.flight_request),
        typical
    );

    FetchOutcome {
        generation: submission.generation,
        flight,
        typical,
    }
}

pub fn model_version_advisory(
    hint: Option<&str>,
    fetched: Option<&ModelVersion>,
) -> Option<&'static str> {
    let hint = hint.filter(|h| !h.is_empty())?;
    match fetched {
        Some(version) if version.to_string() == hint => None,
        _ => Some(LATEST_MODEL_VERSION_ADVISORY),
    }
}

pub fn model_version_footer(version: Option<&ModelVersion>) -> Option<String> {
    version.map(|v| format!("Model Version: {v}"))
}

// Every submission bumps `generation`; results stamped with an older one are dropped.
#[derive(Debug, Clone)]
pub struct Calculator {
    url: Url,
    today: NaiveDate,
    state: CalculatorState,
    generation: u64,
    flight: Option<FlightEmissionsResponse>,
    typical: Option<TypicalFlightEmissionsResponse>,
}

impl Calculator {
    pub fn from_url(url: Url) -> Self {
        Self::from_url_on(url, itinerary::today())
    }

    pub fn from_url_on(url: Url, today: NaiveDate) -> Self {
        let state = derive_state(&url, today);
        Self {
            url,
            today,
            state,
            generation: 0,
            flight: None,
            typical: None,
        }
    }

    pub fn load(&mut self) -> Option<Submission> {
        self.start_submission()
    }

    pub fn navigate(&mut self, url: Url) -> Option<Submission> {
        self.state = derive_state(&url, self.today);
        self.url = url;
        self.generation += 1;
        self.flight = None;
        self.typical = None;
        self.start_submission()
    }

    pub fn edit(&mut self, field: LegField, value: &str) -> Option<Submission> {
        self.single_leg_mut()?.set(field, value);
        self.submit()
    }

    pub fn set_departure_date(&mut self, date: NaiveDate) -> Option<Submission> {
        self.single_leg_mut()?.departure_date = Some(date);
        self.submit()
    }

    pub fn submit(&mut self) -> Option<Submission> {
        let leg = match &self.state {
            CalculatorState::SingleLeg(input) if input.is_valid_on(self.today) => input.to_leg(),
            _ => return None,
        };

        self.url = itinerary::with_itinerary(&self.url, std::slice::from_ref(&leg));
        self.generation += 1;
        self.flight = None;
        self.typical = None;
        self.build_submission(&leg)
    }

    pub fn apply_flight(&mut self, generation: u64, response: FlightEmissionsResponse) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale flight emissions");
            return false;
        }
        self.flight = Some(response);
        true
    }

    pub fn apply_typical(
        &mut self,
        generation: u64,
        response: TypicalFlightEmissionsResponse,
    ) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale typical emissions");
            return false;
        }
        self.typical = Some(response);
        true
    }

    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        let flight = self.apply_flight(outcome.generation, outcome.flight);
        let typical = self.apply_typical(outcome.generation, outcome.typical);
        flight && typical
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hints(&self) -> Option<LegHints> {
        match &self.state {
            CalculatorState::SingleLeg(input) => Some(input.hints_on(self.today)),
            _ => None,
        }
    }

    pub fn flight_result(&self) -> Option<&FlightEmissionsResponse> {
        self.flight.as_ref()
    }

    pub fn typical_result(&self) -> Option<&TypicalFlightEmissionsResponse> {
        self.typical.as_ref()
    }

    pub fn empty_result_message(&self) -> Option<&'static str> {
        self.flight
            .as_ref()
            .filter(|r| r.flight_emissions.is_empty())
            .map(|_| FLIGHT_NOT_FOUND_MESSAGE)
    }

    pub fn model_version_advisory(&self) -> Option<&'static str> {
        let fetched = self.flight.as_ref()?;
        let hint = itinerary::model_version_from_url(&self.url);
        model_version_advisory(hint.as_deref(), fetched.model_version.as_ref())
    }

    pub fn model_version_footer(&self) -> Option<String> {
        model_version_footer(self.flight.as_ref()?.model_version.as_ref())
    }

    fn single_leg_mut(&mut self) -> Option<&mut LegInput> {
        if self.state == CalculatorState::Empty {
            self.state = CalculatorState::SingleLeg(LegInput::default());
        }
        match &mut self.state {
            CalculatorState::SingleLeg(input) => Some(input),
            _ => None,
        }
    }

    fn start_submission(&mut self) -> Option<Submission> {
        let leg = match &self.state {
            CalculatorState::SingleLeg(input) if input.is_valid_on(self.today) => input.to_leg(),
            _ => return None,
        };
        self.build_submission(&leg)
    }

    fn build_submission(&self, leg: &FlightLeg) -> Option<Submission> {
        let legs = std::slice::from_ref(leg);
        let flight_request = match request::flight_request_on(legs, self.today) {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, "leg passed validation but could not be sent");
                return None;
            }
        };

        Some(Submission {
            generation: self.generation,
            flight_request,
            typical_request: request::typical_request_for_first_leg(legs),
        })
    }
}

fn derive_state(url: &Url, today: NaiveDate) -> CalculatorState {
    let legs = itinerary::itinerary_from_url(url)
        .map(|token| itinerary::decode_on(&token, today))
        .unwrap_or_default();

    match legs.as_slice() {
        [] => CalculatorState::Empty,
        [leg] => CalculatorState::SingleLeg(LegInput::from_leg(leg)),
        _ => CalculatorState::MultiLeg(legs.iter().map(|leg| LegLink::new(url, leg, today)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_needs_a_hint() {
        let version = ModelVersion {
            major: 2,
            ..Default::default()
        };
        assert_eq!(model_version_advisory(None, Some(&version)), None);
        assert_eq!(model_version_advisory(Some("2.0.0"), Some(&version)), None);
        assert_eq!(
            model_version_advisory(Some("1.9.0"), Some(&version)),
            Some(LATEST_MODEL_VERSION_ADVISORY)
        );
        assert_eq!(
            model_version_advisory(Some("1.9.0"), None),
            Some(LATEST_MODEL_VERSION_ADVISORY)
        );
    }
}
