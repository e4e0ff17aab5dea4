use std::collections::BTreeMap;

use chrono::NaiveDate;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::warn;

use crate::config::DEFAULT_CALCULATOR_URL;
use crate::error::EmissionsError;
use crate::fetch::{EmissionsClient, Transport};
use crate::model::{FlightLeg, TypicalFlightEmissionsResponse};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct FlightArgs {
    #[schemars(description = "Departure airport IATA code, exactly 3 letters. Example: ZRH, JFK")]
    origin: String,
    #[schemars(description = "Arrival airport IATA code, exactly 3 letters. Example: BOS")]
    destination: String,
    #[schemars(description = "Operating carrier IATA code, 2 characters. Example: LX, BA")]
    carrier: String,
    #[schemars(description = "Flight number, digits only. Example: 54")]
    flight_number: String,
    #[schemars(
        description = "Departure date in YYYY-MM-DD format, within the next year. Default: today"
    )]
    date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RouteArgs {
    #[schemars(description = "Departure airport IATA code, exactly 3 letters. Example: ZRH")]
    origin: String,
    #[schemars(
        description = "Arrival airport IATA code(s). Comma-separate to compare routes. Examples: BOS or BOS,JFK,ORD"
    )]
    destination: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UrlArgs {
    #[schemars(
        description = "Itinerary token: legs joined by ',', each ORIGIN-DESTINATION-CARRIER-NUMBER-YYYYMMDD. Example: ZRH-BOS-LX-54-20261101"
    )]
    itinerary: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct OpenUrlArgs {
    #[schemars(description = "URL to open. Must start with http:// or https://")]
    url: String,
}

fn parse_date(date: Option<&str>) -> Result<Option<NaiveDate>, String> {
    date.map(|d| {
        NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("invalid date \"{d}\", expected YYYY-MM-DD"))
    })
    .transpose()
}

fn leg_from_args(args: &FlightArgs) -> Result<FlightLeg, String> {
    Ok(FlightLeg {
        origin: args.origin.trim().to_uppercase(),
        destination: args.destination.trim().to_uppercase(),
        operating_carrier_code: args.carrier.trim().to_uppercase(),
        flight_number: args.flight_number.trim().to_string(),
        departure_date: parse_date(args.date.as_deref())?,
    })
}

fn tool_error(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.into())]))
}

fn tool_json(value: &impl serde::Serialize) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
        Err(e) => tool_error(format!("failed to encode result: {e}")),
    }
}

#[derive(Clone)]
struct TimMcp {
    client: EmissionsClient<Transport>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TimMcp {
    fn new(client: EmissionsClient<Transport>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Estimate CO2e emissions per passenger for one specific flight, in kilograms, for each cabin class. Returns the flight-level estimate (well-to-wake total with tank-to-wake and well-to-tank breakdown, contrails impact, data sources) alongside the typical emissions for the same route. Empty results mean the flight was not found; code shares are not supported."
    )]
    async fn tim_flight_emissions(
        &self,
        Parameters(args): Parameters<FlightArgs>,
    ) -> Result<CallToolResult, McpError> {
        let leg = match leg_from_args(&args) {
            Ok(leg) => leg,
            Err(e) => return tool_error(e),
        };

        match crate::flight_emissions(&self.client, &leg).await {
            Ok(report) if report.is_empty() => tool_error(crate::calculator::FLIGHT_NOT_FOUND_MESSAGE),
            Ok(report) => tool_json(&report),
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(
        description = "Estimate typical CO2e emissions per passenger for a route (origin and destination only, no specific flight), in kilograms per cabin class. Comma-separate destinations to compare several routes from the same origin."
    )]
    async fn tim_typical_emissions(
        &self,
        Parameters(args): Parameters<RouteArgs>,
    ) -> Result<CallToolResult, McpError> {
        let origin = args.origin.trim().to_uppercase();
        let destinations: Vec<String> = args
            .destination
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        if destinations.len() == 1 {
            return match crate::route_emissions(&self.client, &origin, &destinations[0]).await {
                Ok(result) if result.typical_flight_emissions.is_empty() => {
                    tool_error(crate::calculator::ROUTE_NOT_FOUND_MESSAGE)
                }
                Ok(result) => tool_json(&result),
                Err(e) => tool_error(e.to_string()),
            };
        }

        let mut join_set = JoinSet::new();
        for dest in destinations {
            let client = self.client.clone();
            let origin = origin.clone();
            join_set.spawn(async move {
                let result = crate::route_emissions(&client, &origin, &dest).await;
                (dest, result)
            });
        }

        let mut results: BTreeMap<String, TypicalFlightEmissionsResponse> = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            let (dest, result) = match joined {
                Ok(pair) => pair,
                Err(e) => return tool_error(format!("lookup task failed: {e}")),
            };
            match result {
                Ok(response) => {
                    results.insert(dest, response);
                }
                Err(e) => {
                    warn!(%dest, error = %e, "skipping route");
                    results.insert(dest, TypicalFlightEmissionsResponse::empty());
                }
            }
        }

        tool_json(&results)
    }

    #[tool(
        description = "Build the Travel Impact Model calculator URL for an itinerary token. Single-leg itineraries open the emissions calculator for that flight; multi-leg itineraries open a summary with links to each leg."
    )]
    async fn tim_calculator_url(
        &self,
        Parameters(args): Parameters<UrlArgs>,
    ) -> Result<CallToolResult, McpError> {
        let legs = crate::itinerary::decode(&args.itinerary);
        if legs.is_empty() {
            return tool_error("itinerary is empty");
        }

        match crate::generate_calculator_url(DEFAULT_CALCULATOR_URL, &legs) {
            Ok(url) => Ok(CallToolResult::success(vec![Content::text(url.to_string())])),
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(description = "Open a URL in the default web browser. To open the calculator, call tim_calculator_url first and pass the URL it returns.")]
    async fn open_url(
        &self,
        Parameters(args): Parameters<OpenUrlArgs>,
    ) -> Result<CallToolResult, McpError> {
        if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
            return tool_error("URL must start with http:// or https://");
        }
        match open::that(&args.url) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Opened: {}",
                args.url
            ))])),
            Err(e) => tool_error(format!("failed to open browser: {e}")),
        }
    }
}

#[tool_handler]
impl ServerHandler for TimMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "tim-calc".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Flight emissions estimates from the Travel Impact Model. Use tim_flight_emissions for a specific flight and tim_typical_emissions for a route. All values are kilograms CO2e per passenger. To open the web calculator: call tim_calculator_url, then open_url with the result.".into(),
            ),
        }
    }
}

pub async fn run(client: EmissionsClient<Transport>) -> Result<(), EmissionsError> {
    let service = TimMcp::new(client)
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| EmissionsError::Io(std::io::Error::other(e.to_string())))?;
    service
        .waiting()
        .await
        .map_err(|e| EmissionsError::Io(std::io::Error::other(e.to_string())))?;
    Ok(())
}
