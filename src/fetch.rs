use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use wreq::Client;

use crate::config::{Config, DataSource, FixtureSet};
use crate::error::{self, EmissionsError};
use crate::model::{
    FlightEmissionsRequest, FlightEmissionsResponse, TypicalFlightEmissionsRequest,
    TypicalFlightEmissionsResponse,
};
use crate::transform;

pub const FLIGHT_EMISSIONS_METHOD: &str = "computeFlightEmissions";
pub const TYPICAL_FLIGHT_EMISSIONS_METHOD: &str = "computeTypicalFlightEmissions";

const FLIGHT_FIXTURE: &str = include_str!("../fixtures/flight_emissions.json");
const FLIGHT_EASA_FIXTURE: &str = include_str!("../fixtures/flight_emissions_easa.json");
const TYPICAL_FIXTURE: &str = include_str!("../fixtures/typical_flight_emissions.json");

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub http_proxy: Option<String>,
    pub timeout: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            http_proxy: None,
            timeout: crate::config::DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn build_client(options: &FetchOptions) -> Result<Client, EmissionsError> {
    let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout));

    if let Some(ref proxy) = options.http_proxy {
        builder = builder.proxy(wreq::Proxy::all(proxy).map_err(error::from_http_error)?);
    }

    builder.build().map_err(error::from_http_error)
}

async fn post_json<B, R>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    body: &B,
) -> Result<R, EmissionsError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let payload = serde_json::to_vec(body).map_err(|e| EmissionsError::Decode(e.to_string()))?;

    debug!(%url, bytes = payload.len(), "posting emissions request");
    let response = client
        .post(url)
        .query(query)
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .map_err(error::from_http_error)?;

    let status = response.status().as_u16();
    if status >= 400 {
        return Err(EmissionsError::HttpStatus(status));
    }

    let text = response.text().await.map_err(error::from_http_error)?;
    serde_json::from_str(&text).map_err(|e| EmissionsError::Decode(e.to_string()))
}

pub trait EmissionsTransport {
    fn compute_flight_emissions(
        &self,
        request: &FlightEmissionsRequest,
    ) -> impl Future<Output = Result<FlightEmissionsResponse, EmissionsError>> + Send;

    fn compute_typical_flight_emissions(
        &self,
        request: &TypicalFlightEmissionsRequest,
    ) -> impl Future<Output = Result<TypicalFlightEmissionsResponse, EmissionsError>> + Send;
}

#[derive(Clone)]
pub struct DirectApi {
    client: Client,
    api_url: String,
    api_key: String,
}

impl DirectApi {
    pub fn new(api_url: &str, api_key: &str, options: &FetchOptions) -> Result<Self, EmissionsError> {
        Ok(Self {
            client: build_client(options)?,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/flights:{method}", self.api_url)
    }

    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, EmissionsError> {
        let url = self.endpoint(method);
        post_json(&self.client, &url, &[("key", self.api_key.as_str())], body).await
    }
}

impl EmissionsTransport for DirectApi {
    async fn compute_flight_emissions(
        &self,
        request: &FlightEmissionsRequest,
    ) -> Result<FlightEmissionsResponse, EmissionsError> {
        self.call(FLIGHT_EMISSIONS_METHOD, request).await
    }

    async fn compute_typical_flight_emissions(
        &self,
        request: &TypicalFlightEmissionsRequest,
    ) -> Result<TypicalFlightEmissionsResponse, EmissionsError> {
        self.call(TYPICAL_FLIGHT_EMISSIONS_METHOD, request).await
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallableRequest<T> {
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

#[derive(Clone)]
pub struct ProxyApi {
    client: Client,
    base_url: String,
}

impl ProxyApi {
    pub fn new(base_url: &str, options: &FetchOptions) -> Result<Self, EmissionsError> {
        Ok(Self {
            client: build_client(options)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, EmissionsError> {
        let url = format!("{}/{method}", self.base_url);
        let response: CallableResponse<R> =
            post_json(&self.client, &url, &[], &CallableRequest { data: body }).await?;
        Ok(response.result)
    }
}

impl EmissionsTransport for ProxyApi {
    async fn compute_flight_emissions(
        &self,
        request: &FlightEmissionsRequest,
    ) -> Result<FlightEmissionsResponse, EmissionsError> {
        self.call(FLIGHT_EMISSIONS_METHOD, request).await
    }

    async fn compute_typical_flight_emissions(
        &self,
        request: &TypicalFlightEmissionsRequest,
    ) -> Result<TypicalFlightEmissionsResponse, EmissionsError> {
        self.call(TYPICAL_FLIGHT_EMISSIONS_METHOD, request).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Fixtures {
    pub set: FixtureSet,
}

fn parse_fixture<R: DeserializeOwned>(json: &str) -> Result<R, EmissionsError> {
    serde_json::from_str(json).map_err(|e| EmissionsError::Decode(format!("fixture: {e}")))
}

impl EmissionsTransport for Fixtures {
    async fn compute_flight_emissions(
        &self,
        _request: &FlightEmissionsRequest,
    ) -> Result<FlightEmissionsResponse, EmissionsError> {
        match self.set {
            FixtureSet::Plain => parse_fixture(FLIGHT_FIXTURE),
            FixtureSet::Easa => parse_fixture(FLIGHT_EASA_FIXTURE),
        }
    }

    async fn compute_typical_flight_emissions(
        &self,
        _request: &TypicalFlightEmissionsRequest,
    ) -> Result<TypicalFlightEmissionsResponse, EmissionsError> {
        parse_fixture(TYPICAL_FIXTURE)
    }
}

/// Untyped passthrough for the proxy: the request body goes upstream and the
/// response comes back exactly as sent, including fields the model does not know.
pub trait Relay {
    fn relay(
        &self,
        method: &str,
        body: Value,
    ) -> impl Future<Output = Result<Value, EmissionsError>> + Send;
}

impl Relay for DirectApi {
    async fn relay(&self, method: &str, body: Value) -> Result<Value, EmissionsError> {
        self.call(method, &body).await
    }
}

impl Relay for Fixtures {
    async fn relay(&self, method: &str, _body: Value) -> Result<Value, EmissionsError> {
        let json = match (method, self.set) {
            (TYPICAL_FLIGHT_EMISSIONS_METHOD, _) => TYPICAL_FIXTURE,
            (_, FixtureSet::Plain) => FLIGHT_FIXTURE,
            (_, FixtureSet::Easa) => FLIGHT_EASA_FIXTURE,
        };
        parse_fixture(json)
    }
}

#[derive(Clone)]
pub enum Transport {
    Direct(DirectApi),
    Fixture(Fixtures),
    Proxy(ProxyApi),
}

impl Transport {
    pub fn from_source(source: &DataSource, options: &FetchOptions) -> Result<Self, EmissionsError> {
        let transport = match source {
            DataSource::Direct { api_url, api_key } => {
                Self::Direct(DirectApi::new(api_url, api_key, options)?)
            }
            DataSource::Fixture(set) => Self::Fixture(Fixtures { set: *set }),
            DataSource::Proxy { base_url } => Self::Proxy(ProxyApi::new(base_url, options)?),
        };
        Ok(transport)
    }

    pub fn from_config(config: &Config, options: &FetchOptions) -> Result<Self, EmissionsError> {
        let source = config.data_source();
        debug!(?source, "resolved emissions data source");
        Self::from_source(&source, options)
    }
}

impl EmissionsTransport for Transport {
    async fn compute_flight_emissions(
        &self,
        request: &FlightEmissionsRequest,
    ) -> Result<FlightEmissionsResponse, EmissionsError> {
        match self {
            Self::Direct(t) => t.compute_flight_emissions(request).await,
            Self::Fixture(t) => t.compute_flight_emissions(request).await,
            Self::Proxy(t) => t.compute_flight_emissions(request).await,
        }
    }

    async fn compute_typical_flight_emissions(
        &self,
        request: &TypicalFlightEmissionsRequest,
    ) -> Result<TypicalFlightEmissionsResponse, EmissionsError> {
        match self {
            Self::Direct(t) => t.compute_typical_flight_emissions(request).await,
            Self::Fixture(t) => t.compute_typical_flight_emissions(request).await,
            Self::Proxy(t) => t.compute_typical_flight_emissions(request).await,
        }
    }
}

/// Never fails: transport errors and unusable responses both come back as
/// the empty response. Usable ones are converted to kilograms.
#[derive(Clone)]
pub struct EmissionsClient<T> {
    transport: T,
}

impl<T: EmissionsTransport> EmissionsClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get_flight_emissions(
        &self,
        request: &FlightEmissionsRequest,
    ) -> FlightEmissionsResponse {
        let response = match self.transport.compute_flight_emissions(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "flight emissions request failed");
                return FlightEmissionsResponse::empty();
            }
        };

        if !response.is_usable() {
            debug!("flight emissions response has no usable entry");
            return FlightEmissionsResponse::empty();
        }
        transform::flight_response_to_kilograms(response)
    }

    pub async fn get_typical_flight_emissions(
        &self,
        request: &TypicalFlightEmissionsRequest,
    ) -> TypicalFlightEmissionsResponse {
        let response = match self.transport.compute_typical_flight_emissions(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "typical flight emissions request failed");
                return TypicalFlightEmissionsResponse::empty();
            }
        };

        if !response.is_usable() {
            debug!("typical flight emissions response has no usable entry");
            return TypicalFlightEmissionsResponse::empty();
        }
        transform::typical_response_to_kilograms(response)
    }
}

impl EmissionsClient<Transport> {
    pub fn from_config(config: &Config, options: &FetchOptions) -> Result<Self, EmissionsError> {
        Ok(Self::new(Transport::from_config(config, options)?))
    }
}
