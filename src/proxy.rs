//! Callable-function proxy in front of the emissions API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ProxyConfig;
use crate::error::EmissionsError;
use crate::fetch::{
    CallableRequest, CallableResponse, DirectApi, FetchOptions, Relay, FLIGHT_EMISSIONS_METHOD,
    TYPICAL_FLIGHT_EMISSIONS_METHOD,
};

pub struct ProxyState<T> {
    upstream: Arc<T>,
}

impl<T> Clone for ProxyState<T> {
    fn clone(&self) -> Self {
        Self {
            upstream: Arc::clone(&self.upstream),
        }
    }
}

fn entries(request: &Value, key: &str) -> usize {
    request.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

async fn forward<T>(
    state: ProxyState<T>,
    payload: Result<Json<CallableRequest<Value>>, JsonRejection>,
    method: &'static str,
) -> Result<Json<CallableResponse<Value>>, EmissionsError>
where
    T: Relay + Send + Sync + 'static,
{
    let Json(CallableRequest { data }) =
        payload.map_err(|e| EmissionsError::Validation(e.body_text()))?;
    info!(
        method,
        flights = entries(&data, "flights"),
        markets = entries(&data, "markets"),
        "relaying callable request"
    );

    let result = state
        .upstream
        .relay(method, data)
        .await
        .inspect_err(|e| warn!(method, error = %e, "upstream call failed"))?;
    Ok(Json(CallableResponse { result }))
}

async fn compute_flight_emissions<T>(
    State(state): State<ProxyState<T>>,
    payload: Result<Json<CallableRequest<Value>>, JsonRejection>,
) -> Result<Json<CallableResponse<Value>>, EmissionsError>
where
    T: Relay + Send + Sync + 'static,
{
    forward(state, payload, FLIGHT_EMISSIONS_METHOD).await
}

async fn compute_typical_flight_emissions<T>(
    State(state): State<ProxyState<T>>,
    payload: Result<Json<CallableRequest<Value>>, JsonRejection>,
) -> Result<Json<CallableResponse<Value>>, EmissionsError>
where
    T: Relay + Send + Sync + 'static,
{
    forward(state, payload, TYPICAL_FLIGHT_EMISSIONS_METHOD).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router<T>(upstream: T) -> Router
where
    T: Relay + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/computeFlightEmissions", post(compute_flight_emissions::<T>))
        .route(
            "/computeTypicalFlightEmissions",
            post(compute_typical_flight_emissions::<T>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ProxyState {
            upstream: Arc::new(upstream),
        })
}

pub async fn serve(config: ProxyConfig, options: FetchOptions) -> Result<(), EmissionsError> {
    let upstream = DirectApi::new(&config.api_url, &config.api_key, &options)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, upstream = %config.api_url, "emissions proxy listening");
    axum::serve(listener, router(upstream)).await?;
    Ok(())
}
