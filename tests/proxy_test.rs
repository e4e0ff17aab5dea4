use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use timcalc::config::FixtureSet;
use timcalc::error::EmissionsError;
use timcalc::fetch::{Fixtures, Relay, FLIGHT_EMISSIONS_METHOD};
use timcalc::proxy;

struct Down;

impl Relay for Down {
    async fn relay(&self, method: &str, _body: Value) -> Result<Value, EmissionsError> {
        if method == FLIGHT_EMISSIONS_METHOD {
            Err(EmissionsError::HttpStatus(403))
        } else {
            Err(EmissionsError::Timeout)
        }
    }
}

/// Keeps the last body it was sent and answers with fields the model does
/// not declare.
struct Recorder {
    seen: Arc<Mutex<Option<Value>>>,
}

impl Relay for Recorder {
    async fn relay(&self, _method: &str, body: Value) -> Result<Value, EmissionsError> {
        *self.seen.lock().unwrap() = Some(body);
        Ok(json!({
            "flightEmissions": [{
                "emissionsGramsPerPax": { "economy": 324060 },
                "source": "EASA",
                "emissionsInputs": {
                    "easaLabelData": {
                        "safDiscountPercentage": 0.02,
                        "labelExpiryDate": { "year": 2026, "month": 12, "day": 31 }
                    }
                },
                "aircraftType": "A333"
            }],
            "modelVersion": { "major": 2, "minor": 0, "patch": 0 }
        }))
    }
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn flight_call() -> Value {
    json!({
        "data": {
            "flights": [{
                "origin": "ZRH",
                "destination": "BOS",
                "operatingCarrierCode": "LX",
                "flightNumber": 54,
                "departureDate": { "year": 2025, "month": 8, "day": 27 }
            }]
        }
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = proxy::router(Fixtures {
        set: FixtureSet::Plain,
    });
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn flight_call_wraps_the_upstream_response() {
    let app = proxy::router(Fixtures {
        set: FixtureSet::Plain,
    });
    let response = app
        .oneshot(post("/computeFlightEmissions", flight_call()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let entry = &body["result"]["flightEmissions"][0];
    assert_eq!(entry["emissionsGramsPerPax"]["economy"], 349095);
    assert_eq!(body["result"]["modelVersion"]["major"], 2);
}

#[tokio::test]
async fn typical_call_wraps_the_upstream_response() {
    let app = proxy::router(Fixtures {
        set: FixtureSet::Plain,
    });
    let call = json!({ "data": { "markets": [{ "origin": "ZRH", "destination": "BOS" }] } });
    let response = app
        .oneshot(post("/computeTypicalFlightEmissions", call))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["result"]["typicalFlightEmissions"][0]["market"]["destination"],
        "BOS"
    );
}

#[tokio::test]
async fn missing_data_envelope_is_a_bad_request() {
    let app = proxy::router(Fixtures {
        set: FixtureSet::Plain,
    });
    let response = app
        .oneshot(post("/computeFlightEmissions", json!({ "flights": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["status"], "validation_error");
}

#[tokio::test]
async fn upstream_http_failure_is_a_bad_gateway() {
    let response = proxy::router(Down)
        .oneshot(post("/computeFlightEmissions", flight_call()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["status"], "http_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("403"));
}

#[tokio::test]
async fn upstream_timeout_is_a_gateway_timeout() {
    let call = json!({ "data": { "markets": [] } });
    let response = proxy::router(Down)
        .oneshot(post("/computeTypicalFlightEmissions", call))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn cors_is_open() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/computeFlightEmissions")
        .header(header::ORIGIN, "https://travelimpactmodel.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = proxy::router(Down).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn bodies_are_relayed_untouched() {
    let seen = Arc::new(Mutex::new(None));
    let app = proxy::router(Recorder { seen: seen.clone() });
    let call = json!({
        "data": {
            "flights": [{
                "origin": "ZRH",
                "destination": "BOS",
                "operatingCarrierCode": "LX",
                "flightNumber": "54",
                "departureDate": { "year": 2025, "month": 8, "day": 27 }
            }]
        }
    });

    let response = app
        .oneshot(post("/computeFlightEmissions", call))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sent = seen.lock().unwrap().clone().unwrap();
    assert_eq!(sent["flights"][0]["flightNumber"], "54");

    let body = json_body(response).await;
    let entry = &body["result"]["flightEmissions"][0];
    assert_eq!(entry["aircraftType"], "A333");
    assert_eq!(
        entry["emissionsInputs"]["easaLabelData"]["labelExpiryDate"]["year"],
        2026
    );
    assert_eq!(entry["emissionsGramsPerPax"]["economy"], 324060);
}
