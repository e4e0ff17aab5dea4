//! Compact itinerary token carried in the calculator URL.

use chrono::{Local, NaiveDate};
use url::Url;

use crate::model::{FlightLeg, Market};

pub const ITINERARY_URL_PARAM: &str = "itinerary";
pub const MODEL_VERSION_URL_PARAM: &str = "v";

const LEG_SEPARATOR: char = ',';
const FIELD_SEPARATORS: [char; 2] = ['-', '/'];

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn encode(legs: &[FlightLeg]) -> String {
    legs.iter().map(encode_leg).collect::<Vec<_>>().join(",")
}

fn encode_leg(leg: &FlightLeg) -> String {
    let date = leg
        .departure_date
        .map(|d| d.format("%Y%m%d").to_string())
        .unwrap_or_default();

    [
        leg.origin.as_str(),
        leg.destination.as_str(),
        leg.operating_carrier_code.as_str(),
        leg.flight_number.as_str(),
        date.as_str(),
    ]
    .join("-")
}

pub fn decode(token: &str) -> Vec<FlightLeg> {
    decode_on(token, today())
}

pub fn decode_on(token: &str, today: NaiveDate) -> Vec<FlightLeg> {
    token
        .split(LEG_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| decode_leg(segment, today))
        .collect()
}

fn decode_leg(segment: &str, today: NaiveDate) -> FlightLeg {
    let bits: Vec<&str> = segment.split(FIELD_SEPARATORS).collect();
    let field = |i: usize| bits.get(i).copied().unwrap_or_default();

    FlightLeg {
        origin: field(0).to_ascii_uppercase(),
        destination: field(1).to_ascii_uppercase(),
        operating_carrier_code: field(2).to_ascii_uppercase(),
        flight_number: field(3).to_string(),
        departure_date: Some(parse_date_token(bits.get(4).copied(), today)),
    }
}

/// Parses `YYYYMMDD`. Anything else, including an impossible calendar date,
/// falls back to `today`.
pub fn parse_date_token(token: Option<&str>, today: NaiveDate) -> NaiveDate {
    token
        .filter(|t| t.len() == 8 && t.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|t| {
            let year = t[0..4].parse().ok()?;
            let month = t[4..6].parse().ok()?;
            let day = t[6..8].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .unwrap_or(today)
}

pub fn format_date_token(date: Option<NaiveDate>, today: NaiveDate) -> String {
    date.unwrap_or(today).format("%Y%m%d").to_string()
}

pub fn market_from_leg(leg: &FlightLeg) -> Market {
    Market {
        origin: leg.origin.clone(),
        destination: leg.destination.clone(),
    }
}

pub fn itinerary_from_url(url: &Url) -> Option<String> {
    query_value(url, ITINERARY_URL_PARAM)
}

pub fn model_version_from_url(url: &Url) -> Option<String> {
    query_value(url, MODEL_VERSION_URL_PARAM).filter(|v| !v.is_empty())
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn with_itinerary(url: &Url, legs: &[FlightLeg]) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != ITINERARY_URL_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut updated = url.clone();
    updated
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(ITINERARY_URL_PARAM, &encode(legs));
    updated
}
