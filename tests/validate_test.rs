use chrono::{Days, NaiveDate};

use timcalc::itinerary;
use timcalc::model::FlightLeg;
use timcalc::validate::{self, LegField, LegInput};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

#[test]
fn airport_code_boundaries() {
    assert_eq!(validate::airport_code_hint(Some("ZR")), Some(validate::AIRPORT_CODE_HINT));
    assert_eq!(validate::airport_code_hint(Some("ZRH")), None);
    assert_eq!(validate::airport_code_hint(Some("ZRHX")), Some(validate::AIRPORT_CODE_HINT));
    assert_eq!(validate::airport_code_hint(Some("zrh")), None);
    assert_eq!(validate::airport_code_hint(Some("Z1H")), Some(validate::AIRPORT_CODE_HINT));
}

#[test]
fn absent_airport_code_gets_the_hint() {
    assert_eq!(validate::airport_code_hint(None), Some(validate::AIRPORT_CODE_HINT));
    assert_eq!(validate::airport_code_hint(Some("")), Some(validate::AIRPORT_CODE_HINT));
}

#[test]
fn carrier_code_allows_digits() {
    assert_eq!(validate::carrier_code_hint(Some("B6")), None);
    assert_eq!(validate::carrier_code_hint(Some("lx")), None);
    assert_eq!(validate::carrier_code_hint(Some("LXX")), Some(validate::CARRIER_CODE_HINT));
    assert_eq!(validate::carrier_code_hint(Some("L-")), Some(validate::CARRIER_CODE_HINT));
    assert_eq!(validate::carrier_code_hint(None), Some(validate::CARRIER_CODE_HINT));
}

#[test]
fn flight_number_hint_only_for_non_digits() {
    assert_eq!(validate::flight_number_hint(Some("54")), None);
    assert_eq!(validate::flight_number_hint(Some("")), None);
    assert_eq!(validate::flight_number_hint(None), None);
    assert_eq!(validate::flight_number_hint(Some("54a")), Some(validate::FLIGHT_NUMBER_HINT));
}

#[test]
fn date_boundaries() {
    let in_days = |n| today().checked_add_days(Days::new(n));
    let yesterday = today().pred_opt();

    assert_eq!(validate::departure_date_hint_on(Some(today()), today()), None);
    assert_eq!(validate::departure_date_hint_on(in_days(365), today()), None);
    assert_eq!(
        validate::departure_date_hint_on(in_days(366), today()),
        Some(validate::DATE_TOO_FAR_HINT)
    );
    assert_eq!(
        validate::departure_date_hint_on(yesterday, today()),
        Some(validate::DATE_IN_PAST_HINT)
    );
}

#[test]
fn missing_date_counts_as_today() {
    assert_eq!(validate::departure_date_hint_on(None, today()), None);
}

#[test]
fn error_predicates_have_no_opinion_on_absence() {
    assert!(!validate::is_airport_code_error(None));
    assert!(!validate::is_carrier_code_error(None));
    assert!(!validate::is_flight_number_error(None));

    assert!(validate::is_airport_code_error(Some("ZR")));
    assert!(validate::is_carrier_code_error(Some("LXX")));
    assert!(validate::is_flight_number_error(Some("5a")));
    assert!(!validate::is_airport_code_error(Some("zrh")));
}

fn valid_leg() -> FlightLeg {
    FlightLeg {
        origin: "ZRH".into(),
        destination: "BOS".into(),
        operating_carrier_code: "LX".into(),
        flight_number: "54".into(),
        departure_date: NaiveDate::from_ymd_opt(2026, 4, 1),
    }
}

#[test]
fn complete_leg_is_valid() {
    assert!(validate::is_leg_valid_on(&valid_leg(), today()));
}

#[test]
fn empty_flight_number_blocks_submission_without_a_hint() {
    let mut leg = valid_leg();
    leg.flight_number.clear();
    let input = LegInput::from_leg(&leg);

    assert!(input.hints_on(today()).is_clear());
    assert!(!input.is_valid_on(today()));
}

#[test]
fn leg_validity_against_the_clock() {
    let mut leg = valid_leg();
    leg.departure_date = itinerary::today().checked_add_days(Days::new(30));
    assert!(validate::is_leg_valid(&leg));

    leg.departure_date = itinerary::today().checked_sub_days(Days::new(1));
    assert!(!validate::is_leg_valid(&leg));

    leg.departure_date = None;
    assert!(validate::is_leg_valid(&leg));
}

#[test]
fn date_hint_against_the_clock() {
    let now = itinerary::today();
    assert_eq!(validate::departure_date_hint(None), None);
    assert_eq!(validate::departure_date_hint(Some(now)), None);
    assert_eq!(
        validate::departure_date_hint(now.checked_sub_days(Days::new(1))),
        Some(validate::DATE_IN_PAST_HINT)
    );
    assert_eq!(
        validate::departure_date_hint(now.checked_add_days(Days::new(400))),
        Some(validate::DATE_TOO_FAR_HINT)
    );
}

#[test]
fn past_date_blocks_submission() {
    let mut leg = valid_leg();
    leg.departure_date = NaiveDate::from_ymd_opt(2026, 2, 1);
    assert!(!validate::is_leg_valid_on(&leg, today()));
}

#[test]
fn untouched_row_is_invalid() {
    assert!(!LegInput::default().is_valid_on(today()));
}

#[test]
fn edits_rebuild_a_normalized_leg() {
    let mut input = LegInput::default();
    input.set(LegField::Origin, "zrh");
    input.set(LegField::Destination, "bos");
    input.set(LegField::Carrier, "lx");
    input.set(LegField::FlightNumber, "54");

    assert!(input.is_valid_on(today()));
    let leg = input.to_leg();
    assert_eq!(leg.origin, "ZRH");
    assert_eq!(leg.destination, "BOS");
    assert_eq!(leg.operating_carrier_code, "LX");
}
