use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("tim-calc"));
    for key in [
        "TIM_API_URL",
        "TIM_API_KEY",
        "TIM_FAKE_API_DATA",
        "TIM_FAKE_API_EASA_DATA",
        "TIM_PROXY_URL",
        "LOG_FORMAT",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("valid JSON output")
}

#[test]
fn top_level_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Flight emissions estimates from the Travel Impact Model",
        ))
        .stdout(predicate::str::contains("flight"))
        .stdout(predicate::str::contains("route"))
        .stdout(predicate::str::contains("itinerary"))
        .stdout(predicate::str::contains("Examples:"))
        .stdout(predicate::str::contains("tim-calc flight -f ZRH -t BOS"));
}

#[test]
fn top_level_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tim-calc 0.3.0"));
}

#[test]
fn flight_help_shows_all_flags() {
    cmd()
        .args(["flight", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-f, --from <IATA>"))
        .stdout(predicate::str::contains("-t, --to <IATA>"))
        .stdout(predicate::str::contains("-c, --carrier <IATA>"))
        .stdout(predicate::str::contains("-n, --flight-number <NUMBER>"))
        .stdout(predicate::str::contains("-d, --date <YYYY-MM-DD>"))
        .stdout(predicate::str::contains("--itinerary <TOKEN|URL>"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--pretty"))
        .stdout(predicate::str::contains("--coarse"))
        .stdout(predicate::str::contains("--fake"))
        .stdout(predicate::str::contains("--timeout <SECS>"))
        .stdout(predicate::str::contains("Multi-leg:"));
}

#[test]
fn no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn unknown_subcommand_fails() {
    cmd().arg("search").assert().failure();
}

#[test]
fn missing_carrier_fails() {
    cmd()
        .args(["flight", "-f", "ZRH", "-t", "BOS", "-n", "54", "--fake"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--carrier is required"));
}

#[test]
fn invalid_leg_lists_its_problems() {
    cmd()
        .args(["flight", "-f", "Z1", "-t", "BOS", "-c", "LX", "-n", "54", "--fake"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("3-letter IATA airport code"));
}

#[test]
fn non_numeric_flight_number_fails() {
    cmd()
        .args(["flight", "-f", "ZRH", "-t", "BOS", "-c", "LX", "-n", "5a", "--fake"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Numbers only"));
}

#[test]
fn past_date_fails() {
    cmd()
        .args([
            "flight", "-f", "ZRH", "-t", "BOS", "-c", "LX", "-n", "54", "-d", "2020-01-01",
            "--fake",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Departure date should be in the future"));
}

#[test]
fn malformed_date_fails() {
    cmd()
        .args([
            "flight", "-f", "ZRH", "-t", "BOS", "-c", "LX", "-n", "54", "-d", "27/08/2025",
            "--fake",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn json_mode_error_is_structured() {
    let output = cmd()
        .args(["route", "-f", "X1", "-t", "BOS", "--fake", "--json"])
        .assert()
        .code(2);
    let parsed = stdout_json(output.get_output());
    assert_eq!(parsed["error"]["kind"], "invalid_airport");
    assert!(parsed["error"]["message"]
        .as_str()
        .unwrap()
        .contains("must be exactly 3 letters"));
}

#[test]
fn flight_table_from_fixtures() {
    cmd()
        .args(["flight", "-f", "ZRH", "-t", "BOS", "-c", "LX", "-n", "54", "--fake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Well-to-Wake"))
        .stdout(predicate::str::contains("Tank-to-Wake"))
        .stdout(predicate::str::contains("Well-to-Tank"))
        .stdout(predicate::str::contains("349.1"))
        .stdout(predicate::str::contains("278.5"))
        .stdout(predicate::str::contains("70.6"))
        .stdout(predicate::str::contains("Typical"))
        .stdout(predicate::str::contains("366.8"))
        .stdout(predicate::str::contains("Contrails impact: Medium"))
        .stdout(predicate::str::contains("Fuel Burn Estimates"))
        .stdout(predicate::str::contains("Model Version: 2.0.0"));
}

#[test]
fn flight_table_coarse() {
    cmd()
        .args([
            "flight", "-f", "ZRH", "-t", "BOS", "-c", "LX", "-n", "54", "--fake", "--coarse",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("349 kg"))
        .stdout(predicate::str::contains("367 kg"));
}

#[test]
fn easa_fixture_shows_saf_rows() {
    cmd()
        .args(["flight", "-f", "ZRH", "-t", "BOS", "-c", "LX", "-n", "54", "--fake-easa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SAF reduction"))
        .stdout(predicate::str::contains("Total incl. SAF"))
        .stdout(predicate::str::contains("-6.5"))
        .stdout(predicate::str::contains("Contrails impact: Unknown"))
        .stdout(predicate::str::contains("EASA Environmental Label"));
}

#[test]
fn flight_json_is_in_kilograms() {
    let output = cmd()
        .args([
            "flight", "-f", "ZRH", "-t", "BOS", "-c", "LX", "-n", "54", "--fake", "--json",
        ])
        .assert()
        .success();
    let parsed = stdout_json(output.get_output());
    assert_eq!(
        parsed["flight"]["flightEmissions"][0]["emissionsGramsPerPax"]["economy"],
        349.095
    );
    assert_eq!(
        parsed["typical"]["typicalFlightEmissions"][0]["emissionsGramsPerPax"]["economy"],
        366.84
    );
}

#[test]
fn flight_from_env_fixture_flag() {
    cmd()
        .env("TIM_FAKE_API_DATA", "1")
        .args(["flight", "--itinerary", "zrh-bos-lx-54"])
        .assert()
        .success()
        .stdout(predicate::str::contains("349.1"));
}

#[test]
fn stale_model_version_in_url_shows_advisory() {
    cmd()
        .args([
            "flight",
            "--itinerary",
            "https://travelimpactmodel.org/lookup/flight?itinerary=ZRH-BOS-LX-54&v=1.0.0",
            "--fake",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "This data is using the latest model version.",
        ));
}

#[test]
fn multi_leg_itinerary_prints_links_without_fetching() {
    let output = cmd()
        .args([
            "flight",
            "--itinerary",
            "ZRH-BOS-LX-54-20250827,NYC-MUC-BA-456-20250828",
            "--json",
        ])
        .assert()
        .success();
    let parsed = stdout_json(output.get_output());
    let legs = parsed.as_array().unwrap();
    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0]["title"], "ZRH to BOS");
    assert_eq!(legs[0]["subtitle"], "LX54 · Departing Wed, Aug 27, 2025");
    assert!(legs[1]["href"]
        .as_str()
        .unwrap()
        .contains("itinerary=NYC-MUC-BA-456-20250828"));
}

#[test]
fn route_from_fixtures() {
    cmd()
        .args(["route", "-f", "zrh", "-t", "bos", "--fake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Typical"))
        .stdout(predicate::str::contains("366.8"))
        .stdout(predicate::str::contains("Model Version: 2.0.0"));
}

#[test]
fn route_compares_destinations() {
    let output = cmd()
        .args(["route", "-f", "ZRH", "-t", "BOS,JFK", "--fake", "--json"])
        .assert()
        .success();
    let parsed = stdout_json(output.get_output());
    assert!(parsed["BOS"]["typicalFlightEmissions"].is_array());
    assert!(parsed["JFK"]["typicalFlightEmissions"].is_array());
}

#[test]
fn itinerary_encode() {
    cmd()
        .args([
            "itinerary",
            "encode",
            "--leg",
            "zrh bos lx 54 2025-08-27",
            "--leg",
            "BOS JFK B6 1234",
        ])
        .assert()
        .success()
        .stdout("ZRH-BOS-LX-54-20250827,BOS-JFK-B6-1234-\n");
}

#[test]
fn itinerary_encode_rejects_short_leg() {
    cmd()
        .args(["itinerary", "encode", "--leg", "ZRH BOS"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--leg must be"));
}

#[test]
fn itinerary_decode_json() {
    let output = cmd()
        .args(["itinerary", "decode", "ZRH/BOS/LX/54/20250827", "--json"])
        .assert()
        .success();
    let parsed = stdout_json(output.get_output());
    assert_eq!(parsed[0]["origin"], "ZRH");
    assert_eq!(parsed[0]["operatingCarrierCode"], "LX");
    assert_eq!(parsed[0]["departureDate"], "2025-08-27");
}

#[test]
fn itinerary_decode_table_flags_problems() {
    cmd()
        .args(["itinerary", "decode", "ZRH-BO-LX-54"])
        .assert()
        .success()
        .stdout(predicate::str::contains("destination: 3-letter IATA airport code"));
}

#[test]
fn url_carries_itinerary_and_version() {
    cmd()
        .args([
            "url",
            "--itinerary",
            "ZRH-BOS-LX-54-20250827",
            "--model-version",
            "2.0.0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "https://travelimpactmodel.org/lookup/flight?itinerary=ZRH-BOS-LX-54-20250827",
        ))
        .stdout(predicate::str::contains("v=2.0.0"));
}

#[test]
fn serve_needs_an_api_key() {
    cmd()
        .arg("serve")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("TIM_API_KEY is required"));
}
