use std::collections::BTreeMap;
use std::process;

use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use tokio::task::JoinSet;
use url::Url;

use timcalc::calculator::{self, Calculator, CalculatorState, LegLink};
use timcalc::config::{Config, ProxyConfig, DEFAULT_CALCULATOR_URL};
use timcalc::error::EmissionsError;
use timcalc::fetch::{EmissionsClient, FetchOptions, Transport};
use timcalc::itinerary;
use timcalc::model::{FlightLeg, TypicalFlightEmissionsResponse};
use timcalc::table;
use timcalc::transform::{self, BreakdownRow, BreakdownTable, FormatMode, PASSENGER_TABLE_HEADERS};
use timcalc::FlightReport;

#[derive(Parser)]
#[command(
    name = "tim-calc",
    about = "Flight emissions estimates from the Travel Impact Model",
    version,
    after_help = "\
Examples:
  tim-calc flight -f ZRH -t BOS -c LX -n 54 -d 2026-11-01
  tim-calc flight --itinerary ZRH-BOS-LX-54-20261101 --json --pretty
  tim-calc flight --itinerary ZRH-BOS-LX-54-20261101,BOS-JFK-B6-1234-20261102
  tim-calc route -f ZRH -t BOS,JFK,ORD --coarse
  tim-calc itinerary decode ZRH-BOS-LX-54-20261101
  tim-calc url -f ZRH -t BOS -c LX -n 54 -d 2026-11-01 --open

Local development:
  TIM_FAKE_API_DATA=1 tim-calc flight -f ZRH -t BOS -c LX -n 54
  TIM_API_KEY=... tim-calc serve --port 8080"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(
        about = "Estimate emissions for a specific flight",
        long_about = "Estimate per-passenger emissions for one flight, with the breakdown into\n\
            tank-to-wake and well-to-tank, the typical emissions for the route, contrails\n\
            impact and data sources. Multi-leg itineraries print a summary with one\n\
            calculator link per leg instead.",
        after_help = "\
Examples:
  By flags:      tim-calc flight -f ZRH -t BOS -c LX -n 54 -d 2026-11-01
  By token:      tim-calc flight --itinerary ZRH-BOS-LX-54-20261101
  By URL:        tim-calc flight --itinerary 'https://travelimpactmodel.org/lookup/flight?itinerary=ZRH-BOS-LX-54-20261101&v=2.0.0'
  Multi-leg:     tim-calc flight --itinerary ZRH-BOS-LX-54-20261101,BOS-JFK-B6-1234-20261102
  JSON output:   tim-calc flight -f ZRH -t BOS -c LX -n 54 --json --pretty
  Whole kg:      tim-calc flight -f ZRH -t BOS -c LX -n 54 --coarse"
    )]
    Flight(FlightArgs),

    #[command(
        about = "Estimate typical emissions for a route",
        after_help = "\
Examples:
  tim-calc route -f ZRH -t BOS
  tim-calc route -f ZRH -t BOS,JFK,ORD --json"
    )]
    Route(RouteArgs),

    #[command(about = "Encode or decode itinerary tokens")]
    Itinerary {
        #[command(subcommand)]
        command: ItineraryCommand,
    },

    #[command(
        about = "Print the web calculator URL for a flight",
        after_help = "\
Examples:
  tim-calc url -f ZRH -t BOS -c LX -n 54 -d 2026-11-01
  tim-calc url --itinerary ZRH-BOS-LX-54-20261101 --model-version 2.0.0 --open"
    )]
    Url(UrlArgs),

    #[command(
        about = "Run the emissions API proxy",
        long_about = "Serve POST /computeFlightEmissions and POST /computeTypicalFlightEmissions,\n\
            forwarding to the emissions API with the key from TIM_API_KEY."
    )]
    Serve(ServeArgs),

    #[command(about = "Start MCP server for AI agents (stdio transport)")]
    Mcp(McpArgs),
}

#[derive(clap::Subcommand)]
enum ItineraryCommand {
    #[command(
        about = "Build a token from legs",
        after_help = "\
Examples:
  tim-calc itinerary encode --leg \"ZRH BOS LX 54 2026-11-01\"
  tim-calc itinerary encode --leg \"ZRH BOS LX 54 2026-11-01\" --leg \"BOS JFK B6 1234 2026-11-02\""
    )]
    Encode {
        #[arg(
            long,
            required = true,
            value_name = "\"FROM TO CARRIER NUMBER [DATE]\"",
            help = "Flight leg (repeatable)",
            long_help = "Define a flight leg as \"FROM TO CARRIER NUMBER [YYYY-MM-DD]\". \
                Repeat for multi-leg itineraries.",
            num_args = 1
        )]
        leg: Vec<String>,
    },

    #[command(about = "Show the legs in a token and anything that would block them")]
    Decode {
        #[arg(value_name = "TOKEN")]
        token: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args)]
struct LegFlags {
    #[arg(short, long, value_name = "IATA", help = "Departure airport code")]
    from: Option<String>,

    #[arg(short, long, value_name = "IATA", help = "Arrival airport code")]
    to: Option<String>,

    #[arg(
        short,
        long,
        value_name = "IATA",
        help = "Operating carrier code",
        long_help = "Operating carrier IATA code (2 characters, e.g. LX, BA, B6). \
            Code shares are not supported."
    )]
    carrier: Option<String>,

    #[arg(short = 'n', long, value_name = "NUMBER", help = "Flight number (digits only)")]
    flight_number: Option<String>,

    #[arg(
        short,
        long,
        value_name = "YYYY-MM-DD",
        help = "Departure date (default: today)",
        long_help = "Departure date in YYYY-MM-DD format, no earlier than today and \
            at most a year ahead. Defaults to today."
    )]
    date: Option<String>,
}

impl LegFlags {
    fn to_leg(&self) -> Result<FlightLeg, EmissionsError> {
        let required = |value: &Option<String>, flag: &str| {
            value
                .as_deref()
                .map(|v| v.trim().to_string())
                .ok_or_else(|| {
                    EmissionsError::Validation(format!("{flag} is required (or use --itinerary)"))
                })
        };

        Ok(FlightLeg {
            origin: required(&self.from, "--from")?.to_uppercase(),
            destination: required(&self.to, "--to")?.to_uppercase(),
            operating_carrier_code: required(&self.carrier, "--carrier")?.to_uppercase(),
            flight_number: required(&self.flight_number, "--flight-number")?,
            departure_date: self.date.as_deref().map(parse_date).transpose()?,
        })
    }
}

#[derive(clap::Args)]
struct OutputArgs {
    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,

    #[arg(long, help = "Round to whole kilograms")]
    coarse: bool,
}

impl OutputArgs {
    fn json_mode(&self) -> bool {
        self.json || self.pretty
    }

    fn mode(&self) -> FormatMode {
        if self.coarse {
            FormatMode::Coarse
        } else {
            FormatMode::Precise
        }
    }
}

#[derive(clap::Args)]
struct SourceArgs {
    #[arg(
        long,
        value_name = "URL",
        help = "Emissions API base URL [env: TIM_API_URL]",
        long_help = "Emissions API base URL, e.g. https://travelimpactmodel.googleapis.com/v1. \
            Used together with --api-key to call the API directly."
    )]
    api_url: Option<String>,

    #[arg(long, value_name = "KEY", help = "Emissions API key [env: TIM_API_KEY]")]
    api_key: Option<String>,

    #[arg(long, help = "Use canned fixture data [env: TIM_FAKE_API_DATA]")]
    fake: bool,

    #[arg(long, help = "Use canned EASA-labelled fixture data [env: TIM_FAKE_API_EASA_DATA]")]
    fake_easa: bool,

    #[arg(long, value_name = "URL", help = "Emissions proxy base URL [env: TIM_PROXY_URL]")]
    proxy_url: Option<String>,

    #[arg(long, value_name = "URL", help = "HTTP or SOCKS5 proxy for outgoing requests")]
    http_proxy: Option<String>,

    #[arg(long, value_name = "SECS", help = "Request timeout [env: TIM_TIMEOUT_SECS]")]
    timeout: Option<u64>,
}

impl SourceArgs {
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if self.api_url.is_some() {
            config.api_url = self.api_url.clone();
        }
        if self.api_key.is_some() {
            config.api_key = self.api_key.clone();
        }
        config.fake_data |= self.fake;
        config.fake_easa_data |= self.fake_easa;
        if self.proxy_url.is_some() {
            config.proxy_url = self.proxy_url.clone();
        }
        if self.timeout.is_some() {
            config.timeout = self.timeout;
        }
        config
    }

    fn client(&self) -> Result<EmissionsClient<Transport>, EmissionsError> {
        let config = self.config();
        let options = FetchOptions {
            http_proxy: self.http_proxy.clone(),
            timeout: config.timeout_secs(),
        };
        EmissionsClient::from_config(&config, &options)
    }
}

#[derive(clap::Args)]
struct FlightArgs {
    #[command(flatten)]
    leg: LegFlags,

    #[arg(
        long,
        value_name = "TOKEN|URL",
        help = "Itinerary token or calculator URL (replaces leg flags)",
        long_help = "Itinerary token (legs joined by ',', each FROM-TO-CARRIER-NUMBER-YYYYMMDD) \
            or a full calculator URL carrying an itinerary parameter. A 'v' parameter in the URL \
            is compared against the model version of the results."
    )]
    itinerary: Option<String>,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args)]
struct RouteArgs {
    #[arg(short, long, value_name = "IATA", help = "Departure airport code")]
    from: String,

    #[arg(
        short,
        long,
        value_name = "IATA",
        help = "Arrival airport code (comma-separate to compare routes)"
    )]
    to: String,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args)]
struct UrlArgs {
    #[command(flatten)]
    leg: LegFlags,

    #[arg(long, value_name = "TOKEN", help = "Itinerary token (replaces leg flags)")]
    itinerary: Option<String>,

    #[arg(long, value_name = "URL", default_value = DEFAULT_CALCULATOR_URL, help = "Calculator page URL")]
    base: String,

    #[arg(long, value_name = "X.Y.Z", help = "Pin a model version in the URL")]
    model_version: Option<String>,

    #[arg(long, help = "Open the URL in the default browser")]
    open: bool,
}

#[derive(clap::Args)]
struct ServeArgs {
    #[arg(long, value_name = "PORT", help = "Listen port [env: PORT, default: 8080]")]
    port: Option<u16>,

    #[arg(long, value_name = "URL", help = "HTTP or SOCKS5 proxy for upstream requests")]
    http_proxy: Option<String>,

    #[arg(long, value_name = "SECS", help = "Upstream request timeout [env: TIM_TIMEOUT_SECS]")]
    timeout: Option<u64>,
}

#[derive(clap::Args)]
struct McpArgs {
    #[command(flatten)]
    source: SourceArgs,
}

fn error_code(err: &EmissionsError) -> i32 {
    match err {
        EmissionsError::InvalidAirport(_)
        | EmissionsError::Validation(_)
        | EmissionsError::Config(_) => 2,
        EmissionsError::Timeout
        | EmissionsError::ConnectionFailed(_)
        | EmissionsError::DnsResolution(_)
        | EmissionsError::TlsError(_)
        | EmissionsError::ProxyError(_) => 3,
        EmissionsError::HttpStatus(_) => 5,
        EmissionsError::Decode(_) => 6,
        EmissionsError::Io(_) => 1,
    }
}

fn die(err: &EmissionsError, json_mode: bool) -> ! {
    if json_mode {
        let json = serde_json::json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {err}");
    }
    process::exit(error_code(err));
}

fn parse_date(value: &str) -> Result<NaiveDate, EmissionsError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        EmissionsError::Validation(format!("invalid date \"{value}\", expected YYYY-MM-DD"))
    })
}

fn parse_leg_spec(spec: &str) -> Result<FlightLeg, EmissionsError> {
    let parts: Vec<&str> = spec.split_whitespace().collect();
    if !(4..=5).contains(&parts.len()) {
        return Err(EmissionsError::Validation(format!(
            "--leg must be \"FROM TO CARRIER NUMBER [YYYY-MM-DD]\", got: \"{spec}\""
        )));
    }

    Ok(FlightLeg {
        origin: parts[0].to_uppercase(),
        destination: parts[1].to_uppercase(),
        operating_carrier_code: parts[2].to_uppercase(),
        flight_number: parts[3].to_string(),
        departure_date: parts.get(4).map(|d| parse_date(d)).transpose()?,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), EmissionsError> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| EmissionsError::Decode(e.to_string()))?;
    println!("{output}");
    Ok(())
}

fn calculator_page(itinerary_or_url: &str) -> Result<Url, EmissionsError> {
    if itinerary_or_url.starts_with("http://") || itinerary_or_url.starts_with("https://") {
        return Url::parse(itinerary_or_url)
            .map_err(|e| EmissionsError::Validation(format!("invalid URL: {e}")));
    }
    timcalc::generate_calculator_url(DEFAULT_CALCULATOR_URL, &itinerary::decode(itinerary_or_url))
}

#[derive(Serialize)]
struct LegSummary<'a> {
    title: &'a str,
    subtitle: &'a str,
    href: &'a str,
    leg: &'a FlightLeg,
}

fn print_legs(links: &[LegLink], output: &OutputArgs) -> Result<(), EmissionsError> {
    if output.json_mode() {
        let summary: Vec<LegSummary> = links
            .iter()
            .map(|l| LegSummary {
                title: &l.title,
                subtitle: &l.subtitle,
                href: l.href.as_str(),
                leg: &l.leg,
            })
            .collect();
        return print_json(&summary, output.pretty);
    }

    println!("{}", table::render_legs(links));
    Ok(())
}

fn well_to_wake_only(report: &FlightReport, mode: FormatMode) -> BreakdownTable {
    let per_pax = report
        .flight
        .flight_emissions
        .first()
        .and_then(|e| e.emissions_grams_per_pax.as_ref());
    BreakdownTable {
        headers: PASSENGER_TABLE_HEADERS,
        rows: vec![BreakdownRow::new("Well-to-Wake", per_pax, mode)],
    }
}

fn print_flight(
    calc: &Calculator,
    report: &FlightReport,
    output: &OutputArgs,
) -> Result<(), EmissionsError> {
    if output.json_mode() {
        return print_json(report, output.pretty);
    }

    if report.is_empty() {
        println!("{}", calculator::FLIGHT_NOT_FOUND_MESSAGE);
        println!("{}", calculator::CODE_SHARE_NOTE);
        return Ok(());
    }

    if let Some(advisory) = calc.model_version_advisory() {
        println!("{advisory}");
    }

    let mode = output.mode();
    let passengers = report
        .passenger_table(mode)
        .unwrap_or_else(|| well_to_wake_only(report, mode));
    println!("{}", table::render_breakdown(&passengers));
    println!("Contrails impact: {}", report.contrails());

    let attribution = report.attribution();
    if !attribution.is_empty() {
        println!("{}", table::render_attribution(&attribution));
    }
    if let Some(footer) = calc.model_version_footer() {
        println!("{footer}");
    }
    Ok(())
}

async fn run_flight(args: FlightArgs) -> Result<(), EmissionsError> {
    let page = match &args.itinerary {
        Some(token) => calculator_page(token)?,
        None => timcalc::generate_calculator_url(DEFAULT_CALCULATOR_URL, &[args.leg.to_leg()?])?,
    };

    let mut calc = Calculator::from_url(page);
    match calc.state() {
        CalculatorState::Empty => {
            return Err(EmissionsError::Validation("itinerary is empty".into()));
        }
        CalculatorState::MultiLeg(links) => return print_legs(links, &args.output),
        CalculatorState::SingleLeg(_) => {}
    }

    let Some(submission) = calc.load() else {
        let problems = match calc.state() {
            CalculatorState::SingleLeg(input) => input.problems_on(itinerary::today()),
            _ => Vec::new(),
        };
        return Err(EmissionsError::Validation(format!(
            "invalid flight: {}",
            problems.join(", ")
        )));
    };

    let client = args.source.client()?;
    let outcome = calculator::fetch(&client, &submission).await;
    calc.apply(outcome);

    let report = FlightReport {
        flight: calc.flight_result().cloned().unwrap_or_default(),
        typical: calc.typical_result().cloned().unwrap_or_default(),
    };
    print_flight(&calc, &report, &args.output)
}

fn print_route(result: &TypicalFlightEmissionsResponse, mode: FormatMode) {
    let table = result
        .typical_flight_emissions
        .first()
        .and_then(|t| t.emissions_grams_per_pax.as_ref())
        .and_then(|per_pax| transform::route_table(per_pax, mode));

    match table {
        Some(table) => {
            println!("{}", table::render_breakdown(&table));
            if let Some(footer) = calculator::model_version_footer(result.model_version.as_ref()) {
                println!("{footer}");
            }
        }
        None => println!("{}", calculator::ROUTE_NOT_FOUND_MESSAGE),
    }
}

async fn run_route(args: RouteArgs) -> Result<(), EmissionsError> {
    let origin = args.from.trim().to_uppercase();
    let destinations: Vec<String> = args
        .to
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    let client = args.source.client()?;

    if destinations.len() <= 1 {
        let destination = destinations.first().map(String::as_str).unwrap_or_default();
        let result = timcalc::route_emissions(&client, &origin, destination).await?;
        if args.output.json_mode() {
            return print_json(&result, args.output.pretty);
        }
        print_route(&result, args.output.mode());
        return Ok(());
    }

    let mut join_set = JoinSet::new();
    for dest in destinations {
        let client = client.clone();
        let origin = origin.clone();
        join_set.spawn(async move {
            let result = timcalc::route_emissions(&client, &origin, &dest).await;
            (dest, result)
        });
    }

    let mut results: BTreeMap<String, TypicalFlightEmissionsResponse> = BTreeMap::new();
    while let Some(joined) = join_set.join_next().await {
        let (dest, result) =
            joined.map_err(|e| EmissionsError::Io(std::io::Error::other(e.to_string())))?;
        match result {
            Ok(response) => {
                results.insert(dest, response);
            }
            Err(e) => {
                eprintln!("warning: {dest}: {e}");
                results.insert(dest, TypicalFlightEmissionsResponse::empty());
            }
        }
    }

    if args.output.json_mode() {
        return print_json(&results, args.output.pretty);
    }
    for (dest, result) in &results {
        println!("=== {origin} to {dest} ===");
        print_route(result, args.output.mode());
        println!();
    }
    Ok(())
}

fn run_itinerary(command: ItineraryCommand) -> Result<(), EmissionsError> {
    match command {
        ItineraryCommand::Encode { leg } => {
            let legs = leg
                .iter()
                .map(|spec| parse_leg_spec(spec))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", itinerary::encode(&legs));
            Ok(())
        }
        ItineraryCommand::Decode { token, output } => {
            let legs = itinerary::decode(&token);
            if output.json_mode() {
                return print_json(&legs, output.pretty);
            }
            if legs.is_empty() {
                println!("No legs in itinerary.");
                return Ok(());
            }
            println!("{}", table::render_itinerary(&legs, itinerary::today()));
            Ok(())
        }
    }
}

fn run_url(args: UrlArgs) -> Result<(), EmissionsError> {
    let legs = match &args.itinerary {
        Some(token) => itinerary::decode(token),
        None => vec![args.leg.to_leg()?],
    };
    if legs.is_empty() {
        return Err(EmissionsError::Validation("itinerary is empty".into()));
    }

    let mut url = timcalc::generate_calculator_url(&args.base, &legs)?;
    if let Some(version) = &args.model_version {
        url.query_pairs_mut()
            .append_pair(itinerary::MODEL_VERSION_URL_PARAM, version);
    }
    println!("{url}");

    if args.open {
        open::that(url.as_str())?;
    }
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<(), EmissionsError> {
    let mut config = ProxyConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let env_timeout = Config::from_env().timeout_secs();
    let options = FetchOptions {
        http_proxy: args.http_proxy,
        timeout: args.timeout.unwrap_or(env_timeout),
    };
    timcalc::proxy::serve(config, options).await
}

fn json_mode(command: &Commands) -> bool {
    match command {
        Commands::Flight(args) => args.output.json_mode(),
        Commands::Route(args) => args.output.json_mode(),
        Commands::Itinerary {
            command: ItineraryCommand::Decode { output, .. },
        } => output.json_mode(),
        _ => false,
    }
}

#[tokio::main]
async fn main() {
    timcalc::logging::init();

    let cli = Cli::parse();
    let json_mode = json_mode(&cli.command);

    let result = match cli.command {
        Commands::Flight(args) => run_flight(args).await,
        Commands::Route(args) => run_route(args).await,
        Commands::Itinerary { command } => run_itinerary(command),
        Commands::Url(args) => run_url(args),
        Commands::Serve(args) => run_serve(args).await,
        Commands::Mcp(args) => match args.source.client() {
            Ok(client) => timcalc::mcp::run(client).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        die(&e, json_mode);
    }
}
