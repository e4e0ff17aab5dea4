use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};

use crate::attribution::{AttributionRow, ATTRIBUTION_HEADERS};
use crate::calculator::LegLink;
use crate::itinerary;
use crate::model::FlightLeg;
use crate::transform::{BreakdownRow, BreakdownTable};
use crate::validate::LegInput;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn row_cells(row: &BreakdownRow, indent: &str) -> Vec<Cell> {
    let mut cells = vec![Cell::new(format!("{indent}{}", row.label))];
    cells.extend(row.cells.iter().map(Cell::new));
    if row.muted {
        cells = cells.into_iter().map(|c| c.add_attribute(Attribute::Dim)).collect();
    }
    cells
}

pub fn render_breakdown(breakdown: &BreakdownTable) -> String {
    let mut table = new_table();
    table.set_header(breakdown.headers.to_vec());

    for row in &breakdown.rows {
        table.add_row(row_cells(row, ""));
        for child in &row.children {
            table.add_row(row_cells(child, "  "));
        }
    }

    table.to_string()
}

pub fn render_attribution(rows: &[AttributionRow]) -> String {
    let mut table = new_table();
    table.set_header(ATTRIBUTION_HEADERS.to_vec());

    for row in rows {
        let sources: Vec<String> = row
            .citations
            .iter()
            .map(|c| {
                if c.note.is_empty() {
                    format!("{} ({})", c.text, c.href)
                } else {
                    format!("{}, {} ({})", c.text, c.note, c.href)
                }
            })
            .collect();
        table.add_row(vec![row.title.to_string(), sources.join("\n")]);
    }

    table.to_string()
}

pub fn render_legs(links: &[LegLink]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Flight", "Details", "Emissions Details"]);

    for link in links {
        table.add_row(vec![
            link.title.as_str(),
            link.subtitle.as_str(),
            link.href.as_str(),
        ]);
    }

    table.to_string()
}

pub fn render_itinerary(legs: &[FlightLeg], today: NaiveDate) -> String {
    let mut table = new_table();
    table.set_header(vec!["#", "Origin", "Destination", "Carrier", "Flight", "Date", "Problems"]);

    for (i, leg) in legs.iter().enumerate() {
        let problems = LegInput::from_leg(leg).problems_on(today);
        let date = itinerary::format_date_token(leg.departure_date, today);
        table.add_row(vec![
            (i + 1).to_string(),
            leg.origin.clone(),
            leg.destination.clone(),
            leg.operating_carrier_code.clone(),
            leg.flight_number.clone(),
            date,
            if problems.is_empty() {
                "-".to_string()
            } else {
                problems.join("\n")
            },
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmissionsPerPax;
    use crate::transform::{self, FormatMode};

    #[test]
    fn route_table_renders_headers_and_values() {
        let typical = EmissionsPerPax {
            economy: Some(366.84),
            ..Default::default()
        };
        let out = render_breakdown(&transform::route_table(&typical, FormatMode::Precise).unwrap());
        assert!(out.contains("Premium"));
        assert!(out.contains("366.8"));
        assert!(out.contains("XX"));
    }
}
