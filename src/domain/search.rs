use crate::domain::models::{StationRecord, StationStatus};

const KNOWN_LOCATIONS: [&str; 6] = [
    "mumbai",
    "delhi",
    "bangalore",
    "pune",
    "chennai",
    "hyderabad",
];

const KNOWN_CHARGER_TYPES: [&str; 3] = ["ultra", "fast", "standard"];

/// Filters extracted from a free-text station query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub location: Option<String>,
    pub charger_type: Option<String>,
    pub status: Option<StationStatus>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.charger_type.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub stations: Vec<StationRecord>,
    pub explanation: String,
}

/// Extracts known keywords from a query. Matching is substring-based over a
/// fixed vocabulary; unrecognized words are ignored.
pub fn parse_query(query: &str) -> SearchFilters {
    let query = query.to_lowercase();
    let mut filters = SearchFilters::default();

    filters.location = KNOWN_LOCATIONS
        .iter()
        .find(|location| query.contains(*location))
        .map(|location| (*location).to_string());

    // "fast" is a substring of "ultra fast", so check the more specific
    // charger type first.
    filters.charger_type = KNOWN_CHARGER_TYPES
        .iter()
        .find(|charger_type| query.contains(*charger_type))
        .map(|charger_type| (*charger_type).to_string());

    filters.status = if query.contains("available") || query.contains("active") {
        Some(StationStatus::Active)
    } else if query.contains("maintenance") {
        Some(StationStatus::Maintenance)
    } else if query.contains("offline") {
        Some(StationStatus::Offline)
    } else {
        None
    };

    filters
}

/// Applies parsed filters to a station slice and explains what was matched.
pub fn search(query: &str, stations: &[StationRecord]) -> SearchOutcome {
    let filters = parse_query(query);

    let matches: Vec<StationRecord> = stations
        .iter()
        .filter(|station| {
            filters
                .location
                .as_ref()
                .is_none_or(|location| station.location.to_lowercase().contains(location))
                && filters
                    .charger_type
                    .as_ref()
                    .is_none_or(|charger_type| {
                        station.charger_type.to_lowercase().contains(charger_type)
                    })
                && filters.status.is_none_or(|status| station.status == status)
        })
        .cloned()
        .collect();

    SearchOutcome {
        explanation: explain(&filters, matches.len()),
        stations: matches,
    }
}

fn explain(filters: &SearchFilters, matched: usize) -> String {
    if filters.is_empty() {
        return format!("No known keywords recognized; showing all {matched} stations");
    }

    let mut parts = Vec::new();
    if let Some(location) = &filters.location {
        parts.push(format!("location '{location}'"));
    }
    if let Some(charger_type) = &filters.charger_type {
        parts.push(format!("charger type '{charger_type}'"));
    }
    if let Some(status) = filters.status {
        parts.push(format!("status '{status}'"));
    }

    format!("Matched {matched} stations by {}", parts.join(", "))
}
