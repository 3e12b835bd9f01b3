use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a charging station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Active,
    Maintenance,
    Offline,
}

impl StationStatus {
    pub const ALL: [StationStatus; 3] = [
        StationStatus::Active,
        StationStatus::Maintenance,
        StationStatus::Offline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StationStatus::Active => "active",
            StationStatus::Maintenance => "maintenance",
            StationStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StationStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(StationStatus::Active),
            "maintenance" => Ok(StationStatus::Maintenance),
            "offline" => Ok(StationStatus::Offline),
            other => Err(UnknownVariant {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Warning,
    Info,
    Success,
    Error,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 4] = [
        AlertCategory::Warning,
        AlertCategory::Info,
        AlertCategory::Success,
        AlertCategory::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlertCategory::Warning => "warning",
            AlertCategory::Info => "info",
            AlertCategory::Success => "success",
            AlertCategory::Error => "error",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertCategory {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "warning" => Ok(AlertCategory::Warning),
            "info" => Ok(AlertCategory::Info),
            "success" => Ok(AlertCategory::Success),
            "error" => Ok(AlertCategory::Error),
            other => Err(UnknownVariant {
                field: "category",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} value: {value}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub status: StationStatus,
    pub available: i64,
    pub total: i64,
    pub current_power: String,
    pub session_time: String,
    pub efficiency: i64,
    pub last_update: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: String,
    pub charger_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStationRecord {
    pub name: String,
    pub location: String,
    pub status: StationStatus,
    pub available: i64,
    pub total: i64,
    pub current_power: String,
    pub session_time: String,
    pub efficiency: i64,
    pub last_update: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: String,
    pub charger_type: String,
}

/// Fields a simulated perturbation writes back to one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationPatch {
    pub status: StationStatus,
    pub available: i64,
    pub efficiency: i64,
    pub current_power: String,
    pub session_time: String,
    pub last_update: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: i64,
    pub category: AlertCategory,
    pub message: String,
    pub location: String,
    pub created_at: String,
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAlertRecord {
    pub category: AlertCategory,
    pub message: String,
    pub location: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub id: i64,
    pub active_sessions: i64,
    pub total_power: String,
    pub network_uptime: String,
    pub avg_response_time: String,
    pub total_stations: i64,
    pub online_stations: i64,
}

/// Parses the numeric prefix of a unit-tagged value such as `"45.2 kW"`,
/// `"99.7%"` or `"2.3s"`.
pub fn leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let end = trimmed
        .char_indices()
        .take_while(|(index, character)| {
            character.is_ascii_digit() || *character == '.' || (*index == 0 && *character == '-')
        })
        .map(|(index, character)| index + character.len_utf8())
        .last()?;
    trimmed[..end].parse().ok()
}
