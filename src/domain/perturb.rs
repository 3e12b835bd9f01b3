use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::models::{
    AlertCategory, MetricsSnapshot, NewAlertRecord, NewStationRecord, StationPatch, StationRecord,
    StationStatus, leading_number,
};

/// Probability that one perturbation reassigns the station status.
const STATUS_FLIP_PROBABILITY: f64 = 0.1;
/// Probability that one alert cycle produces an alert.
const ALERT_PROBABILITY: f64 = 0.3;

const POWER_DELTA_KW: f64 = 10.0;
const SESSION_MINUTES_MAX: i64 = 60;

const SESSIONS_DELTA: i64 = 50;
const SESSIONS_MIN: i64 = 800;
const SESSIONS_MAX: i64 = 2000;
const POWER_DELTA_MW: f64 = 2.5;
const UPTIME_DELTA: f64 = 0.25;
const UPTIME_MIN: f64 = 95.0;
const UPTIME_MAX: f64 = 100.0;
const RESPONSE_DELTA: f64 = 0.25;
const RESPONSE_MIN: f64 = 1.0;
const RESPONSE_MAX: f64 = 5.0;

const ALERT_LOCATIONS: [&str; 6] = [
    "Mumbai",
    "Delhi",
    "Bangalore",
    "Pune",
    "Chennai",
    "Hyderabad",
];

const ALERT_MESSAGES: [&str; 10] = [
    "Station maintenance scheduled for tomorrow",
    "New charging station added to network",
    "Network efficiency improved by 2%",
    "Power outage detected at Cyber City Station",
    "Peak charging hours detected",
    "Battery optimization completed",
    "Emergency maintenance required",
    "New ultra-fast charger installed",
    "Traffic congestion detected near station",
    "Weather alert: Heavy rain affecting charging",
];

/// Applies one bounded random perturbation to a station.
///
/// Holds `0 <= available <= total` and recomputes the efficiency percentage
/// from the clamped availability. Power and session time follow the
/// (possibly reassigned) status: a non-active station draws no power and has
/// no running session.
pub fn perturb_station<R: Rng>(station: &StationRecord, rng: &mut R, now: &str) -> StationPatch {
    let mut status = station.status;
    if rng.r#gen::<f64>() < STATUS_FLIP_PROBABILITY {
        status = *StationStatus::ALL
            .choose(rng)
            .unwrap_or(&StationStatus::Active);
    }

    let delta = rng.gen_range(-1_i64..=1);
    let available = (station.available + delta).clamp(0, station.total.max(0));
    let efficiency = if station.total > 0 {
        ((available as f64 / station.total as f64) * 100.0).round() as i64
    } else {
        0
    };

    let current_power = if status == StationStatus::Active {
        let previous = leading_number(&station.current_power).unwrap_or(0.0);
        let next = (previous + rng.gen_range(-POWER_DELTA_KW..=POWER_DELTA_KW)).max(0.0);
        format!("{next:.1} kW")
    } else {
        "0 kW".to_string()
    };

    let session_time = if status == StationStatus::Active && available < station.total {
        format!("{} min", rng.gen_range(1..=SESSION_MINUTES_MAX))
    } else {
        "0 min".to_string()
    };

    StationPatch {
        status,
        available,
        efficiency,
        current_power,
        session_time,
        last_update: now.to_string(),
    }
}

/// Rolls for a synthetic alert; roughly 30% of cycles produce one.
pub fn roll_alert<R: Rng>(rng: &mut R, now: &str) -> Option<NewAlertRecord> {
    if rng.r#gen::<f64>() >= ALERT_PROBABILITY {
        return None;
    }

    Some(NewAlertRecord {
        category: *AlertCategory::ALL.choose(rng).unwrap_or(&AlertCategory::Info),
        message: ALERT_MESSAGES
            .choose(rng)
            .copied()
            .unwrap_or(ALERT_MESSAGES[0])
            .to_string(),
        location: ALERT_LOCATIONS
            .choose(rng)
            .copied()
            .unwrap_or(ALERT_LOCATIONS[0])
            .to_string(),
        created_at: now.to_string(),
    })
}

/// One step of the bounded random walk over the network-wide metrics row.
pub fn walk_metrics<R: Rng>(current: &MetricsSnapshot, rng: &mut R) -> MetricsSnapshot {
    let active_sessions = (current.active_sessions + rng.gen_range(-SESSIONS_DELTA..=SESSIONS_DELTA))
        .clamp(SESSIONS_MIN, SESSIONS_MAX);

    let total_power_mw = leading_number(&current.total_power).unwrap_or(0.0)
        + rng.gen_range(-POWER_DELTA_MW..=POWER_DELTA_MW);

    let network_uptime = (leading_number(&current.network_uptime).unwrap_or(UPTIME_MAX)
        + rng.gen_range(-UPTIME_DELTA..=UPTIME_DELTA))
    .clamp(UPTIME_MIN, UPTIME_MAX);

    let avg_response_time = (leading_number(&current.avg_response_time).unwrap_or(RESPONSE_MIN)
        + rng.gen_range(-RESPONSE_DELTA..=RESPONSE_DELTA))
    .clamp(RESPONSE_MIN, RESPONSE_MAX);

    let online_stations = (current.online_stations + rng.gen_range(-1_i64..=1)).max(0);

    MetricsSnapshot {
        id: current.id,
        active_sessions,
        total_power: format!("{total_power_mw:.1} MW"),
        network_uptime: format!("{network_uptime:.1}%"),
        avg_response_time: format!("{avg_response_time:.1}s"),
        total_stations: current.total_stations,
        online_stations,
    }
}

/// Bootstrap station set written when the store holds no stations.
pub fn seed_stations(now: &str) -> Vec<NewStationRecord> {
    let station = |name: &str,
                   location: &str,
                   available: i64,
                   total: i64,
                   power: &str,
                   session: &str,
                   efficiency: i64,
                   latitude: f64,
                   longitude: f64,
                   price: &str,
                   charger_type: &str| NewStationRecord {
        name: name.to_string(),
        location: location.to_string(),
        status: StationStatus::Active,
        available,
        total,
        current_power: power.to_string(),
        session_time: session.to_string(),
        efficiency,
        last_update: now.to_string(),
        latitude: Some(latitude),
        longitude: Some(longitude),
        price: price.to_string(),
        charger_type: charger_type.to_string(),
    };

    vec![
        station(
            "Phoenix Mall Hub",
            "Mumbai",
            8,
            12,
            "45.2 kW",
            "32 min",
            67,
            19.0760,
            72.8777,
            "₹15/kWh",
            "Fast Charging",
        ),
        station(
            "Cyber City Station",
            "Bangalore",
            15,
            20,
            "67.8 kW",
            "45 min",
            75,
            12.9716,
            77.5946,
            "₹18/kWh",
            "Ultra Fast",
        ),
        station(
            "Khan Market Charging",
            "Delhi",
            3,
            8,
            "18.7 kW",
            "28 min",
            37,
            28.7041,
            77.1025,
            "₹12/kWh",
            "Standard",
        ),
        station(
            "Express Highway",
            "Pune",
            22,
            30,
            "89.3 kW",
            "52 min",
            73,
            18.5204,
            73.8567,
            "₹16/kWh",
            "Fast Charging",
        ),
    ]
}

/// Bootstrap metrics row written when the store holds no snapshot.
pub fn seed_metrics() -> MetricsSnapshot {
    MetricsSnapshot {
        id: 1,
        active_sessions: 1247,
        total_power: "45.2 MW".to_string(),
        network_uptime: "99.7%".to_string(),
        avg_response_time: "2.3s".to_string(),
        total_stations: 1247,
        online_stations: 1234,
    }
}
