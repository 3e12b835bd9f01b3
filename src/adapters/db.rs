use rusqlite::{Connection, Row, params};
use thiserror::Error;

use crate::domain::models::{
    AlertCategory, AlertRecord, MetricsSnapshot, NewAlertRecord, NewStationRecord, StationPatch,
    StationRecord, StationStatus,
};

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS stations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    location TEXT NOT NULL,
    status TEXT NOT NULL,
    available INTEGER NOT NULL,
    total INTEGER NOT NULL,
    current_power TEXT NOT NULL,
    session_time TEXT NOT NULL,
    efficiency INTEGER NOT NULL,
    last_update TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    price TEXT NOT NULL,
    charger_type TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stations_last_update_desc
ON stations (last_update DESC);

CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    message TEXT NOT NULL,
    location TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_alerts_created_at_desc
ON alerts (created_at DESC);

CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    active_sessions INTEGER NOT NULL,
    total_power TEXT NOT NULL,
    network_uptime TEXT NOT NULL,
    avg_response_time TEXT NOT NULL,
    total_stations INTEGER NOT NULL,
    online_stations INTEGER NOT NULL
);
"#,
)];

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
    #[error("invalid stored value: {0}")]
    InvalidStoredValue(#[from] crate::domain::models::UnknownVariant),
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::from)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

const STATION_COLUMNS: &str = "id, name, location, status, available, total, current_power, \
     session_time, efficiency, last_update, latitude, longitude, price, charger_type";

fn station_from_row(row: &Row<'_>) -> Result<StationRecord, DbError> {
    let status: String = row.get(3)?;
    Ok(StationRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        status: status.parse::<StationStatus>()?,
        available: row.get(4)?,
        total: row.get(5)?,
        current_power: row.get(6)?,
        session_time: row.get(7)?,
        efficiency: row.get(8)?,
        last_update: row.get(9)?,
        latitude: row.get(10)?,
        longitude: row.get(11)?,
        price: row.get(12)?,
        charger_type: row.get(13)?,
    })
}

pub fn insert_station(
    connection: &Connection,
    new_station: &NewStationRecord,
) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO stations (name, location, status, available, total, current_power, \
         session_time, efficiency, last_update, latitude, longitude, price, charger_type) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            new_station.name,
            new_station.location,
            new_station.status.as_str(),
            new_station.available,
            new_station.total,
            new_station.current_power,
            new_station.session_time,
            new_station.efficiency,
            new_station.last_update,
            new_station.latitude,
            new_station.longitude,
            new_station.price,
            new_station.charger_type,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn get_station(connection: &Connection, id: i64) -> Result<Option<StationRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {STATION_COLUMNS} FROM stations WHERE id = ?1"
    ))?;

    let mut rows = statement.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(station_from_row(row)?)),
        None => Ok(None),
    }
}

/// All stations, most recently updated first.
pub fn list_stations(connection: &Connection) -> Result<Vec<StationRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {STATION_COLUMNS} FROM stations ORDER BY last_update DESC, id DESC"
    ))?;

    let mut rows = statement.query([])?;
    let mut stations = Vec::new();
    while let Some(row) = rows.next()? {
        stations.push(station_from_row(row)?);
    }

    Ok(stations)
}

/// Idempotent overwrite of the simulated fields, keyed by id.
pub fn apply_station_patch(
    connection: &Connection,
    id: i64,
    patch: &StationPatch,
) -> Result<usize, DbError> {
    let updated = connection.execute(
        "UPDATE stations SET status = ?1, available = ?2, efficiency = ?3, current_power = ?4, \
         session_time = ?5, last_update = ?6 WHERE id = ?7",
        params![
            patch.status.as_str(),
            patch.available,
            patch.efficiency,
            patch.current_power,
            patch.session_time,
            patch.last_update,
            id,
        ],
    )?;

    Ok(updated)
}

pub fn update_station_status(
    connection: &Connection,
    id: i64,
    status: StationStatus,
    last_update: &str,
) -> Result<usize, DbError> {
    let updated = connection.execute(
        "UPDATE stations SET status = ?1, last_update = ?2 WHERE id = ?3",
        params![status.as_str(), last_update, id],
    )?;

    Ok(updated)
}

pub fn delete_station(connection: &Connection, id: i64) -> Result<usize, DbError> {
    let deleted = connection.execute("DELETE FROM stations WHERE id = ?1", params![id])?;
    Ok(deleted)
}

fn alert_from_row(row: &Row<'_>) -> Result<AlertRecord, DbError> {
    let category: String = row.get(1)?;
    Ok(AlertRecord {
        id: row.get(0)?,
        category: category.parse::<AlertCategory>()?,
        message: row.get(2)?,
        location: row.get(3)?,
        created_at: row.get(4)?,
        is_read: row.get(5)?,
    })
}

pub fn insert_alert(connection: &Connection, new_alert: &NewAlertRecord) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO alerts (category, message, location, created_at, is_read) \
         VALUES (?1, ?2, ?3, ?4, 0)",
        params![
            new_alert.category.as_str(),
            new_alert.message,
            new_alert.location,
            new_alert.created_at,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn get_alert(connection: &Connection, id: i64) -> Result<Option<AlertRecord>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, category, message, location, created_at, is_read FROM alerts WHERE id = ?1",
    )?;

    let mut rows = statement.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(alert_from_row(row)?)),
        None => Ok(None),
    }
}

/// Most recent alerts first.
pub fn list_recent_alerts(connection: &Connection, limit: u32) -> Result<Vec<AlertRecord>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, category, message, location, created_at, is_read FROM alerts \
         ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;

    let mut rows = statement.query(params![i64::from(limit)])?;
    let mut alerts = Vec::new();
    while let Some(row) = rows.next()? {
        alerts.push(alert_from_row(row)?);
    }

    Ok(alerts)
}

pub fn mark_alert_read(connection: &Connection, id: i64) -> Result<usize, DbError> {
    let updated = connection.execute("UPDATE alerts SET is_read = 1 WHERE id = ?1", params![id])?;
    Ok(updated)
}

fn metrics_from_row(row: &Row<'_>) -> Result<MetricsSnapshot, DbError> {
    Ok(MetricsSnapshot {
        id: row.get(0)?,
        active_sessions: row.get(1)?,
        total_power: row.get(2)?,
        network_uptime: row.get(3)?,
        avg_response_time: row.get(4)?,
        total_stations: row.get(5)?,
        online_stations: row.get(6)?,
    })
}

pub fn get_metrics(connection: &Connection) -> Result<Option<MetricsSnapshot>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, active_sessions, total_power, network_uptime, avg_response_time, \
         total_stations, online_stations FROM metrics WHERE id = 1",
    )?;

    let mut rows = statement.query([])?;
    match rows.next()? {
        Some(row) => Ok(Some(metrics_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn insert_metrics(connection: &Connection, snapshot: &MetricsSnapshot) -> Result<(), DbError> {
    connection.execute(
        "INSERT INTO metrics (id, active_sessions, total_power, network_uptime, \
         avg_response_time, total_stations, online_stations) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            snapshot.id,
            snapshot.active_sessions,
            snapshot.total_power,
            snapshot.network_uptime,
            snapshot.avg_response_time,
            snapshot.total_stations,
            snapshot.online_stations,
        ],
    )?;

    Ok(())
}

/// Overwrites the single snapshot row in place.
pub fn update_metrics(connection: &Connection, snapshot: &MetricsSnapshot) -> Result<usize, DbError> {
    let updated = connection.execute(
        "UPDATE metrics SET active_sessions = ?1, total_power = ?2, network_uptime = ?3, \
         avg_response_time = ?4, total_stations = ?5, online_stations = ?6 WHERE id = ?7",
        params![
            snapshot.active_sessions,
            snapshot.total_power,
            snapshot.network_uptime,
            snapshot.avg_response_time,
            snapshot.total_stations,
            snapshot.online_stations,
            snapshot.id,
        ],
    )?;

    Ok(updated)
}
