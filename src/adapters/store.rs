use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db::{self, DbError};
use crate::domain::models::{
    AlertRecord, MetricsSnapshot, NewAlertRecord, NewStationRecord, StationPatch, StationRecord,
    StationStatus,
};
use crate::domain::projection::RowChange;

/// One change-feed event, tagged with the table it belongs to. Delivery is
/// at-least-once with no ordering guarantee across tables.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Station(RowChange<StationRecord>),
    Alert(RowChange<AlertRecord>),
    Metrics(RowChange<MetricsSnapshot>),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned")]
    LockPoisoned,
    #[error("store read failed: {0}")]
    Read(#[source] DbError),
    #[error("store write failed: {0}")]
    Write(#[source] DbError),
}

/// Table store handle that publishes every successful write on the change
/// feed. Cloning shares the underlying connection and feed sender.
#[derive(Clone)]
pub struct EventedStore {
    connection: Arc<Mutex<Connection>>,
    feed: Sender<ChangeEvent>,
}

impl EventedStore {
    pub fn new(connection: Arc<Mutex<Connection>>, feed: Sender<ChangeEvent>) -> Self {
        Self { connection, feed }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, DbError>,
        wrap: impl FnOnce(DbError) -> StoreError,
    ) -> Result<T, StoreError> {
        let connection = self.connection.lock().map_err(|_| StoreError::LockPoisoned)?;
        op(&connection).map_err(wrap)
    }

    fn read<T>(&self, op: impl FnOnce(&Connection) -> Result<T, DbError>) -> Result<T, StoreError> {
        self.with_connection(op, StoreError::Read)
    }

    fn write<T>(&self, op: impl FnOnce(&Connection) -> Result<T, DbError>) -> Result<T, StoreError> {
        self.with_connection(op, StoreError::Write)
    }

    /// Fire-and-forget publication; a missing subscriber is not an error.
    fn publish(&self, event: ChangeEvent) {
        if self.feed.send(event).is_err() {
            tracing::debug!("change feed has no subscriber, event dropped");
        }
    }

    pub fn list_stations(&self) -> Result<Vec<StationRecord>, StoreError> {
        self.read(db::list_stations)
    }

    pub fn get_station(&self, id: i64) -> Result<Option<StationRecord>, StoreError> {
        self.read(|connection| db::get_station(connection, id))
    }

    pub fn insert_station(
        &self,
        new_station: &NewStationRecord,
    ) -> Result<StationRecord, StoreError> {
        let inserted = self.write(|connection| {
            let id = db::insert_station(connection, new_station)?;
            db::get_station(connection, id)
        })?;

        let Some(inserted) = inserted else {
            return Err(StoreError::Write(DbError::Sqlite(
                rusqlite::Error::QueryReturnedNoRows,
            )));
        };

        self.publish(ChangeEvent::Station(RowChange::insert(inserted.clone())));
        Ok(inserted)
    }

    pub fn apply_station_patch(
        &self,
        id: i64,
        patch: &StationPatch,
    ) -> Result<Option<StationRecord>, StoreError> {
        let (old_row, new_row) = self.write(|connection| {
            let old_row = db::get_station(connection, id)?;
            db::apply_station_patch(connection, id, patch)?;
            let new_row = db::get_station(connection, id)?;
            Ok((old_row, new_row))
        })?;

        if let Some(new_row) = &new_row {
            self.publish(ChangeEvent::Station(RowChange::update(
                new_row.clone(),
                old_row,
            )));
        }

        Ok(new_row)
    }

    pub fn update_station_status(
        &self,
        id: i64,
        status: StationStatus,
        last_update: &str,
    ) -> Result<Option<StationRecord>, StoreError> {
        let (old_row, new_row) = self.write(|connection| {
            let old_row = db::get_station(connection, id)?;
            db::update_station_status(connection, id, status, last_update)?;
            let new_row = db::get_station(connection, id)?;
            Ok((old_row, new_row))
        })?;

        if let Some(new_row) = &new_row {
            self.publish(ChangeEvent::Station(RowChange::update(
                new_row.clone(),
                old_row,
            )));
        }

        Ok(new_row)
    }

    pub fn delete_station(&self, id: i64) -> Result<bool, StoreError> {
        let old_row = self.write(|connection| {
            let old_row = db::get_station(connection, id)?;
            db::delete_station(connection, id)?;
            Ok(old_row)
        })?;

        match old_row {
            Some(old_row) => {
                self.publish(ChangeEvent::Station(RowChange::delete(old_row)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn insert_alert(&self, new_alert: &NewAlertRecord) -> Result<AlertRecord, StoreError> {
        let inserted = self.write(|connection| {
            let id = db::insert_alert(connection, new_alert)?;
            db::get_alert(connection, id)
        })?;

        let Some(inserted) = inserted else {
            return Err(StoreError::Write(DbError::Sqlite(
                rusqlite::Error::QueryReturnedNoRows,
            )));
        };

        self.publish(ChangeEvent::Alert(RowChange::insert(inserted.clone())));
        Ok(inserted)
    }

    pub fn recent_alerts(&self, limit: u32) -> Result<Vec<AlertRecord>, StoreError> {
        self.read(|connection| db::list_recent_alerts(connection, limit))
    }

    pub fn mark_alert_read(&self, id: i64) -> Result<Option<AlertRecord>, StoreError> {
        let (old_row, new_row) = self.write(|connection| {
            let old_row = db::get_alert(connection, id)?;
            db::mark_alert_read(connection, id)?;
            let new_row = db::get_alert(connection, id)?;
            Ok((old_row, new_row))
        })?;

        if let Some(new_row) = &new_row {
            self.publish(ChangeEvent::Alert(RowChange::update(
                new_row.clone(),
                old_row,
            )));
        }

        Ok(new_row)
    }

    pub fn metrics(&self) -> Result<Option<MetricsSnapshot>, StoreError> {
        self.read(db::get_metrics)
    }

    pub fn insert_metrics(&self, snapshot: &MetricsSnapshot) -> Result<(), StoreError> {
        self.write(|connection| db::insert_metrics(connection, snapshot))?;
        self.publish(ChangeEvent::Metrics(RowChange::insert(snapshot.clone())));
        Ok(())
    }

    pub fn update_metrics(&self, snapshot: &MetricsSnapshot) -> Result<(), StoreError> {
        let old_row = self.write(|connection| {
            let old_row = db::get_metrics(connection)?;
            db::update_metrics(connection, snapshot)?;
            Ok(old_row)
        })?;

        self.publish(ChangeEvent::Metrics(RowChange::update(
            snapshot.clone(),
            old_row,
        )));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{Receiver, channel};
    use std::sync::{Arc, Mutex};

    use crate::domain::models::{NewAlertRecord, StationPatch, StationStatus};
    use crate::domain::perturb::{seed_metrics, seed_stations};
    use crate::domain::projection::ChangeKind;
    use crate::test_support::open_test_connection;

    use super::{ChangeEvent, EventedStore};

    fn evented_store(name: &str) -> (EventedStore, Receiver<ChangeEvent>) {
        let connection = open_test_connection(name);
        let (sender, receiver) = channel();
        (
            EventedStore::new(Arc::new(Mutex::new(connection)), sender),
            receiver,
        )
    }

    #[test]
    fn station_insert_publishes_insert_event_with_new_row() {
        let (store, feed) = evented_store("store-insert.sqlite");
        let seed = &seed_stations("2026-02-20T10:00:00.000Z")[0];

        let inserted = store.insert_station(seed).expect("insert should succeed");

        let ChangeEvent::Station(change) = feed.try_recv().expect("event should be published")
        else {
            panic!("expected a station event");
        };
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.new_row, Some(inserted));
        assert_eq!(change.old_row, None);
    }

    #[test]
    fn station_patch_publishes_update_event_with_old_and_new_rows() {
        let (store, feed) = evented_store("store-patch.sqlite");
        let seed = &seed_stations("2026-02-20T10:00:00.000Z")[0];
        let inserted = store.insert_station(seed).expect("insert should succeed");
        feed.try_recv().expect("insert event should be published");

        let patch = StationPatch {
            status: StationStatus::Offline,
            available: 2,
            efficiency: 17,
            current_power: "0 kW".to_string(),
            session_time: "0 min".to_string(),
            last_update: "2026-02-20T10:05:00.000Z".to_string(),
        };
        let updated = store
            .apply_station_patch(inserted.id, &patch)
            .expect("patch should succeed")
            .expect("station should exist");

        let ChangeEvent::Station(change) = feed.try_recv().expect("event should be published")
        else {
            panic!("expected a station event");
        };
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.old_row, Some(inserted));
        assert_eq!(change.new_row, Some(updated.clone()));
        assert_eq!(updated.status, StationStatus::Offline);
    }

    #[test]
    fn station_delete_publishes_delete_event_with_old_row() {
        let (store, feed) = evented_store("store-delete.sqlite");
        let seed = &seed_stations("2026-02-20T10:00:00.000Z")[0];
        let inserted = store.insert_station(seed).expect("insert should succeed");
        feed.try_recv().expect("insert event should be published");

        assert!(store.delete_station(inserted.id).expect("delete should succeed"));

        let ChangeEvent::Station(change) = feed.try_recv().expect("event should be published")
        else {
            panic!("expected a station event");
        };
        assert_eq!(change.kind, ChangeKind::Delete);
        assert_eq!(change.old_row, Some(inserted));
        assert_eq!(change.new_row, None);
    }

    #[test]
    fn deleting_missing_station_publishes_nothing() {
        let (store, feed) = evented_store("store-delete-missing.sqlite");

        assert!(!store.delete_station(42).expect("delete should succeed"));
        assert!(feed.try_recv().is_err());
    }

    #[test]
    fn patching_missing_station_publishes_nothing() {
        let (store, feed) = evented_store("store-patch-missing.sqlite");

        let patch = StationPatch {
            status: StationStatus::Active,
            available: 1,
            efficiency: 10,
            current_power: "1.0 kW".to_string(),
            session_time: "5 min".to_string(),
            last_update: "2026-02-20T10:05:00.000Z".to_string(),
        };
        let updated = store.apply_station_patch(42, &patch).expect("patch should succeed");
        assert!(updated.is_none());
        assert!(feed.try_recv().is_err());
    }

    #[test]
    fn alert_lifecycle_publishes_insert_then_update() {
        let (store, feed) = evented_store("store-alerts.sqlite");

        let inserted = store
            .insert_alert(&NewAlertRecord {
                category: crate::domain::models::AlertCategory::Warning,
                message: "Peak charging hours detected".to_string(),
                location: "Mumbai".to_string(),
                created_at: "2026-02-20T10:00:00.000Z".to_string(),
            })
            .expect("insert should succeed");
        assert!(!inserted.is_read);

        let dismissed = store
            .mark_alert_read(inserted.id)
            .expect("update should succeed")
            .expect("alert should exist");
        assert!(dismissed.is_read);

        let ChangeEvent::Alert(insert) = feed.try_recv().expect("insert event") else {
            panic!("expected an alert event");
        };
        assert_eq!(insert.kind, ChangeKind::Insert);

        let ChangeEvent::Alert(update) = feed.try_recv().expect("update event") else {
            panic!("expected an alert event");
        };
        assert_eq!(update.kind, ChangeKind::Update);
        assert_eq!(update.old_row, Some(inserted));
        assert_eq!(update.new_row, Some(dismissed));
    }

    #[test]
    fn metrics_updates_publish_snapshot_events() {
        let (store, feed) = evented_store("store-metrics.sqlite");
        let seed = seed_metrics();

        store.insert_metrics(&seed).expect("insert should succeed");
        let mut walked = seed.clone();
        walked.active_sessions = 999;
        store.update_metrics(&walked).expect("update should succeed");

        let ChangeEvent::Metrics(insert) = feed.try_recv().expect("insert event") else {
            panic!("expected a metrics event");
        };
        assert_eq!(insert.kind, ChangeKind::Insert);

        let ChangeEvent::Metrics(update) = feed.try_recv().expect("update event") else {
            panic!("expected a metrics event");
        };
        assert_eq!(update.kind, ChangeKind::Update);
        assert_eq!(update.old_row, Some(seed));
        assert_eq!(update.new_row, Some(walked));
    }

    #[test]
    fn writes_survive_a_dropped_subscriber() {
        let (store, feed) = evented_store("store-dropped-feed.sqlite");
        drop(feed);

        let seed = &seed_stations("2026-02-20T10:00:00.000Z")[0];
        let inserted = store.insert_station(seed).expect("insert should succeed");
        assert_eq!(inserted.name, seed.name);
    }
}
