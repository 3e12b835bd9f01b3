use crate::domain::models::{
    AlertCategory, AlertRecord, MetricsSnapshot, StationRecord, StationStatus,
};

/// Kind of a row-level change delivered by the store's change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change. Inserts and updates carry the new row, deletes carry
/// the old one; the feed is at-least-once, so a payload may arrive more than
/// once and handlers must tolerate replay.
#[derive(Debug, Clone, PartialEq)]
pub struct RowChange<T> {
    pub kind: ChangeKind,
    pub new_row: Option<T>,
    pub old_row: Option<T>,
}

impl<T> RowChange<T> {
    pub fn insert(new_row: T) -> Self {
        Self {
            kind: ChangeKind::Insert,
            new_row: Some(new_row),
            old_row: None,
        }
    }

    pub fn update(new_row: T, old_row: Option<T>) -> Self {
        Self {
            kind: ChangeKind::Update,
            new_row: Some(new_row),
            old_row,
        }
    }

    pub fn delete(old_row: T) -> Self {
        Self {
            kind: ChangeKind::Delete,
            new_row: None,
            old_row: Some(old_row),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Default,
    Destructive,
}

/// User-facing toast payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Fire-and-forget receiver for user-facing notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sink that forwards notifications to the log.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Destructive => tracing::warn!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            ),
            Severity::Default => tracing::info!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    NeverAttached,
    Connected,
    Lost,
}

/// In-memory projection of the live tables, most recent first.
#[derive(Debug, Clone, Default)]
pub struct LiveView {
    pub stations: Vec<StationRecord>,
    pub alerts: Vec<AlertRecord>,
    pub metrics: Option<MetricsSnapshot>,
    pub connection: ConnectionState,
}

impl LiveView {
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Folds one station change into the projection. A status change on
    /// update is surfaced through the sink, destructive unless the station
    /// came back to `active`.
    pub fn apply_station_change(
        &mut self,
        change: &RowChange<StationRecord>,
        sink: &dyn NotificationSink,
    ) {
        match change.kind {
            ChangeKind::Insert => {
                if let Some(new_row) = &change.new_row {
                    self.stations.insert(0, new_row.clone());
                }
            }
            ChangeKind::Update => {
                let Some(new_row) = &change.new_row else {
                    return;
                };
                let Some(held) = self
                    .stations
                    .iter_mut()
                    .find(|station| station.id == new_row.id)
                else {
                    return;
                };

                let previous_status = held.status;
                *held = new_row.clone();

                if previous_status != new_row.status {
                    sink.notify(station_status_notification(new_row));
                }
            }
            ChangeKind::Delete => {
                if let Some(old_row) = &change.old_row {
                    self.stations.retain(|station| station.id != old_row.id);
                }
            }
        }
    }

    /// Folds one alert change into the projection. New alerts are announced
    /// through the sink before being prepended.
    pub fn apply_alert_change(
        &mut self,
        change: &RowChange<AlertRecord>,
        sink: &dyn NotificationSink,
    ) {
        match change.kind {
            ChangeKind::Insert => {
                if let Some(new_row) = &change.new_row {
                    sink.notify(alert_notification(new_row));
                    self.alerts.insert(0, new_row.clone());
                }
            }
            ChangeKind::Update => {
                let Some(new_row) = &change.new_row else {
                    return;
                };
                if let Some(held) = self.alerts.iter_mut().find(|alert| alert.id == new_row.id) {
                    *held = new_row.clone();
                }
            }
            ChangeKind::Delete => {
                // Delete payloads only carry the removed row.
                if let Some(old_row) = &change.old_row {
                    self.alerts.retain(|alert| alert.id != old_row.id);
                }
            }
        }
    }

    pub fn apply_metrics_change(&mut self, change: &RowChange<MetricsSnapshot>) {
        if let Some(new_row) = &change.new_row {
            self.metrics = Some(new_row.clone());
        }
    }

    /// Local half of alert dismissal; applied regardless of whether the
    /// matching store write succeeds.
    pub fn mark_alert_read(&mut self, alert_id: i64) {
        if let Some(alert) = self.alerts.iter_mut().find(|alert| alert.id == alert_id) {
            alert.is_read = true;
        }
    }
}

fn station_status_notification(station: &StationRecord) -> Notification {
    Notification {
        title: format!("Station {}", station.name),
        description: format!("Status changed to {}", station.status),
        severity: if station.status == StationStatus::Active {
            Severity::Default
        } else {
            Severity::Destructive
        },
    }
}

fn alert_notification(alert: &AlertRecord) -> Notification {
    let (title, severity) = match alert.category {
        AlertCategory::Warning => ("Warning", Severity::Destructive),
        AlertCategory::Error => ("Error", Severity::Destructive),
        AlertCategory::Info | AlertCategory::Success => ("Info", Severity::Default),
    };

    Notification {
        title: title.to_string(),
        description: alert.message.clone(),
        severity,
    }
}

#[cfg(test)]
pub(crate) mod test_sink {
    use std::sync::Mutex;

    use super::{Notification, NotificationSink};

    /// Records every notification for assertion.
    #[derive(Default)]
    pub struct RecordingSink {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        pub fn take(&self) -> Vec<Notification> {
            std::mem::take(&mut self.notifications.lock().expect("sink lock should be usable"))
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.notifications
                .lock()
                .expect("sink lock should be usable")
                .push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::models::{AlertCategory, AlertRecord, StationRecord, StationStatus};

    use super::test_sink::RecordingSink;
    use super::{LiveView, RowChange, Severity};

    fn station(id: i64, name: &str, status: StationStatus) -> StationRecord {
        StationRecord {
            id,
            name: name.to_string(),
            location: "Mumbai".to_string(),
            status,
            available: 5,
            total: 10,
            current_power: "45.2 kW".to_string(),
            session_time: "32 min".to_string(),
            efficiency: 50,
            last_update: "2026-02-20T10:00:00.000Z".to_string(),
            latitude: None,
            longitude: None,
            price: "₹15/kWh".to_string(),
            charger_type: "Fast Charging".to_string(),
        }
    }

    fn alert(id: i64, category: AlertCategory) -> AlertRecord {
        AlertRecord {
            id,
            category,
            message: "Peak charging hours detected".to_string(),
            location: "Pune".to_string(),
            created_at: "2026-02-20T10:00:00.000Z".to_string(),
            is_read: false,
        }
    }

    #[test]
    fn station_inserts_prepend_most_recent_first() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();

        view.apply_station_change(&RowChange::insert(station(1, "A", StationStatus::Active)), &sink);
        view.apply_station_change(&RowChange::insert(station(2, "B", StationStatus::Active)), &sink);

        let names: Vec<&str> = view.stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn station_update_replaces_in_place_and_preserves_position() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_station_change(&RowChange::insert(station(1, "A", StationStatus::Active)), &sink);
        view.apply_station_change(&RowChange::insert(station(2, "B", StationStatus::Active)), &sink);

        let mut updated = station(1, "A", StationStatus::Active);
        updated.available = 7;
        view.apply_station_change(
            &RowChange::update(updated, Some(station(1, "A", StationStatus::Active))),
            &sink,
        );

        assert_eq!(view.stations[1].id, 1);
        assert_eq!(view.stations[1].available, 7);
        assert_eq!(view.stations.len(), 2);
    }

    #[test]
    fn station_update_is_idempotent_under_replay() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_station_change(&RowChange::insert(station(1, "A", StationStatus::Active)), &sink);

        let change = RowChange::update(
            station(1, "A", StationStatus::Maintenance),
            Some(station(1, "A", StationStatus::Active)),
        );
        view.apply_station_change(&change, &sink);
        let after_once = view.stations.clone();
        view.apply_station_change(&change, &sink);

        assert_eq!(view.stations, after_once);
        // Replay does not duplicate the status-change notification either.
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn status_change_to_offline_notifies_destructively() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_station_change(
            &RowChange::insert(station(1, "Phoenix Mall Hub", StationStatus::Active)),
            &sink,
        );
        sink.take();

        view.apply_station_change(
            &RowChange::update(
                station(1, "Phoenix Mall Hub", StationStatus::Offline),
                Some(station(1, "Phoenix Mall Hub", StationStatus::Active)),
            ),
            &sink,
        );

        let notifications = sink.take();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Station Phoenix Mall Hub");
        assert_eq!(notifications[0].description, "Status changed to offline");
        assert_eq!(notifications[0].severity, Severity::Destructive);
    }

    #[test]
    fn status_change_back_to_active_notifies_with_default_severity() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_station_change(
            &RowChange::insert(station(1, "A", StationStatus::Offline)),
            &sink,
        );

        view.apply_station_change(
            &RowChange::update(
                station(1, "A", StationStatus::Active),
                Some(station(1, "A", StationStatus::Offline)),
            ),
            &sink,
        );

        let notifications = sink.take();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Default);
    }

    #[test]
    fn update_for_unknown_station_leaves_projection_unchanged() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_station_change(&RowChange::insert(station(1, "A", StationStatus::Active)), &sink);

        view.apply_station_change(
            &RowChange::update(station(9, "Ghost", StationStatus::Offline), None),
            &sink,
        );

        assert_eq!(view.stations.len(), 1);
        assert_eq!(view.stations[0].id, 1);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn station_delete_removes_by_old_row_id() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_station_change(&RowChange::insert(station(1, "A", StationStatus::Active)), &sink);
        view.apply_station_change(&RowChange::insert(station(2, "B", StationStatus::Active)), &sink);

        view.apply_station_change(&RowChange::delete(station(1, "A", StationStatus::Active)), &sink);

        assert_eq!(view.stations.len(), 1);
        assert_eq!(view.stations[0].id, 2);
    }

    #[test]
    fn payloadless_changes_are_ignored() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_station_change(&RowChange::insert(station(1, "A", StationStatus::Active)), &sink);

        view.apply_station_change(
            &RowChange {
                kind: super::ChangeKind::Delete,
                new_row: None,
                old_row: None,
            },
            &sink,
        );

        assert_eq!(view.stations.len(), 1);
    }

    #[test]
    fn alert_insert_notifies_then_prepends() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();

        view.apply_alert_change(&RowChange::insert(alert(1, AlertCategory::Warning)), &sink);
        view.apply_alert_change(&RowChange::insert(alert(2, AlertCategory::Success)), &sink);

        assert_eq!(view.alerts[0].id, 2);
        assert_eq!(view.alerts[1].id, 1);

        let notifications = sink.take();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].title, "Warning");
        assert_eq!(notifications[0].severity, Severity::Destructive);
        assert_eq!(notifications[1].title, "Info");
        assert_eq!(notifications[1].severity, Severity::Default);
    }

    #[test]
    fn alert_error_notification_is_destructive() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();

        view.apply_alert_change(&RowChange::insert(alert(1, AlertCategory::Error)), &sink);

        let notifications = sink.take();
        assert_eq!(notifications[0].title, "Error");
        assert_eq!(notifications[0].severity, Severity::Destructive);
    }

    #[test]
    fn alert_delete_matches_the_removed_row() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_alert_change(&RowChange::insert(alert(1, AlertCategory::Info)), &sink);
        view.apply_alert_change(&RowChange::insert(alert(2, AlertCategory::Info)), &sink);

        view.apply_alert_change(&RowChange::delete(alert(1, AlertCategory::Info)), &sink);

        assert_eq!(view.alerts.len(), 1);
        assert_eq!(view.alerts[0].id, 2);
    }

    #[test]
    fn alert_update_replaces_by_id() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_alert_change(&RowChange::insert(alert(7, AlertCategory::Info)), &sink);

        let mut dismissed = alert(7, AlertCategory::Info);
        dismissed.is_read = true;
        view.apply_alert_change(&RowChange::update(dismissed, None), &sink);

        assert!(view.alerts[0].is_read);
        assert_eq!(view.alerts.len(), 1);
    }

    #[test]
    fn mark_alert_read_flips_the_local_flag() {
        let sink = RecordingSink::default();
        let mut view = LiveView::default();
        view.apply_alert_change(&RowChange::insert(alert(7, AlertCategory::Warning)), &sink);
        assert!(!view.alerts[0].is_read);

        view.mark_alert_read(7);
        assert!(view.alerts[0].is_read);

        // Unknown ids are a no-op.
        view.mark_alert_read(99);
        assert_eq!(view.alerts.len(), 1);
    }

    #[test]
    fn metrics_change_overwrites_the_snapshot() {
        let mut view = LiveView::default();
        assert!(view.metrics.is_none());

        let snapshot = crate::domain::perturb::seed_metrics();
        view.apply_metrics_change(&RowChange::update(snapshot.clone(), None));
        assert_eq!(view.metrics, Some(snapshot));
    }
}
