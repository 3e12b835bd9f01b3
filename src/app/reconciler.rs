use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::adapters::store::{ChangeEvent, EventedStore, StoreError};
use crate::app::runtime::now_rfc3339;
use crate::domain::models::StationStatus;
use crate::domain::projection::{
    ConnectionState, LiveView, Notification, NotificationSink, Severity,
};

const INITIAL_ALERT_LIMIT: u32 = 10;

/// Maintains the in-memory live projection from the store's change feed and
/// exposes the user-triggered operations that flow back into the store.
#[derive(Clone)]
pub struct Reconciler {
    store: EventedStore,
    view: Arc<Mutex<LiveView>>,
    sink: Arc<dyn NotificationSink>,
}

impl Reconciler {
    pub fn new(store: EventedStore, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            view: Arc::new(Mutex::new(LiveView::default())),
            sink,
        }
    }

    /// One bulk load of all three tables; the projection is authoritative
    /// only after this completes. Re-attaching after a feed loss announces
    /// the restored connection once.
    pub fn attach(&self) -> Result<(), StoreError> {
        let stations = self.store.list_stations()?;
        let alerts = self.store.recent_alerts(INITIAL_ALERT_LIMIT)?;
        let metrics = self.store.metrics()?;

        let mut view = self.lock_view();
        let was_lost = view.connection == ConnectionState::Lost;
        view.stations = stations;
        view.alerts = alerts;
        view.metrics = metrics;
        view.connection = ConnectionState::Connected;
        drop(view);

        if was_lost {
            self.sink.notify(Notification {
                title: "Reconnected".to_string(),
                description: "Real-time connection has been restored".to_string(),
                severity: Severity::Default,
            });
        }

        Ok(())
    }

    /// Dedicated worker that folds feed events into the projection until the
    /// feed closes. Closure is surfaced as a one-time connection-lost
    /// notification and a persistent disconnected flag on the view.
    pub fn spawn_feed_worker(&self, feed: Receiver<ChangeEvent>) -> JoinHandle<()> {
        let view = Arc::clone(&self.view);
        let sink = Arc::clone(&self.sink);

        std::thread::spawn(move || {
            while let Ok(event) = feed.recv() {
                let mut view = view.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                match event {
                    ChangeEvent::Station(change) => {
                        view.apply_station_change(&change, sink.as_ref());
                    }
                    ChangeEvent::Alert(change) => view.apply_alert_change(&change, sink.as_ref()),
                    ChangeEvent::Metrics(change) => view.apply_metrics_change(&change),
                }
            }

            let mut view = view.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            view.connection = ConnectionState::Lost;
            drop(view);

            sink.notify(Notification {
                title: "Connection Lost".to_string(),
                description: "Real-time connection has been lost".to_string(),
                severity: Severity::Destructive,
            });
            tracing::warn!("change feed closed, live view is disconnected");
        })
    }

    pub fn snapshot(&self) -> LiveView {
        self.lock_view().clone()
    }

    /// Marks an alert read locally and in the store. The local flip is kept
    /// even when the store write fails; only the failure is logged.
    pub fn dismiss_alert(&self, alert_id: i64) {
        self.lock_view().mark_alert_read(alert_id);

        if let Err(error) = self.store.mark_alert_read(alert_id) {
            tracing::warn!(alert_id, error = %error, "failed to persist alert dismissal");
        }
    }

    /// Writes the new status with a fresh timestamp; the projection is
    /// updated by the resulting feed event, not optimistically.
    pub fn set_station_status(
        &self,
        station_id: i64,
        status: StationStatus,
    ) -> Result<bool, StoreError> {
        let updated = self
            .store
            .update_station_status(station_id, status, &now_rfc3339())?;
        Ok(updated.is_some())
    }

    fn lock_view(&self) -> std::sync::MutexGuard<'_, LiveView> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
