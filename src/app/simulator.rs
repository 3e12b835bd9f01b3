use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::adapters::store::{EventedStore, StoreError};
use crate::app::runtime::now_rfc3339;
use crate::domain::perturb::{
    perturb_station, roll_alert, seed_metrics, seed_stations, walk_metrics,
};

const STATION_INTERVAL_MIN_MS: u64 = 5_000;
const STATION_INTERVAL_MAX_MS: u64 = 15_000;
const ALERT_INTERVAL: Duration = Duration::from_secs(30);
const METRICS_INTERVAL: Duration = Duration::from_secs(10);

/// Interruptible stop flag shared by the simulator's worker threads. Waiting
/// on it doubles as the inter-tick sleep, so `stop()` never has to sit out a
/// 15 second interval.
#[derive(Clone)]
struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn stop(&self) {
        let (flag, condvar) = &*self.inner;
        let mut stopped = flag.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *stopped = true;
        condvar.notify_all();
    }

    /// Sleeps for `timeout` unless stopped earlier; returns whether the
    /// signal fired.
    fn wait(&self, timeout: Duration) -> bool {
        let (flag, condvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut stopped = flag.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            if *stopped {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = condvar
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            stopped = guard;
        }
    }
}

struct SimulatorInner {
    signal: Option<StopSignal>,
    workers: Vec<JoinHandle<()>>,
}

/// Background job that fakes live network activity through three independent
/// periodic tasks. Two states, stopped and running; `start`/`stop` are
/// no-ops when already in the target state.
#[derive(Clone)]
pub struct SimulatorHandle {
    store: EventedStore,
    seed: Option<u64>,
    inner: Arc<Mutex<SimulatorInner>>,
}

impl SimulatorHandle {
    pub fn new(store: EventedStore, seed: Option<u64>) -> Self {
        Self {
            store,
            seed,
            inner: Arc::new(Mutex::new(SimulatorInner {
                signal: None,
                workers: Vec::new(),
            })),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .signal
            .is_some()
    }

    pub fn start(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.signal.is_some() {
            return;
        }

        let signal = StopSignal::new();
        inner.workers = vec![
            spawn_worker("sim-stations", {
                let store = self.store.clone();
                let signal = signal.clone();
                let mut rng = task_rng(self.seed, 1);
                move || station_worker(&store, &mut rng, &signal)
            }),
            spawn_worker("sim-alerts", {
                let store = self.store.clone();
                let signal = signal.clone();
                let mut rng = task_rng(self.seed, 2);
                move || alert_worker(&store, &mut rng, &signal)
            }),
            spawn_worker("sim-metrics", {
                let store = self.store.clone();
                let signal = signal.clone();
                let mut rng = task_rng(self.seed, 3);
                move || metrics_worker(&store, &mut rng, &signal)
            }),
        ];
        inner.signal = Some(signal);

        tracing::info!("simulator started");
    }

    pub fn stop(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(signal) = inner.signal.take() else {
            return;
        };

        signal.stop();
        for worker in inner.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("simulator worker panicked");
            }
        }

        tracing::info!("simulator stopped");
    }
}

fn spawn_worker(name: &str, body: impl FnOnce() + Send + 'static) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .unwrap_or_else(|error| {
            // Thread spawn only fails on resource exhaustion; fall back to an
            // unnamed thread rather than killing the control call.
            tracing::warn!(error = %error, "failed to spawn named simulator worker");
            std::thread::spawn(|| {})
        })
}

fn task_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

fn station_worker(store: &EventedStore, rng: &mut StdRng, signal: &StopSignal) {
    loop {
        // The interval is redrawn for every firing.
        let interval = Duration::from_millis(
            rng.gen_range(STATION_INTERVAL_MIN_MS..=STATION_INTERVAL_MAX_MS),
        );
        if signal.wait(interval) {
            return;
        }
        if let Err(error) = station_tick(store, rng, &now_rfc3339()) {
            tracing::warn!(error = %error, "station perturbation cycle failed");
        }
    }
}

fn alert_worker(store: &EventedStore, rng: &mut StdRng, signal: &StopSignal) {
    loop {
        if signal.wait(ALERT_INTERVAL) {
            return;
        }
        if let Err(error) = alert_tick(store, rng, &now_rfc3339()) {
            tracing::warn!(error = %error, "alert generation cycle failed");
        }
    }
}

fn metrics_worker(store: &EventedStore, rng: &mut StdRng, signal: &StopSignal) {
    loop {
        if signal.wait(METRICS_INTERVAL) {
            return;
        }
        if let Err(error) = metrics_tick(store, rng) {
            tracing::warn!(error = %error, "metrics refresh cycle failed");
        }
    }
}

/// One station perturbation firing: bootstrap the seed set when the
/// collection is empty, otherwise perturb exactly one random station.
pub(crate) fn station_tick(
    store: &EventedStore,
    rng: &mut StdRng,
    now: &str,
) -> Result<(), StoreError> {
    let stations = store.list_stations()?;

    if stations.is_empty() {
        for seed in seed_stations(now) {
            store.insert_station(&seed)?;
        }
        tracing::info!("seeded initial station set");
        return Ok(());
    }

    let target = &stations[rng.gen_range(0..stations.len())];
    let patch = perturb_station(target, rng, now);
    store.apply_station_patch(target.id, &patch)?;

    Ok(())
}

pub(crate) fn alert_tick(
    store: &EventedStore,
    rng: &mut StdRng,
    now: &str,
) -> Result<(), StoreError> {
    if let Some(new_alert) = roll_alert(rng, now) {
        store.insert_alert(&new_alert)?;
    }

    Ok(())
}

/// One metrics firing: seed the snapshot when absent, otherwise advance the
/// bounded random walk and overwrite it in place.
pub(crate) fn metrics_tick(store: &EventedStore, rng: &mut StdRng) -> Result<(), StoreError> {
    match store.metrics()? {
        None => store.insert_metrics(&seed_metrics()),
        Some(current) => store.update_metrics(&walk_metrics(&current, rng)),
    }
}
