use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use chrono::{SecondsFormat, Utc};

use crate::adapters::api::{ApiState, configure_routes};
use crate::adapters::db;
use crate::adapters::store::EventedStore;
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::reconciler::Reconciler;
use crate::app::simulator::SimulatorHandle;
use crate::domain::projection::{NotificationSink, TracingSink};

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let mut connection = db::open_connection(&config.db_path).map_err(AppError::database_init)?;
    db::run_migrations(&mut connection).map_err(AppError::database_init)?;

    let (feed_sender, feed_receiver) = mpsc::channel();
    let store = EventedStore::new(Arc::new(Mutex::new(connection)), feed_sender);

    let sink: Arc<dyn NotificationSink> = Arc::new(TracingSink);
    let reconciler = Reconciler::new(store.clone(), sink);
    if let Err(error) = reconciler.attach() {
        // Soft failure: the projection starts empty and catches up from the
        // feed; only connection-level problems are user-visible.
        tracing::warn!(error = %error, "initial live view load failed");
    }
    let feed_worker = reconciler.spawn_feed_worker(feed_receiver);

    let simulator = SimulatorHandle::new(store.clone(), config.sim_seed);
    if config.sim_autostart {
        simulator.start();
    }

    let api_state = ApiState {
        store: store.clone(),
        live: reconciler.clone(),
        simulator: simulator.clone(),
    };

    tracing::info!(bind = %config.http_bind, "http server starting");

    let server_result = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .app_data(web::Data::new(api_state.clone()))
                .configure(configure_routes)
        })
        .bind(&config.http_bind)?
        .run()
        .await
    });

    simulator.stop();

    // Every remaining feed sender lives in these handles; dropping them
    // closes the channel so the feed worker can exit.
    drop(simulator);
    drop(reconciler);
    drop(store);

    if feed_worker.join().is_err() {
        return Err(AppError::runtime("live feed worker panicked"));
    }

    server_result.map_err(AppError::runtime)
}
