use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};

use crate::adapters::store::{EventedStore, StoreError};
use crate::app::reconciler::Reconciler;
use crate::app::simulator::SimulatorHandle;
use crate::domain::models::{AlertRecord, MetricsSnapshot, StationRecord, StationStatus};
use crate::domain::search;

#[derive(Clone)]
pub struct ApiState {
    pub store: EventedStore,
    pub live: Reconciler,
    pub simulator: SimulatorHandle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshotResponse {
    pub stations: Vec<StationRecord>,
    pub alerts: Vec<AlertRecord>,
    pub metrics: Option<MetricsSnapshot>,
    pub is_connected: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub stations: Vec<StationRecord>,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorResponse {
    pub is_running: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: StationStatus,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(get_live_snapshot_endpoint)
        .service(search_stations_endpoint)
        .service(list_stations_endpoint)
        .service(set_station_status_endpoint)
        .service(list_alerts_endpoint)
        .service(dismiss_alert_endpoint)
        .service(get_metrics_endpoint)
        .service(get_simulator_endpoint)
        .service(start_simulator_endpoint)
        .service(stop_simulator_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/live")]
async fn get_live_snapshot_endpoint(state: web::Data<ApiState>) -> impl Responder {
    let view = state.live.snapshot();
    HttpResponse::Ok().json(LiveSnapshotResponse {
        is_connected: view.is_connected(),
        stations: view.stations,
        alerts: view.alerts,
        metrics: view.metrics,
    })
}

#[get("/stations")]
async fn list_stations_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(50).clamp(1, 500) as usize;
    let offset = query.offset.unwrap_or(0) as usize;

    match state.store.list_stations() {
        Ok(stations) => {
            let page: Vec<StationRecord> =
                stations.into_iter().skip(offset).take(limit).collect();
            HttpResponse::Ok().json(page)
        }
        Err(error) => store_error_response(error),
    }
}

#[get("/stations/search")]
async fn search_stations_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    match state.store.list_stations() {
        Ok(stations) => {
            let outcome = search::search(&query.q, &stations);
            HttpResponse::Ok().json(SearchResponse {
                stations: outcome.stations,
                explanation: outcome.explanation,
            })
        }
        Err(error) => store_error_response(error),
    }
}

#[post("/stations/{id}/status")]
async fn set_station_status_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<i64>,
    body: web::Json<StatusBody>,
) -> impl Responder {
    let station_id = path.into_inner();

    match state.live.set_station_status(station_id, body.status) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "station not found"
        })),
        Err(error) => store_error_response(error),
    }
}

#[get("/alerts")]
async fn list_alerts_endpoint(
    state: web::Data<ApiState>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    match state.store.recent_alerts(limit) {
        Ok(alerts) => HttpResponse::Ok().json(alerts),
        Err(error) => store_error_response(error),
    }
}

#[post("/alerts/{id}/dismiss")]
async fn dismiss_alert_endpoint(state: web::Data<ApiState>, path: web::Path<i64>) -> impl Responder {
    // Fire-and-forget: the local flip always applies and store failures are
    // only logged, so there is nothing to report back.
    state.live.dismiss_alert(path.into_inner());
    HttpResponse::NoContent().finish()
}

#[get("/metrics")]
async fn get_metrics_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.store.metrics() {
        Ok(Some(snapshot)) => HttpResponse::Ok().json(snapshot),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "no metrics snapshot available"
        })),
        Err(error) => store_error_response(error),
    }
}

#[get("/simulator")]
async fn get_simulator_endpoint(state: web::Data<ApiState>) -> impl Responder {
    HttpResponse::Ok().json(SimulatorResponse {
        is_running: state.simulator.is_running(),
    })
}

#[post("/simulator/start")]
async fn start_simulator_endpoint(state: web::Data<ApiState>) -> impl Responder {
    state.simulator.start();
    HttpResponse::Ok().json(SimulatorResponse {
        is_running: state.simulator.is_running(),
    })
}

#[post("/simulator/stop")]
async fn stop_simulator_endpoint(state: web::Data<ApiState>) -> impl Responder {
    state.simulator.stop();
    HttpResponse::Ok().json(SimulatorResponse {
        is_running: state.simulator.is_running(),
    })
}

fn store_error_response(error: StoreError) -> HttpResponse {
    match error {
        StoreError::LockPoisoned => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "store lock poisoned"
        })),
        StoreError::Read(error) | StoreError::Write(error) => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("store operation failed: {error}")
            }))
        }
    }
}
