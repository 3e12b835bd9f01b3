mod config;
mod error;
mod logging;
pub mod reconciler;
pub mod runtime;
pub mod simulator;

pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    logging::init()?;

    let config = config::AppConfig::from_env()?;

    tracing::info!(
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        sim_autostart = config.sim_autostart,
        sim_seed = ?config.sim_seed,
        "application bootstrap initialized"
    );

    runtime::run(config)
}
