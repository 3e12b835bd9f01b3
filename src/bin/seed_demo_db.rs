use std::path::Path;

use chargenet_api::adapters::db::{
    insert_metrics, insert_station, list_stations, open_connection, run_migrations, schema_version,
};
use chargenet_api::app::runtime::now_rfc3339;
use chargenet_api::domain::perturb::{seed_metrics, seed_stations};

fn main() {
    if let Err(error) = run() {
        eprintln!("failed to seed demo db: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut path = if cfg!(windows) {
        ".\\data\\chargenet_demo.db".to_string()
    } else {
        "./data/chargenet_demo.db".to_string()
    };
    let mut force = false;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--path" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--path requires a value".to_string());
                };
                path = value.clone();
                index += 2;
            }
            "--force" => {
                force = true;
                index += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    let path_ref = Path::new(&path);
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create parent directory: {error}"))?;
    }

    if force && path_ref.exists() {
        std::fs::remove_file(path_ref)
            .map_err(|error| format!("failed to remove existing db file: {error}"))?;
    }

    let mut connection = open_connection(&path).map_err(|error| error.to_string())?;
    run_migrations(&mut connection).map_err(|error| error.to_string())?;
    let version = schema_version(&connection).map_err(|error| error.to_string())?;

    let existing = list_stations(&connection).map_err(|error| error.to_string())?;
    if existing.is_empty() {
        let now = now_rfc3339();
        for station in seed_stations(&now) {
            insert_station(&connection, &station).map_err(|error| error.to_string())?;
        }
        insert_metrics(&connection, &seed_metrics()).map_err(|error| error.to_string())?;
        println!("seeded demo stations and metrics");
    } else {
        println!("stations already present; skipping seed data");
    }

    println!("created/updated demo db at: {path}");
    println!("schema version: {version}");
    Ok(())
}

fn print_help() {
    println!("seed_demo_db");
    println!();
    println!("Usage:");
    println!("  cargo run --bin seed_demo_db -- [--path <file>] [--force]");
    println!();
    println!("Options:");
    println!(
        "  --path <file>   target sqlite file (default: .\\\\data\\\\chargenet_demo.db on Windows)"
    );
    println!("  --force         delete existing file before creating");
}
