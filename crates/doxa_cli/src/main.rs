//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `doxa_core` linkage and print deterministic probe output.
//! - Bootstrap a database file: `doxa_cli [--reset] [DB_PATH]`.
//!
//! `DB_PATH` falls back to `DOXA_DB_PATH`, then `doxa.db`. `--reset` drops
//! and recreates every table.

use doxa_core::db::migrations::latest_version;
use doxa_core::{open_db, reset_database, StoreConfig};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("doxa_core ping={}", doxa_core::ping());
    println!("doxa_core version={}", doxa_core::core_version());

    let mut config = StoreConfig::from_env();
    let mut reset = false;
    for arg in std::env::args().skip(1) {
        if arg == "--reset" {
            reset = true;
        } else {
            config.db_path = PathBuf::from(arg);
        }
    }

    if let Err(err) = config.init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let mut conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open `{}`: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    if reset {
        if let Err(err) = reset_database(&mut conn) {
            eprintln!("failed to reset `{}`: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
        println!("doxa_core reset={}", config.db_path.display());
    }

    println!("doxa_core schema_version={}", latest_version());
    ExitCode::SUCCESS
}
