//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskline_core` linkage against a real SQLite slot store.
//! - Print the selected slot and its activity ids in default list order.
//!
//! Usage: `taskline_cli [db_path] [slot_key] [log_dir]`. Without `db_path`
//! the database lives in memory; `-` also selects memory.

use log::{error, info};
use std::env;
use std::process::ExitCode;
use taskline_core::db::{open_db, open_db_in_memory};
use taskline_core::{
    default_log_level, init_logging, ActivityRepository, ListScope, SqliteSlotStore,
    DEFAULT_ACTIVITIES_SLOT,
};

struct Args {
    db_path: Option<String>,
    slot_key: String,
    log_dir: Option<String>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> Self {
        let db_path = raw.next().filter(|path| path != "-");
        let slot_key = raw
            .next()
            .unwrap_or_else(|| DEFAULT_ACTIVITIES_SLOT.to_string());
        let log_dir = raw.next();
        Self {
            db_path,
            slot_key,
            log_dir,
        }
    }
}

fn main() -> ExitCode {
    println!("taskline_core ping={}", taskline_core::ping());
    println!("taskline_core version={}", taskline_core::core_version());

    let args = Args::parse(env::args().skip(1));
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    if let Some(log_dir) = &args.log_dir {
        init_logging(default_log_level(), log_dir).map_err(|err| err.to_string())?;
    }

    let conn = match &args.db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    let slots = SqliteSlotStore::try_new(&conn).map_err(|err| err.to_string())?;
    let repo = ActivityRepository::open(slots, &args.slot_key)
        .map_err(|err| format!("[{}] {err}", err.kind()))?;

    let ids = repo.list_activity_ids(&ListScope::default());
    info!(
        "event=cli_run module=cli status=ok slot={} activities={}",
        repo.storage_slot(),
        ids.len()
    );
    println!("slot={} activities={}", repo.storage_slot(), ids.len());
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
