//! Demo CLI driver: reads `<user> <command>` lines from stdin and prints
//! whatever the engine's silent-on-failure `dispatch` contract returns.
//! Each line's first whitespace-separated token is the asking user's
//! handle; the rest is handed to the parser as-is.

use std::io::{self, BufRead, Write};

use ledger_engine::engine::Config;
use ledger_engine::storage::JsonFileStorage;
use ledger_engine::{Engine, User};
use log::info;

fn main() {
    env_logger::init();

    let config = Config::from_env();
    info!("starting with storage directory {}", config.storage_dir.display());

    let storage = JsonFileStorage::new(&config.storage_dir).expect("failed to open storage directory");
    let mut engine = Engine::new(Box::new(storage), config).expect("failed to load engine state");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let user = match parts.next() {
            Some(handle) if !handle.is_empty() => User::new(handle),
            _ => continue,
        };
        let command = parts.next().unwrap_or("").trim();

        if let Some(response) = engine.dispatch(&user, command) {
            if !response.is_empty() {
                let _ = writeln!(out, "{response}");
            } else {
                let _ = writeln!(out);
            }
        }
    }
}
