//! Database migration runner for Docseal.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! Commands that drop tables destroy the audit ledger and are refused in
//! production, which is also the posture when `RUN_MODE` is unset.

use sea_orm_migration::prelude::*;
use docseal_db::migration::Migrator;

const DESTRUCTIVE_COMMANDS: [&str; 4] = ["fresh", "refresh", "reset", "down"];

fn destructive_command() -> Option<String> {
    std::env::args()
        .skip(1)
        .find(|arg| DESTRUCTIVE_COMMANDS.contains(&arg.as_str()))
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let production = match std::env::var("RUN_MODE") {
        Ok(mode) => mode.eq_ignore_ascii_case("production"),
        Err(_) => true,
    };
    if let Some(command) = destructive_command().filter(|_| production) {
        eprintln!("refusing to run `{command}` in production: it would drop the audit ledger");
        std::process::exit(2);
    }

    // Run the migrator CLI (it sets up its own tracing)
    cli::run_cli(Migrator).await;
}
