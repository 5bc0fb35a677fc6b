//! Schema migration CLI for the user service.
//!
//! Reads `DATABASE_URL` and runs the `up`, `down`, `status`, `fresh`,
//! `refresh` and `reset` subcommands against it.

use migration::Migrator;
use sea_orm_migration::cli::run_cli;

#[tokio::main]
async fn main() {
    run_cli(Migrator).await;
}
