//! Migration CLI for the user directory schema.
//!
//! Reads `DATABASE_URL` (or `-u`), e.g. `migration up`, `migration status`, `migration fresh`.

use migration::Migrator;
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
