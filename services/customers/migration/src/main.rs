use sea_orm_migration::prelude::*;

use bazaar_customers_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
