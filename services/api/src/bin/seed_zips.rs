//! services/api/src/bin/seed_zips.rs
//!
//! Creates a ZIP record for every row of the ZIP metadata CSV and sets its
//! population. Existing entries are left untouched. This is the only way ZIP
//! records come into existence; symptom reports for unknown ZIPs are rejected.

use api_lib::{
    adapters::{CsvZipMetadataAdapter, DbAdapter},
    config::Config,
    error::ApiError,
};
use outbreak_core::ports::{DatabaseService, ZipMetadataService};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    let db = DbAdapter::new(db_pool.clone());
    db.run_migrations().await?;

    let metadata = CsvZipMetadataAdapter::new(
        config.zip_metadata_path.clone(),
        config.zip_column.clone(),
        config.population_column.clone(),
    );
    let rows = metadata.population_rows().await?;
    info!(
        "Seeding {} ZIP codes from {}",
        rows.len(),
        config.zip_metadata_path.display()
    );

    let mut without_population = 0usize;
    for (zip, population) in &rows {
        if population.is_none() {
            without_population += 1;
        }
        db.upsert_zip_population(zip, *population).await?;
    }

    if without_population > 0 {
        warn!(
            "{} ZIP codes have no {} value; analysis will be refused for them",
            without_population, config.population_column
        );
    }
    info!("Seeded {} ZIP codes.", rows.len());

    db_pool.close().await;
    Ok(())
}
