//! Seeds the course catalog from a JSON file.
//!
//! Usage: `seed-catalog [path/to/courses.json]` (defaults to
//! `seed/courses.json`). Replaces the whole catalog.

use course_service::{config::DatabaseConfig, models::Course, services::CourseStore};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Only the database section is needed to seed.
    let database = DatabaseConfig::from_env()?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "seed/courses.json".to_string());
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
    let courses: Vec<Course> = serde_json::from_str(&raw)?;

    tracing::info!("Connecting to MongoDB");
    let mut client_options = ClientOptions::parse(database.url.expose_secret()).await?;
    client_options.app_name = Some("course-service-seed".to_string());
    let client = Client::with_options(client_options)?;
    let db = client.database(&database.db_name);

    let store = CourseStore::new(&db);
    store.init_indexes().await?;

    let inserted = store.replace_catalog(courses).await?;
    tracing::info!(inserted, "Catalog seeded");

    Ok(())
}
