use log::*;

use crate::{traits::OrderStore, SqliteDatabase};

/// Loads `.env.test`, initialises logging and returns a freshly migrated database at `url`.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {}", db.url());
    db
}

/// A unique SQLite database file in the system temp directory.
pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("pgw_test_store_{}.db", uuid::Uuid::new_v4().simple()));
    format!("sqlite://{}", path.display())
}
