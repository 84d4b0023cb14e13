/// Embedded migrations for the cache database.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
