use tracing::info;

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            -- Flat key/value store; values are JSON or plain text
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_local_storage_updated_at ON local_storage (updated_at);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}
