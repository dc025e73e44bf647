use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Singleton assistant configuration; the table holds at most one row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub updated_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl AiConfig {
    pub async fn get(db: &PgPool) -> anyhow::Result<Option<AiConfig>> {
        let config = sqlx::query_as::<_, AiConfig>(
            "SELECT api_key, model, updated_by, updated_at FROM ai_config",
        )
        .fetch_optional(db)
        .await?;
        Ok(config)
    }

    pub async fn upsert(
        db: &PgPool,
        api_key: &str,
        model: &str,
        updated_by: &str,
    ) -> anyhow::Result<AiConfig> {
        let config = sqlx::query_as::<_, AiConfig>(
            r#"
            INSERT INTO ai_config (id, api_key, model, updated_by, updated_at)
            VALUES (true, $1, $2, $3, now())
            ON CONFLICT (id) DO UPDATE
            SET api_key = EXCLUDED.api_key,
                model = EXCLUDED.model,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            RETURNING api_key, model, updated_by, updated_at
            "#,
        )
        .bind(api_key)
        .bind(model)
        .bind(updated_by)
        .fetch_one(db)
        .await?;
        Ok(config)
    }

    pub async fn delete(db: &PgPool) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM ai_config").execute(db).await?;
        Ok(result.rows_affected() > 0)
    }
}
