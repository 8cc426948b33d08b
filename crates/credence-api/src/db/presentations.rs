//! Presentation persistence. Operates on the `presentations` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use credence_core::{Did, Timestamp};

use super::decode_error;
use crate::state::PresentationRecord;

pub async fn insert(pool: &PgPool, record: &PresentationRecord) -> Result<(), sqlx::Error> {
    let presentation =
        serde_json::to_value(&record.presentation).map_err(|e| decode_error("presentation", e))?;
    let verification =
        serde_json::to_value(&record.verification).map_err(|e| decode_error("verification", e))?;
    sqlx::query(
        "INSERT INTO presentations (id, holder_did, presentation, verification, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(record.id)
    .bind(record.holder.as_str())
    .bind(presentation)
    .bind(verification)
    .bind(*record.created_at.as_datetime())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<PresentationRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PresentationRow>(
        "SELECT id, holder_did, presentation, verification, created_at
         FROM presentations ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PresentationRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct PresentationRow {
    id: Uuid,
    holder_did: String,
    presentation: serde_json::Value,
    verification: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl PresentationRow {
    fn into_record(self) -> Result<PresentationRecord, sqlx::Error> {
        Ok(PresentationRecord {
            id: self.id,
            holder: Did::new(self.holder_did).map_err(|e| decode_error("holder_did", e))?,
            presentation: serde_json::from_value(self.presentation)
                .map_err(|e| decode_error("presentation", e))?,
            verification: serde_json::from_value(self.verification)
                .map_err(|e| decode_error("verification", e))?,
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}
