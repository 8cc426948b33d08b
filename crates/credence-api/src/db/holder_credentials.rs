//! Holder wallet persistence. Operates on the `holder_credentials` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use credence_core::{Did, Timestamp};

use super::decode_error;
use crate::state::HolderCredentialRecord;

/// Record that a holder has received a credential. Receiving the same
/// credential twice is a no-op.
pub async fn insert(pool: &PgPool, record: &HolderCredentialRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO holder_credentials (holder_did, credential_id, received_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (holder_did, credential_id) DO NOTHING",
    )
    .bind(record.holder.as_str())
    .bind(record.credential_id)
    .bind(*record.received_at.as_datetime())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<HolderCredentialRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, HolderCredentialRow>(
        "SELECT holder_did, credential_id, received_at
         FROM holder_credentials ORDER BY received_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(HolderCredentialRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct HolderCredentialRow {
    holder_did: String,
    credential_id: Uuid,
    received_at: DateTime<Utc>,
}

impl HolderCredentialRow {
    fn into_record(self) -> Result<HolderCredentialRecord, sqlx::Error> {
        Ok(HolderCredentialRecord {
            holder: Did::new(self.holder_did).map_err(|e| decode_error("holder_did", e))?,
            credential_id: self.credential_id,
            received_at: Timestamp::from_utc(self.received_at),
        })
    }
}
