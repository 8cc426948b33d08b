//! Credential persistence. Operates on the `verifiable_credentials` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use credence_core::{Did, Timestamp};
use credence_vc::VerifiableCredential;

use super::decode_error;
use crate::state::CredentialRecord;

/// Insert a newly issued credential. A duplicate id is a unique violation.
pub async fn insert(pool: &PgPool, record: &CredentialRecord) -> Result<(), sqlx::Error> {
    let credential =
        serde_json::to_value(&record.credential).map_err(|e| decode_error("credential", e))?;
    sqlx::query(
        "INSERT INTO verifiable_credentials (id, issuer_did, subject_did, issuance_date,
         expiration_date, credential, revoked, revoked_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id)
    .bind(record.issuer.as_str())
    .bind(record.subject.as_ref().map(Did::as_str))
    .bind(*record.issued_at.as_datetime())
    .bind(*record.expires_at.as_datetime())
    .bind(credential)
    .bind(record.revoked)
    .bind(record.revoked_at.map(|t| *t.as_datetime()))
    .execute(pool)
    .await?;
    Ok(())
}

/// Set the revocation tombstone if it is not already set.
///
/// Returns the `revoked_at` now stored, which is the earlier one when the
/// credential was already revoked, or `None` if the id is unknown.
pub async fn mark_revoked(
    pool: &PgPool,
    id: Uuid,
    revoked_at: Timestamp,
) -> Result<Option<Timestamp>, sqlx::Error> {
    sqlx::query("UPDATE verifiable_credentials SET revoked = TRUE, revoked_at = $1 WHERE id = $2 AND NOT revoked")
        .bind(*revoked_at.as_datetime())
        .bind(id)
        .execute(pool)
        .await?;

    let stored: Option<(Option<DateTime<Utc>>,)> =
        sqlx::query_as("SELECT revoked_at FROM verifiable_credentials WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(stored.and_then(|(at,)| at).map(Timestamp::from_utc))
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<CredentialRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, issuer_did, subject_did, issuance_date, expiration_date, credential,
         revoked, revoked_at
         FROM verifiable_credentials ORDER BY issuance_date, id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CredentialRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    issuer_did: String,
    subject_did: Option<String>,
    issuance_date: DateTime<Utc>,
    expiration_date: DateTime<Utc>,
    credential: serde_json::Value,
    revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
}

impl CredentialRow {
    fn into_record(self) -> Result<CredentialRecord, sqlx::Error> {
        let credential: VerifiableCredential =
            serde_json::from_value(self.credential).map_err(|e| decode_error("credential", e))?;
        let issuer = Did::new(self.issuer_did).map_err(|e| decode_error("issuer_did", e))?;
        let subject = self
            .subject_did
            .map(Did::new)
            .transpose()
            .map_err(|e| decode_error("subject_did", e))?;
        Ok(CredentialRecord {
            id: self.id,
            issuer,
            subject,
            credential,
            issued_at: Timestamp::from_utc(self.issuance_date),
            expires_at: Timestamp::from_utc(self.expiration_date),
            revoked: self.revoked,
            revoked_at: self.revoked_at.map(Timestamp::from_utc),
        })
    }
}
