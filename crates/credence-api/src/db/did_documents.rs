//! DID document persistence. Operates on the `did_documents` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use credence_core::Timestamp;
use credence_vc::DidDocument;

use super::decode_error;

pub async fn insert(pool: &PgPool, doc: &DidDocument) -> Result<(), sqlx::Error> {
    let document = serde_json::to_value(doc).map_err(|e| decode_error("document", e))?;
    sqlx::query(
        "INSERT INTO did_documents (did, public_key, organization_id, created_at, document)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(doc.id.as_str())
    .bind(doc.public_key.to_multibase())
    .bind(&doc.organization_id)
    .bind(*doc.created_at.as_datetime())
    .bind(document)
    .execute(pool)
    .await?;
    Ok(())
}

/// All documents in creation order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<DidDocument>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DidDocumentRow>(
        "SELECT did, created_at, document FROM did_documents ORDER BY created_at, did",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DidDocumentRow::into_document).collect()
}

#[derive(sqlx::FromRow)]
struct DidDocumentRow {
    did: String,
    created_at: DateTime<Utc>,
    document: serde_json::Value,
}

impl DidDocumentRow {
    fn into_document(self) -> Result<DidDocument, sqlx::Error> {
        let mut doc: DidDocument =
            serde_json::from_value(self.document).map_err(|e| decode_error("document", e))?;
        if doc.id.as_str() != self.did {
            return Err(decode_error("did", "row key does not match document id"));
        }
        doc.verify_self_certifying()
            .map_err(|e| decode_error("document", e))?;
        doc.created_at = Timestamp::from_utc(self.created_at);
        Ok(doc)
    }
}
