//! Contract tests for the Vault KV v2 custody backend.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/v1/secret/data/dids/{did}` | `store_*` |
//! | GET    | `/v1/secret/data/dids/{did}` | `load_*` |
//! | DELETE | `/v1/secret/metadata/dids/{did}` | `delete_*` |

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use credence_crypto::{
    did_from_public_key, Ed25519KeyPair, KeyCustody, KeyCustodyError, VaultConfig, VaultKeyCustody,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn custody(mock_server: &MockServer) -> KeyCustody {
    let config = VaultConfig {
        addr: mock_server.uri().parse().unwrap(),
        token: "test-token".into(),
        mount: "secret".into(),
        timeout_secs: 2,
    };
    KeyCustody::Vault(VaultKeyCustody::new(config).unwrap())
}

fn fixed_key() -> (Ed25519KeyPair, credence_core::Did) {
    let kp = Ed25519KeyPair::from_seed(&[5u8; 32]);
    let did = did_from_public_key(&kp.public_key()).unwrap();
    (kp, did)
}

// ── POST /v1/secret/data/dids/{did} ──────────────────────────────────

#[tokio::test]
async fn store_sends_kv2_envelope_with_token() {
    let mock_server = MockServer::start().await;
    let (kp, did) = fixed_key();

    Mock::given(method("POST"))
        .and(path(format!("/v1/secret/data/dids/{did}")))
        .and(header("X-Vault-Token", "test-token"))
        .and(body_json(serde_json::json!({
            "data": { "private_key": BASE64.encode([5u8; 32]) }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "version": 1 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    custody(&mock_server)
        .store_signing_key(&did, &kp)
        .await
        .unwrap();
}

#[tokio::test]
async fn store_surfaces_permission_denied() {
    let mock_server = MockServer::start().await;
    let (kp, did) = fixed_key();

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(serde_json::json!({"errors": ["permission denied"]})),
        )
        .mount(&mock_server)
        .await;

    let err = custody(&mock_server)
        .store_signing_key(&did, &kp)
        .await
        .unwrap_err();
    match err {
        KeyCustodyError::Api { status, body, .. } => {
            assert_eq!(status, 403);
            assert!(body.contains("permission denied"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── GET /v1/secret/data/dids/{did} ───────────────────────────────────

#[tokio::test]
async fn load_reads_nested_data_field() {
    let mock_server = MockServer::start().await;
    let (kp, did) = fixed_key();

    Mock::given(method("GET"))
        .and(path(format!("/v1/secret/data/dids/{did}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "data": { "private_key": BASE64.encode([5u8; 32]) },
                "metadata": { "version": 1 }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let loaded = custody(&mock_server).load_signing_key(&did).await.unwrap();
    assert_eq!(loaded.public_key(), kp.public_key());
}

#[tokio::test]
async fn load_404_is_not_found() {
    let mock_server = MockServer::start().await;
    let (_, did) = fixed_key();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"errors": []})))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        custody(&mock_server).load_signing_key(&did).await,
        Err(KeyCustodyError::NotFound { .. })
    ));
}

#[tokio::test]
async fn load_server_error_is_transient() {
    let mock_server = MockServer::start().await;
    let (_, did) = fixed_key();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("sealed"))
        .mount(&mock_server)
        .await;

    let err = custody(&mock_server).load_signing_key(&did).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn load_timeout_is_hard_error() {
    let mock_server = MockServer::start().await;
    let (_, did) = fixed_key();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let err = custody(&mock_server).load_signing_key(&did).await.unwrap_err();
    assert!(matches!(err, KeyCustodyError::Http { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn load_unexpected_shape_is_deserialization_error() {
    let mock_server = MockServer::start().await;
    let (_, did) = fixed_key();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"unexpected": true})))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        custody(&mock_server).load_signing_key(&did).await,
        Err(KeyCustodyError::Deserialization { .. })
    ));
}

// ── DELETE /v1/secret/metadata/dids/{did} ────────────────────────────

#[tokio::test]
async fn delete_targets_metadata_path() {
    let mock_server = MockServer::start().await;
    let (_, did) = fixed_key();

    Mock::given(method("DELETE"))
        .and(path(format!("/v1/secret/metadata/dids/{did}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let c = custody(&mock_server);
    c.delete(&c.path_for(&did)).await.unwrap();
}
