#![allow(clippy::unwrap_used)]
// Integration tests for `AppwriteClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use livewrite_api::{AppwriteClient, Credentials, Document, Error, TransportConfig};

const PROJECT: &str = "test-project";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AppwriteClient) {
    setup_with(Credentials::Anonymous).await
}

async fn setup_with(credentials: Credentials) -> (MockServer, AppwriteClient) {
    let server = MockServer::start().await;
    let endpoint = format!("{}/v1", server.uri());
    let client =
        AppwriteClient::new(&endpoint, PROJECT, credentials, &TransportConfig::default()).unwrap();
    (server, client)
}

fn document_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "$id": id,
        "$collectionId": "posts",
        "$databaseId": "main",
        "$createdAt": "2024-01-01T00:00:00.000+00:00",
        "$updatedAt": "2024-01-01T00:00:00.000+00:00",
        "$permissions": [],
        "title": title
    })
}

// ── Databases ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_document_sends_project_header() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/main/collections/posts/documents/d1"))
        .and(header("x-appwrite-project", PROJECT))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("d1", "Hello")))
        .expect(1)
        .mount(&server)
        .await;

    let doc: Document = client
        .get_document("main", "posts", "d1", &[])
        .await
        .unwrap();

    assert_eq!(doc.id, "d1");
    assert_eq!(doc.get("title"), Some(&json!("Hello")));
}

#[tokio::test]
async fn test_list_documents_passes_queries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/main/collections/posts/documents"))
        .and(query_param("queries[]", "limit(2)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 7,
            "documents": [document_json("a", "A"), document_json("b", "B")]
        })))
        .mount(&server)
        .await;

    let list = client
        .list_documents::<Document>("main", "posts", &["limit(2)".into()])
        .await
        .unwrap();

    assert_eq!(list.total, 7);
    let ids: Vec<&str> = list.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_list_documents_typed_payload() {
    #[derive(serde::Deserialize)]
    struct Post {
        #[serde(rename = "$id")]
        id: String,
        title: String,
    }

    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/main/collections/posts/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [document_json("p1", "Typed")]
        })))
        .mount(&server)
        .await;

    let list = client
        .list_documents::<Post>("main", "posts", &[])
        .await
        .unwrap();

    assert_eq!(list.documents[0].id, "p1");
    assert_eq!(list.documents[0].title, "Typed");
}

#[tokio::test]
async fn test_document_not_found_keeps_error_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/main/collections/posts/documents/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Document with the requested ID could not be found.",
            "code": 404,
            "type": "document_not_found",
            "version": "1.5.7"
        })))
        .mount(&server)
        .await;

    let err = client
        .get_document::<Document>("main", "posts", "missing", &[])
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "expected not found, got: {err:?}");
    assert_eq!(err.api_error_kind(), Some("document_not_found"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/main/collections/posts/documents/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let result = client
        .get_document::<Document>("main", "posts", "d1", &[])
        .await;

    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("proxy")),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Storage ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_files() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/storage/buckets/avatars/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "files": [{
                "$id": "f1",
                "bucketId": "avatars",
                "name": "me.png",
                "mimeType": "image/png",
                "sizeOriginal": 4
            }]
        })))
        .mount(&server)
        .await;

    let list = client
        .list_files::<livewrite_api::File>("avatars", &[])
        .await
        .unwrap();

    assert_eq!(list.total, 1);
    assert_eq!(list.files[0].name, "me.png");
}

#[tokio::test]
async fn test_get_file_metadata() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/storage/buckets/avatars/files/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "$id": "f1",
            "bucketId": "avatars",
            "name": "me.png",
            "mimeType": "image/png",
            "sizeOriginal": 512
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = client.get_file("avatars", "f1").await.unwrap();
    assert_eq!(file.id, "f1");
    assert_eq!(file.mime_type, "image/png");
    assert_eq!(file.size_original, 512);
}

#[tokio::test]
async fn test_download_file_returns_bytes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/storage/buckets/avatars/files/f1/download"))
        .and(query_param("project", PROJECT))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&server)
        .await;

    let bytes = client.download_file("avatars", "f1").await.unwrap();
    assert_eq!(bytes.as_ref(), &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_download_url_is_pure() {
    let (_server, client) = setup().await;

    let url = client.file_download_url("avatars", "f1").unwrap();
    assert!(url.path().ends_with("/v1/storage/buckets/avatars/files/f1/download"));
    assert_eq!(
        url.query_pairs().find(|(k, _)| k == "project").map(|(_, v)| v.into_owned()),
        Some(PROJECT.to_string())
    );
}

#[tokio::test]
async fn test_download_missing_file() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/storage/buckets/avatars/files/nope/download"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "The requested file could not be found.",
            "code": 404,
            "type": "storage_file_not_found"
        })))
        .mount(&server)
        .await;

    let err = client.download_file("avatars", "nope").await.unwrap_err();
    assert_eq!(err.api_error_kind(), Some("storage_file_not_found"));
}

// ── Account ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_account_with_api_key() {
    let key: secrecy::SecretString = "server-key".to_string().into();
    let (server, client) = setup_with(Credentials::ApiKey(key)).await;

    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .and(header("x-appwrite-key", "server-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "$id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "status": true,
            "emailVerification": false,
            "labels": ["admin"],
            "prefs": {}
        })))
        .mount(&server)
        .await;

    let user = client.get_account().await.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.labels, vec!["admin"]);
}

#[tokio::test]
async fn test_guest_account_is_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "User (role: guests) missing scope (account)",
            "code": 401,
            "type": "general_unauthorized_scope"
        })))
        .mount(&server)
        .await;

    let err = client.get_account().await.unwrap_err();
    assert!(err.is_auth_expired(), "expected auth error, got: {err:?}");
}

#[tokio::test]
async fn test_unauthorized_without_body_is_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.get_account().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_email_session_login_and_logout() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/account/sessions/email"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "hunter22" })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("set-cookie", "a_session_test-project=abc; Path=/")
                .set_body_json(json!({
                    "$id": "s1",
                    "userId": "u1",
                    "provider": "email",
                    "current": true,
                    "secret": ""
                })),
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/account/sessions/current"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "hunter22".to_string().into();
    let session = client
        .create_email_password_session("ada@example.com", &secret)
        .await
        .unwrap();

    assert_eq!(session.id, "s1");
    assert_eq!(session.user_id, "u1");
    assert_eq!(
        client.cookie_header().as_deref(),
        Some("a_session_test-project=abc")
    );

    client.delete_session("current").await.unwrap();
}
