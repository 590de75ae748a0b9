//! Hosted store wire mapping, checked against a wiremock server standing in
//! for the project's REST, auth and storage endpoints.

use chrono::Utc;
use complaint_tracker::config::ComplaintTrackerConfig;
use complaint_tracker::store::{
    AuthClient, ComplaintQuery, ComplaintStore, ImageStorage, StoreError, SupabaseComplaintStore,
};
use complaint_tracker::{
    ComplaintId, ComplaintStatus, RateLimitedHttpClient, Role, Session, SetStatusOutcome,
    TransitionEngine,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";
const USER_TOKEN: &str = "user-jwt";

fn http(server: &MockServer) -> RateLimitedHttpClient {
    let config = ComplaintTrackerConfig::default();
    RateLimitedHttpClient::new(
        &server.uri(),
        ANON_KEY,
        &config.store.rate_limit,
        Duration::from_secs(30),
    )
    .unwrap()
}

fn store(server: &MockServer) -> SupabaseComplaintStore {
    let config = ComplaintTrackerConfig::default();
    SupabaseComplaintStore::new(
        http(server).with_access_token(Some(USER_TOKEN.to_string())),
        &config.store,
    )
}

fn row(id: u64, status: &str) -> Value {
    json!({
        "id": id,
        "title": "Streetlight flickering",
        "description": "Corner of Elm and 3rd",
        "category": "Electricity",
        "priority": "Medium",
        "status": status,
        "image_url": null,
        "user_id": "u-1",
        "user_email": "resident@example.com",
        "created_at": "2024-03-01T10:00:00+00:00"
    })
}

#[tokio::test]
async fn test_update_status_patches_by_id_and_counts_rows() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.42"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer user-jwt"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({"status": "RESOLVED"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(42, "RESOLVED")])))
        .expect(1)
        .mount(&server)
        .await;

    let affected = store(&server)
        .update_status(&ComplaintId::from(42u64), ComplaintStatus::Resolved)
        .await
        .unwrap();
    assert_eq!(affected, 1);
}

#[tokio::test]
async fn test_update_unknown_id_affects_zero_rows() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let affected = store(&server)
        .update_status(&ComplaintId::from("999"), ComplaintStatus::Open)
        .await
        .unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn test_read_by_id_decodes_numeric_ids() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(42, "IN_PROGRESS")])))
        .mount(&server)
        .await;

    let complaint = store(&server)
        .read_by_id(&ComplaintId::from("42"))
        .await
        .unwrap()
        .expect("row returned");
    assert_eq!(complaint.id, ComplaintId::from("42"));
    assert_eq!(complaint.status, ComplaintStatus::InProgress);
    assert_eq!(complaint.user_email.as_deref(), Some("resident@example.com"));
}

#[tokio::test]
async fn test_unknown_status_value_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(1, "CLOSED")])))
        .mount(&server)
        .await;

    let err = store(&server)
        .read_by_id(&ComplaintId::from("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)));
}

#[tokio::test]
async fn test_read_by_id_always_reaches_the_store() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(5, "OPEN")])))
        .expect(2)
        .mount(&server)
        .await;

    let store = store(&server);
    let id = ComplaintId::from("5");
    store.read_by_id(&id).await.unwrap();
    store.read_by_id(&id).await.unwrap();
}

#[tokio::test]
async fn test_readback_is_not_answered_by_an_earlier_read() {
    let server = MockServer::start().await;

    // A read issued before the write, still in flight when the write lands
    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([row(42, "OPEN")]))
                .set_delay(Duration::from_millis(400)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(42, "RESOLVED")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(42, "RESOLVED")])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(store(&server));
    let id = ComplaintId::from(42u64);

    let earlier = tokio::spawn({
        let store = store.clone();
        let id = id.clone();
        async move { store.read_by_id(&id).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let engine = TransitionEngine::new(store.clone(), Duration::from_millis(600));
    let outcome = engine.set_status(&id, ComplaintStatus::Resolved).await.unwrap();

    let earlier = earlier.await.unwrap().unwrap().expect("row returned");
    assert_eq!(earlier.status, ComplaintStatus::Open);
    assert_eq!(
        outcome.record().map(|c| c.status),
        Some(ComplaintStatus::Resolved)
    );
    assert_eq!(outcome.affected(), 1);
}

#[tokio::test]
async fn test_write_invalidates_cached_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(5, "OPEN")])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(5, "IN_PROGRESS")])))
        .mount(&server)
        .await;

    let store = store(&server);
    let query = ComplaintQuery::all();

    store.list(&query).await.unwrap();
    // served from cache
    store.list(&query).await.unwrap();

    store
        .update_status(&ComplaintId::from("5"), ComplaintStatus::InProgress)
        .await
        .unwrap();
    store.list(&query).await.unwrap();
}

#[tokio::test]
async fn test_list_in_flight_during_a_write_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([row(5, "OPEN")]))
                .set_delay(Duration::from_millis(400)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(5, "RESOLVED")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(5, "RESOLVED")])))
        .mount(&server)
        .await;

    let store = Arc::new(store(&server));
    let query = ComplaintQuery::all();

    let stale = tokio::spawn({
        let store = store.clone();
        let query = query.clone();
        async move { store.list(&query).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    store
        .update_status(&ComplaintId::from("5"), ComplaintStatus::Resolved)
        .await
        .unwrap();

    assert_eq!(stale.await.unwrap().unwrap()[0].status, ComplaintStatus::Open);
    let fresh = store.list(&query).await.unwrap();
    assert_eq!(fresh[0].status, ComplaintStatus::Resolved);
}

#[tokio::test]
async fn test_search_text_is_sent_as_a_literal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("title", "ilike.*50\\% off & more*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let query = ComplaintQuery::all().with_title_containing(Some("50% off & more".to_string()));
    let complaints = store(&server).list(&query).await.unwrap();
    assert!(complaints.is_empty());
}

#[tokio::test]
async fn test_list_maps_query_to_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("user_id", "eq.u-1"))
        .and(query_param("status", "eq.OPEN"))
        .and(query_param("title", "ilike.*light*"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(2, "OPEN"), row(1, "OPEN")])))
        .expect(1)
        .mount(&server)
        .await;

    let query = ComplaintQuery::owned_by("u-1")
        .with_status(Some(ComplaintStatus::Open))
        .with_title_containing(Some("light".to_string()));
    let complaints = store(&server).list(&query).await.unwrap();
    assert_eq!(complaints.len(), 2);
}

#[tokio::test]
async fn test_permission_denied_surfaces_as_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "permission denied for table complaints"
        })))
        .mount(&server)
        .await;

    let err = store(&server)
        .update_status(&ComplaintId::from("1"), ComplaintStatus::Resolved)
        .await
        .unwrap_err();

    assert!(err.is_permission_denied());
    assert!(err.to_string().contains("permission denied for table complaints"));
}

#[tokio::test]
async fn test_engine_set_status_round_trip_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(42, "RESOLVED")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(42, "RESOLVED")])))
        .expect(1)
        .mount(&server)
        .await;

    let engine = TransitionEngine::new(Arc::new(store(&server)), Duration::from_millis(10));
    let outcome = engine
        .set_status(&ComplaintId::from(42u64), ComplaintStatus::Resolved)
        .await
        .unwrap();

    match outcome {
        SetStatusOutcome::Confirmed { complaint, .. } => {
            assert_eq!(complaint.status, ComplaintStatus::Resolved)
        }
        other => panic!("expected a confirmed outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_engine_readback_failure_is_unconfirmed() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(42, "OPEN")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/complaints"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream timeout"))
        .mount(&server)
        .await;

    let engine = TransitionEngine::new(Arc::new(store(&server)), Duration::from_millis(10));
    let outcome = engine
        .set_status(&ComplaintId::from("42"), ComplaintStatus::Open)
        .await
        .unwrap();

    assert!(!outcome.is_confirmed());
}

#[tokio::test]
async fn test_sign_in_establishes_admin_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_json(json!({"email": "desk@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r-1",
            "user": {
                "id": "admin-1",
                "email": "desk@example.com",
                "user_metadata": {"role": "admin", "first_name": "Desk"}
            }
        })))
        .mount(&server)
        .await;

    let auth = AuthClient::new(http(&server));
    let grant = auth.sign_in_with_password("desk@example.com", "pw").await.unwrap();
    let session = Session::establish(&grant, &[], Utc::now());

    assert_eq!(session.role, Role::Admin);
    assert_eq!(session.access_token, "jwt-1");
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn test_bad_credentials_surface_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let err = AuthClient::new(http(&server))
        .sign_in_with_password("me@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 400, ref message } if message == "Invalid login credentials"));
}

#[tokio::test]
async fn test_sign_up_sends_profile_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_json(json!({
            "email": "new@example.com",
            "password": "pw",
            "data": {"first_name": "Ada", "last_name": "Lovelace", "role": "user"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-new",
            "email": "new@example.com",
            "user_metadata": {"role": "user", "first_name": "Ada", "last_name": "Lovelace"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = AuthClient::new(http(&server))
        .sign_up(&complaint_tracker::store::SignUpRequest {
            email: "new@example.com".into(),
            password: "pw".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            role: "user".into(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, "u-new");
}

#[tokio::test]
async fn test_image_upload_returns_public_url() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let image = dir.path().join("photo.png");
    std::fs::write(&image, b"\x89PNG fake").unwrap();

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/complaint-images/\d+-photo\.png$"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "complaint-images/x"})))
        .expect(1)
        .mount(&server)
        .await;

    let storage = ImageStorage::new(http(&server), "complaint-images");
    let url = storage.upload(&image).await.unwrap();

    let prefix = format!("{}/storage/v1/object/public/complaint-images/", server.uri());
    assert!(url.starts_with(&prefix), "unexpected url {url}");
    assert!(url.ends_with("-photo.png"));
}

#[tokio::test]
async fn test_image_name_with_url_delimiters_is_encoded() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let image = dir.path().join("receipt#2.png");
    std::fs::write(&image, b"\x89PNG fake").unwrap();

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/complaint-images/\d+-receipt%232\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "complaint-images/x"})))
        .expect(1)
        .mount(&server)
        .await;

    let storage = ImageStorage::new(http(&server), "complaint-images");
    let url = storage.upload(&image).await.unwrap();

    assert!(url.ends_with("-receipt%232.png"), "unexpected url {url}");
    assert!(!url.contains('#'));
}
