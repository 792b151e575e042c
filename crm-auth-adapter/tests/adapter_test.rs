//! Integration tests wiring the CRM auth provider to a mocked Supabase.

use std::sync::Arc;

use chrono::Utc;
use crm_auth_adapter::{
    CrmAuthProvider, DashboardAuthProvider, Error, KeyValueStore, MemoryStore, SharedLocation,
    SupabaseClient, USER_STORAGE_KEY,
};
use crm_auth_common::{AccessParams, Credentials, Location, Role};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";
const USER_ID: &str = "0b7d4a52-8f0e-4c8e-9a43-6d2f1b9e7c55";

struct TestApp {
    server: MockServer,
    store: Arc<MemoryStore>,
    location: Arc<SharedLocation>,
    provider: CrmAuthProvider,
}

async fn create_test_app() -> TestApp {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let location = Arc::new(SharedLocation::default());
    let client = Arc::new(SupabaseClient::new(&server.uri(), ANON_KEY, store.clone()));

    let provider = CrmAuthProvider::supabase(
        client,
        store.clone(),
        location.clone(),
        Arc::new(|role: Role, params: &AccessParams| {
            role == Role::Admin || params.resource != "sales"
        }),
    );

    TestApp {
        server,
        store,
        location,
        provider,
    }
}

async fn mount_init_state(server: &MockServer, is_initialized: i64, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/init_state"))
        .and(query_param("select", "is_initialized"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "is_initialized": is_initialized }])),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-abc",
            "refresh_token": "refresh-abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": Utc::now().timestamp() + 3600,
            "user": {"id": USER_ID, "email": "jane@example.com", "role": "authenticated"}
        })))
        .mount(server)
        .await;
}

async fn mount_sale(server: &MockServer, administrator: bool) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/sales"))
        .and(query_param("select", "id,first_name,last_name,avatar,administrator"))
        .and(query_param("user_id", format!("eq.{}", USER_ID)))
        .and(header("authorization", "Bearer access-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "first_name": "Jane",
            "last_name": "Doe",
            "avatar": {"src": "https://cdn.example.com/jane.png"},
            "administrator": administrator
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn credentials() -> Credentials {
    Credentials::new("jane@example.com", "secret")
}

#[tokio::test]
async fn test_login_then_access_as_user() {
    let app = create_test_app().await;
    mount_sign_in(&app.server).await;
    mount_sale(&app.server, false).await;
    mount_init_state(&app.server, 1, 1).await;

    app.provider.login(&credentials()).await.unwrap();

    let stored: Value =
        serde_json::from_str(&app.store.get(USER_STORAGE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(
        stored,
        json!({
            "id": 42,
            "first_name": "Jane",
            "last_name": "Doe",
            "avatar": {"src": "https://cdn.example.com/jane.png"},
            "administrator": false
        })
    );

    app.location.set(Location::parse("/#/contacts").unwrap());
    app.provider.check_auth(&json!({})).await.unwrap();

    assert!(app
        .provider
        .can_access(&AccessParams::new("list", "contacts"))
        .await
        .unwrap());
    assert!(!app
        .provider
        .can_access(&AccessParams::new("list", "sales"))
        .await
        .unwrap());

    let identity = app.provider.get_identity().await.unwrap();
    assert_eq!(identity.full_name, "Jane Doe");
    assert_eq!(identity.avatar.as_deref(), Some("https://cdn.example.com/jane.png"));
}

#[tokio::test]
async fn test_admin_can_access_sales() {
    let app = create_test_app().await;
    mount_sign_in(&app.server).await;
    mount_sale(&app.server, true).await;
    mount_init_state(&app.server, 1, 1).await;

    app.provider.login(&credentials()).await.unwrap();

    assert!(app
        .provider
        .can_access(&AccessParams::new("edit", "sales"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_login_without_sale_is_fatal() {
    let app = create_test_app().await;
    mount_sign_in(&app.server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/sales"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "details": "The result contains 0 rows",
            "hint": null,
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .mount(&app.server)
        .await;

    let result = app.provider.login(&credentials()).await;

    assert!(matches!(result, Err(Error::SaleNotFound)));
    assert!(app.store.get(USER_STORAGE_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_uninitialized_deployment_redirects_to_sign_up() {
    let app = create_test_app().await;
    mount_sign_in(&app.server).await;
    mount_sale(&app.server, true).await;
    mount_init_state(&app.server, 0, 1).await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.server)
        .await;

    app.provider.login(&credentials()).await.unwrap();
    app.location.set(Location::parse("/#/deals").unwrap());

    let error = app.provider.check_auth(&json!({})).await.unwrap_err();
    let signal = serde_json::to_value(error.redirect_signal().unwrap()).unwrap();
    assert_eq!(signal, json!({"redirectTo": "/sign-up", "message": false}));

    // Signed out, and the memoized answer is reused.
    assert!(app.provider.check_auth(&json!({})).await.unwrap_err().is_redirect());
    assert!(!app
        .provider
        .can_access(&AccessParams::new("list", "contacts"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_sign_up_page_needs_no_backend() {
    let app = create_test_app().await;
    mount_init_state(&app.server, 0, 0).await;

    app.location.set(Location::parse("/sign-up").unwrap());
    app.provider.check_auth(&json!({})).await.unwrap();
}
