//! Integration tests: build the router over an in-memory store and drive it
//! with `oneshot` requests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{Value, json};
use sso_api::{AppState, config::ApiConfig};
use sso_core::AuthError;
use sso_core::auth::password::PasswordHasher;
use sso_core::config::SsoConfig;
use sso_core::federation::{FederationResolver, IdentityProvider, ProviderProfile};
use sso_core::models::{NewIdentity, Provider, Role};
use sso_core::store::{CredentialStore, MemoryStore};
use tower::ServiceExt;

struct Harness {
    app: Router,
    state: AppState,
    store: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let mut sso = SsoConfig::with_secret("test-secret");
    sso.bcrypt_cost = 4;
    let state = AppState::new(store.clone(), ApiConfig::with_sso(sso)).expect("state");
    Harness {
        app: sso_api::router(state.clone()),
        state,
        store,
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl Reply {
    fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(str::to_string)
    }
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Reply {
        status,
        headers,
        body,
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn register(h: &Harness, email: &str) -> Reply {
    send(
        &h.app,
        json_request(
            Method::POST,
            "/auth/register",
            None,
            json!({
                "email": email,
                "password": "secret123",
                "first_name": "Test",
                "last_name": "User",
            }),
        ),
    )
    .await
}

/// Seed an identity directly and sign it in through the API.
async fn seeded_token(h: &Harness, email: &str, role: Role, is_admin: bool) -> (i64, String) {
    let hash = PasswordHasher::new(4).hash("secret123").unwrap();
    let identity = h
        .store
        .create(NewIdentity {
            email: email.into(),
            password_hash: Some(hash),
            first_name: "Seed".into(),
            last_name: "User".into(),
            is_active: true,
            role,
            is_admin,
            ..Default::default()
        })
        .await
        .unwrap();
    let reply = send(
        &h.app,
        json_request(
            Method::POST,
            "/auth/login",
            None,
            json!({"email": email, "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    (identity.id, reply.body["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn register_then_fetch_profile_by_header_or_cookie() {
    let h = harness();
    let reply = register(&h, "alice@example.com").await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["user"]["email"], "alice@example.com");
    assert_eq!(reply.body["expiresIn"], 7 * 24 * 60 * 60);
    assert!(reply.body["user"].get("password_hash").is_none());
    let set_cookie = reply.cookie("jwt").expect("jwt cookie");
    assert!(set_cookie.contains("HttpOnly"));

    let token = reply.body["token"].as_str().unwrap();
    let me = send(&h.app, get("/api/v1/user", Some(token))).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], "alice@example.com");

    let by_cookie = Request::builder()
        .uri("/api/v1/user")
        .header(COOKIE, format!("jwt={token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&h.app, by_cookie).await.status, StatusCode::OK);

    assert_eq!(
        send(&h.app, get("/api/v1/user", None)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn duplicate_registration_conflicts_and_bad_input_is_rejected() {
    let h = harness();
    assert_eq!(register(&h, "bob@example.com").await.status, StatusCode::CREATED);
    assert_eq!(register(&h, "BOB@example.com").await.status, StatusCode::CONFLICT);
    assert_eq!(register(&h, "not-an-email").await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let h = harness();
    register(&h, "carol@example.com").await;
    let reply = send(
        &h.app,
        json_request(
            Method::POST,
            "/auth/login",
            None,
            json!({"email": "carol@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "Invalid credentials");
}

#[tokio::test]
async fn deactivated_user_token_stops_working() {
    let h = harness();
    let (_, root) = seeded_token(&h, "admin@example.com", Role::Admin, true).await;
    let reply = register(&h, "dave@example.com").await;
    let token = reply.body["token"].as_str().unwrap().to_string();
    let id = reply.body["user"]["id"].as_i64().unwrap();

    let deactivated = send(
        &h.app,
        post(&format!("/admin/api/users/{id}/deactivate"), &root),
    )
    .await;
    assert_eq!(deactivated.status, StatusCode::OK);
    assert_eq!(deactivated.body["user"]["isActive"], false);

    let me = send(&h.app, get("/api/v1/user", Some(&token))).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["message"], "Account is deactivated");
}

#[tokio::test]
async fn update_profile_through_api() {
    let h = harness();
    let reply = register(&h, "erin@example.com").await;
    let token = reply.body["token"].as_str().unwrap().to_string();
    let updated = send(
        &h.app,
        json_request(
            Method::PUT,
            "/api/v1/user",
            Some(&token),
            json!({"first_name": "Erin", "last_name": "Example", "location": "Leeds"}),
        ),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["user"]["firstName"], "Erin");
    assert_eq!(updated.body["user"]["location"], "Leeds");
}

#[tokio::test]
async fn admin_console_enforces_privilege_levels() {
    let h = harness();
    let (root_id, root) = seeded_token(&h, "admin@example.com", Role::Admin, true).await;
    let (_, flag) = seeded_token(&h, "flag@example.com", Role::User, true).await;
    let (john_id, john) = seeded_token(&h, "john@example.com", Role::User, false).await;

    assert_eq!(
        send(&h.app, get("/admin/api/users", Some(&john))).await.status,
        StatusCode::FORBIDDEN
    );

    let listed = send(&h.app, get("/admin/api/users?limit=500", Some(&flag))).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["users"].as_array().unwrap().len(), 3);
    assert_eq!(listed.body["limit"], 100);

    let promote = format!("/admin/api/users/{john_id}/promote");
    assert_eq!(send(&h.app, post(&promote, &flag)).await.status, StatusCode::FORBIDDEN);
    let promoted = send(&h.app, post(&promote, &root)).await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["user"]["role"], "admin");

    let own = format!("/admin/api/users/{root_id}/deactivate");
    let reply = send(&h.app, post(&own, &root)).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["message"], "cannot deactivate your own account");

    let stats = send(&h.app, get("/admin/api/stats", Some(&root))).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["totalUsers"], 3);
    assert_eq!(stats.body["adminUsers"], 3);
}

#[tokio::test]
async fn admin_search_role_filter_and_detail() {
    let h = harness();
    let (_, root) = seeded_token(&h, "admin@example.com", Role::Admin, true).await;
    let reply = register(&h, "jane.smith@example.com").await;
    let jane_id = reply.body["user"]["id"].as_i64().unwrap();

    let found = send(&h.app, get("/admin/api/users?search=SMITH", Some(&root))).await;
    assert_eq!(found.body["users"].as_array().unwrap().len(), 1);

    let admins = send(&h.app, get("/admin/api/users?role=admin", Some(&root))).await;
    assert_eq!(admins.body["users"].as_array().unwrap().len(), 1);

    let bad_role = send(&h.app, get("/admin/api/users?role=root", Some(&root))).await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);

    let detail = send(&h.app, get(&format!("/admin/api/users/{jane_id}"), Some(&root))).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["user"]["email"], "jane.smith@example.com");

    let recent = send(&h.app, get("/admin/api/users/recent?days=1", Some(&root))).await;
    assert_eq!(recent.body["users"].as_array().unwrap().len(), 2);

    let wide = send(
        &h.app,
        get("/admin/api/users/recent?days=1000000000", Some(&root)),
    )
    .await;
    assert_eq!(wide.status, StatusCode::OK);
    assert_eq!(wide.body["users"].as_array().unwrap().len(), 2);

    let missing = send(&h.app, get("/admin/api/users/999", Some(&root))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_update_rejects_invalid_role_and_delete_removes_user() {
    let h = harness();
    let (_, root) = seeded_token(&h, "admin@example.com", Role::Admin, true).await;
    let reply = register(&h, "frank@example.com").await;
    let id = reply.body["user"]["id"].as_i64().unwrap();
    let uri = format!("/admin/api/users/{id}");

    let bad = send(
        &h.app,
        json_request(Method::PUT, &uri, Some(&root), json!({"role": "overlord"})),
    )
    .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let ok = send(
        &h.app,
        json_request(Method::PUT, &uri, Some(&root), json!({"role": "moderator"})),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["user"]["role"], "moderator");

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri(&uri)
        .header(AUTHORIZATION, format!("Bearer {root}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&h.app, delete).await.status, StatusCode::OK);
    assert!(h.store.get_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let h = harness();
    let reply = send(
        &h.app,
        Request::builder()
            .method(Method::POST)
            .uri("/auth/logout")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let cookie = reply.cookie("jwt").expect("cleared cookie");
    assert!(cookie.contains("Max-Age=0"));
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

struct StubGoogle;

#[async_trait]
impl IdentityProvider for StubGoogle {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        Ok(format!("https://accounts.example.com/auth?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        Ok(format!("access-{code}"))
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<ProviderProfile, AuthError> {
        Ok(ProviderProfile {
            provider: Provider::Google,
            subject: "g-42".into(),
            email: "grace@example.com".into(),
            email_verified: true,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            avatar_url: None,
            bio: None,
            website: None,
            location: None,
        })
    }
}

fn oauth_harness() -> Harness {
    let mut h = harness();
    h.state.federation =
        FederationResolver::new(h.state.auth.clone()).with_provider(Arc::new(StubGoogle));
    h.app = sso_api::router(h.state.clone());
    h
}

fn state_from_cookie(set_cookie: &str) -> String {
    set_cookie
        .trim_start_matches("oauth_state=")
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn oauth_login_redirects_with_state_cookie() {
    let h = oauth_harness();
    let reply = send(&h.app, get("/auth/google", None)).await;
    assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT);
    let state = state_from_cookie(&reply.cookie("oauth_state").expect("state cookie"));
    let location = reply.headers[LOCATION].to_str().unwrap();
    assert!(location.ends_with(&format!("state={state}")));

    let unconfigured = send(&h.app, get("/auth/github", None)).await;
    assert_eq!(unconfigured.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oauth_callback_with_forged_state_creates_nothing() {
    let h = oauth_harness();
    let begin = send(&h.app, get("/auth/google", None)).await;
    let state = state_from_cookie(&begin.cookie("oauth_state").unwrap());

    let req = Request::builder()
        .uri("/auth/google/callback?state=forged&code=abc")
        .header(COOKIE, format!("oauth_state={state}"))
        .body(Body::empty())
        .unwrap();
    let reply = send(&h.app, req).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.cookie("oauth_state").unwrap().contains("Max-Age=0"));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn oauth_callback_signs_in_and_redirects_to_dashboard() {
    let h = oauth_harness();
    let begin = send(&h.app, get("/auth/google", None)).await;
    let state = state_from_cookie(&begin.cookie("oauth_state").unwrap());

    let req = Request::builder()
        .uri(format!("/auth/google/callback?state={state}&code=abc"))
        .header(COOKIE, format!("oauth_state={state}"))
        .body(Body::empty())
        .unwrap();
    let reply = send(&h.app, req).await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(reply.headers[LOCATION], "/dashboard");

    let jwt = reply.cookie("jwt").expect("session cookie");
    let token = jwt.trim_start_matches("jwt=").split(';').next().unwrap();
    let me = send(&h.app, get("/api/v1/user", Some(token))).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], "grace@example.com");
    assert_eq!(me.body["user"]["isVerified"], true);
    assert_eq!(h.store.len().await, 1);
}
