use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use campus_application::{AccessDecisionEngine, NoopDecisionAuditSink, PermissionResolver};
use campus_core::UserIdentity;
use campus_domain::{
    ACCESS_DENIED_MESSAGE, Permission, PermissionCode, PermissionId, Role, RoleId,
    RoutePermissionRegistry, UserId, UserRoleAssignment, builtin_route_catalog,
};
use campus_infrastructure::InMemoryAuthorizationRepository;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions::{MemoryStore, SessionStore};

use super::build_router;
use crate::api_services::session_layer;
use crate::middleware::SESSION_USER_KEY;
use crate::state::AppState;

struct TestApp {
    router: Router,
    store: MemoryStore,
}

async fn test_app(granted: &[&str], user_id: UserId) -> TestApp {
    let repository = Arc::new(InMemoryAuthorizationRepository::new());
    let role_id = RoleId::new();
    let seeded = async {
        repository
            .insert_role(Role::new(role_id, "hr_clerk", "HR clerk")?)
            .await?;
        for code in granted {
            let permission_id = PermissionId::new();
            repository
                .insert_permission(Permission::new(
                    permission_id,
                    PermissionCode::new(*code)?,
                    *code,
                )?)
                .await?;
            repository.grant(role_id, permission_id).await?;
        }
        repository
            .assign(UserRoleAssignment {
                user_id,
                role_id,
                assigned_at: Utc::now(),
                assigned_by: None,
                expires_at: None,
                is_active: true,
            })
            .await
    };
    if let Err(error) = seeded.await {
        panic!("failed to seed repository: {error}");
    }

    let Ok(registry) = RoutePermissionRegistry::build(builtin_route_catalog()) else {
        panic!("built-in catalog must build");
    };
    let Ok(pool) = PgPoolOptions::new().connect_lazy("postgres://localhost/campus_unused") else {
        panic!("lazy pool must be constructible");
    };

    let access_engine = AccessDecisionEngine::new(
        Arc::new(registry),
        PermissionResolver::new(repository),
        Arc::new(NoopDecisionAuditSink),
    );
    let state = AppState {
        access_engine,
        postgres_pool: pool,
        redis_client: None,
        redis_required: false,
    };

    let store = MemoryStore::default();
    let Ok(router) = build_router(
        state,
        "http://localhost:3000",
        session_layer(store.clone(), false),
    ) else {
        panic!("router must build");
    };

    TestApp { router, store }
}

async fn session_cookie(store: &MemoryStore, user_id: UserId) -> String {
    let identity = UserIdentity::new(user_id.to_string(), "Dana", None, Utc::now());
    let Ok(identity) = serde_json::to_value(identity) else {
        panic!("identity must serialize");
    };

    raw_session_cookie(store, identity).await
}

async fn raw_session_cookie(store: &MemoryStore, identity: Value) -> String {
    let mut record = Record {
        id: Id::default(),
        data: HashMap::from([(SESSION_USER_KEY.to_owned(), identity)]),
        expiry_date: OffsetDateTime::now_utc() + Duration::minutes(30),
    };
    if let Err(error) = store.create(&mut record).await {
        panic!("failed to store session: {error}");
    }

    format!("id={}", record.id)
}

fn request(method: &str, path: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    match builder.body(body) {
        Ok(request) => request,
        Err(error) => panic!("invalid test request: {error}"),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    serde_json::from_slice(&bytes).unwrap_or_default()
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn anonymous_api_request_gets_generic_401() {
    let app = test_app(&[], UserId::new()).await;

    let response = app
        .router
        .oneshot(request("GET", "/api/hr/employees", None, Body::empty()))
        .await;
    let Ok(response) = response else {
        panic!("router must respond");
    };

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"success": false, "error": ACCESS_DENIED_MESSAGE})
    );
}

#[tokio::test]
async fn anonymous_page_request_redirects_to_login() {
    let app = test_app(&[], UserId::new()).await;

    let response = app
        .router
        .oneshot(request("GET", "/hr/employees", None, Body::empty()))
        .await;
    let Ok(response) = response else {
        panic!("router must respond");
    };

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?next=%2Fhr%2Femployees"));
}

#[tokio::test]
async fn missing_permission_denies_api_with_403_without_codes() {
    let user_id = UserId::new();
    let app = test_app(&["hr.dashboard.view"], user_id).await;
    let cookie = session_cookie(&app.store, user_id).await;

    let response = app
        .router
        .oneshot(request("GET", "/api/hr/employees", Some(&cookie), Body::empty()))
        .await;
    let Ok(response) = response else {
        panic!("router must respond");
    };

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert!(!body.to_string().contains("hr.employees"));
}

#[tokio::test]
async fn missing_permission_redirects_page_to_fallback() {
    let user_id = UserId::new();
    let app = test_app(&["hr.dashboard.view"], user_id).await;
    let cookie = session_cookie(&app.store, user_id).await;

    let response = app
        .router
        .oneshot(request("GET", "/hr/employees", Some(&cookie), Body::empty()))
        .await;
    let Ok(response) = response else {
        panic!("router must respond");
    };

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/unauthorized"));
}

#[tokio::test]
async fn allowed_request_reaches_the_router() {
    let user_id = UserId::new();
    let app = test_app(&["hr.dashboard.view"], user_id).await;
    let cookie = session_cookie(&app.store, user_id).await;

    let response = app
        .router
        .oneshot(request("GET", "/hr/dashboard", Some(&cookie), Body::empty()))
        .await;

    assert!(response.is_ok_and(|response| response.status() == StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn auth_me_lists_effective_permissions() {
    let user_id = UserId::new();
    let app = test_app(&["hr.employees.view", "hr.dashboard.view"], user_id).await;
    let cookie = session_cookie(&app.store, user_id).await;

    let response = app
        .router
        .oneshot(request("GET", "/auth/me", Some(&cookie), Body::empty()))
        .await;
    let Ok(response) = response else {
        panic!("router must respond");
    };

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subject"], Value::String(user_id.to_string()));
    assert_eq!(
        body["permissions"],
        serde_json::json!(["hr.dashboard.view", "hr.employees.view"])
    );
}

#[tokio::test]
async fn auth_me_requires_a_session() {
    let app = test_app(&[], UserId::new()).await;

    let response = app
        .router
        .oneshot(request("GET", "/auth/me", None, Body::empty()))
        .await;

    assert!(response.is_ok_and(|response| response.status() == StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn access_check_reports_each_probe() {
    let user_id = UserId::new();
    let app = test_app(&["hr.employees.update"], user_id).await;
    let cookie = session_cookie(&app.store, user_id).await;

    let payload = serde_json::json!({
        "routes": [
            {"method": "PUT", "path": "/api/hr/employees/42"},
            {"method": "DELETE", "path": "/api/hr/employees/42"},
            {"method": "GET", "path": "/hr/some-unregistered-page"}
        ]
    });
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/access/check",
            Some(&cookie),
            Body::from(payload.to_string()),
        ))
        .await;
    let Ok(response) = response else {
        panic!("router must respond");
    };

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let allowed = body["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .map(|result| result["allowed"].as_bool().unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    assert_eq!(allowed, vec![true, false, true]);
}

#[tokio::test]
async fn access_check_rejects_unknown_methods() {
    let user_id = UserId::new();
    let app = test_app(&[], user_id).await;
    let cookie = session_cookie(&app.store, user_id).await;

    let payload = serde_json::json!({"routes": [{"method": "TRACE", "path": "/hr/dashboard"}]});
    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/access/check",
            Some(&cookie),
            Body::from(payload.to_string()),
        ))
        .await;

    assert!(response.is_ok_and(|response| response.status() == StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn unreadable_session_identity_is_treated_as_anonymous() {
    let app = test_app(&["hr.dashboard.view"], UserId::new()).await;
    let cookie = raw_session_cookie(&app.store, Value::String("garbage".to_owned())).await;

    let page = app
        .router
        .clone()
        .oneshot(request("GET", "/hr/dashboard", Some(&cookie), Body::empty()))
        .await;
    let Ok(page) = page else {
        panic!("router must respond");
    };
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&page), Some("/login?next=%2Fhr%2Fdashboard"));

    let api = app
        .router
        .clone()
        .oneshot(request("GET", "/api/hr/employees", Some(&cookie), Body::empty()))
        .await;
    let Ok(api) = api else {
        panic!("router must respond");
    };
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(api).await,
        serde_json::json!({"success": false, "error": ACCESS_DENIED_MESSAGE})
    );

    let me = app
        .router
        .oneshot(request("GET", "/auth/me", Some(&cookie), Body::empty()))
        .await;
    assert!(me.is_ok_and(|response| response.status() == StatusCode::UNAUTHORIZED));
}
