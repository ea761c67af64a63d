// File: edugate-core/tests/http_tests.rs

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use edugate_common::models::Role;
use edugate_core::http::router;
use edugate_core::test_utils::fixtures::{
    Catalog, Services, admin, in_days, pool_request, seed_catalog, student, test_token_codec,
};
use edugate_core::test_utils::MemoryStore;

struct TestApp {
    svc: Services,
    app: Router,
    catalog: Catalog,
}

async fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let svc = Services::new(store);
    let app = router(svc.app_state());
    TestApp { svc, app, catalog }
}

async fn student_token(t: &TestApp, name: &str) -> (Uuid, String) {
    let s = student(name);
    let id = s.student_id;
    t.svc.store.add_student(s).await;
    let token = test_token_codec().issue(id, Role::Student).unwrap();
    (id, token)
}

async fn admin_token(t: &TestApp) -> String {
    let a = admin("root");
    let id = a.admin_id;
    t.svc.store.add_admin(a).await;
    test_token_codec().issue(id, Role::Admin).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn first_code(t: &TestApp, codes: u32) -> String {
    let created = t
        .svc
        .codes
        .create_pool(pool_request("Algebra2024", codes, in_days(7), &[t.catalog.m1.material_id]))
        .await
        .unwrap();
    t.svc.store.code_values(created.pool_id).await.remove(0)
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let t = test_app().await;
    let req = Request::builder()
        .uri("/entitlements")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, _) = send(&t.app, get("/entitlements", "not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_redeem_code_flow() {
    let t = test_app().await;
    let (_, token) = student_token(&t, "Laila").await;
    let code = first_code(&t, 2).await;

    let (status, body) = send(
        &t.app,
        post_json("/redeemCode", &token, json!({ "code": code.to_lowercase() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Code redeemed successfully");
    assert_eq!(body["data"]["code"], code.as_str());
    assert_eq!(body["data"]["poolName"], "Algebra2024");

    let (status, body) = send(&t.app, get("/entitlements", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["materialsWithLectures"],
        json!([t.catalog.m1.material_id])
    );

    let (status, body) = send(&t.app, get("/redeemCodes", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_redeem_failures_map_to_distinct_statuses() {
    let t = test_app().await;
    let (_, first) = student_token(&t, "First").await;
    let (_, second) = student_token(&t, "Second").await;
    let created = t
        .svc
        .codes
        .create_pool(pool_request("Algebra2024", 2, in_days(7), &[t.catalog.m1.material_id]))
        .await
        .unwrap();
    let codes = t.svc.store.code_values(created.pool_id).await;

    let (status, body) = send(&t.app, post_json("/redeemCode", &first, json!({ "code": "ZZZZZZZZZZZZ" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Code not found");

    let (status, _) = send(&t.app, post_json("/redeemCode", &first, json!({ "code": codes[0] }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&t.app, post_json("/redeemCode", &second, json!({ "code": codes[0] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "code_already_used");

    let (status, body) = send(&t.app, post_json("/redeemCode", &first, json!({ "code": codes[1] }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "duplicate_redemption_in_pool");

    let (status, body) = send(&t.app, post_json("/redeemCode", &first, json!({ "code": "short" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["errors"][0]["field"], "code");
}

#[tokio::test]
async fn test_arabic_error_message() {
    let t = test_app().await;
    let (_, token) = student_token(&t, "Arabic").await;
    let mut req = post_json("/redeemCode", &token, json!({ "code": "ZZZZZZZZZZZZ" }));
    req.headers_mut()
        .insert(header::ACCEPT_LANGUAGE, "ar-EG,en;q=0.5".parse().unwrap());
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "الكود غير موجود");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let t = test_app().await;
    let (_, token) = student_token(&t, "Broken").await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/redeemCode")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"code\":"))
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_content_routes_respect_entitlements() {
    let t = test_app().await;
    let (_, token) = student_token(&t, "Reader").await;
    let course = t.catalog.course_m1.course_id;

    let (status, body) = send(&t.app, get(&format!("/videos?course={course}"), &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, body) = send(&t.app, get("/videos", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "course");

    let (status, body) = send(
        &t.app,
        get(&format!("/lectures/{}", t.catalog.m1.material_id), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["hasFullAccess"], false);

    let code = first_code(&t, 1).await;
    let (status, _) = send(&t.app, post_json("/redeemCode", &token, json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&t.app, get(&format!("/videos?course={course}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalDocs"], 1);

    let (status, _) = send(&t.app, get(&format!("/videos/{}", Uuid::new_v4()), &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let t = test_app().await;
    let (_, student) = student_token(&t, "Sneaky").await;
    let (status, _) = send(&t.app, get("/admin/codesGroups", &student)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A well-formed admin token for an account that does not exist.
    let ghost = test_token_codec().issue(Uuid::new_v4(), Role::Admin).unwrap();
    let (status, _) = send(&t.app, get("/admin/codesGroups", &ghost)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_pool_lifecycle() {
    let t = test_app().await;
    let token = admin_token(&t).await;

    let (status, body) = send(
        &t.app,
        post_json(
            "/admin/codesGroup",
            &token,
            json!({
                "name": "Mechanics Fall",
                "materialsWithQuestions": [t.catalog.m2.material_id],
                "codeCount": 3,
                "expiration": in_days(30),
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["codeCount"], 3);
    let pool_id = body["data"]["poolId"].as_str().unwrap().to_string();

    let (status, body) = send(&t.app, get("/admin/codesGroups?name=mechanics", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalDocs"], 1);
    assert_eq!(body["data"]["docs"][0]["totalCodes"], 3);

    let (status, body) = send(&t.app, get(&format!("/admin/codes/{pool_id}?usage=unused"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalCodes"], 3);
    assert_eq!(body["data"]["totalUsed"], 0);

    let (status, _) = send(&t.app, get("/admin/codes/not-a-uuid", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/admin/codesGroup/{pool_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["codesRemoved"], 3);
}

#[tokio::test]
async fn test_admin_delete_refused_with_used_codes() {
    let t = test_app().await;
    let token = admin_token(&t).await;
    let (student_id, _) = student_token(&t, "Owner").await;
    let created = t
        .svc
        .codes
        .create_pool(pool_request("Guarded", 2, in_days(7), &[t.catalog.m1.material_id]))
        .await
        .unwrap();
    let code = t.svc.store.code_values(created.pool_id).await.remove(0);
    t.svc.redemptions.redeem(student_id, &code).await.unwrap();

    let req = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/admin/codesGroup/{}", created.pool_id))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "pool_has_used_codes");
}
