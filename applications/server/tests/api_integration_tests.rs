/// API integration tests
/// Drive the full router over a temp-file database
mod common;

use axum::http::{Method, StatusCode};
use common::{error_tag, TestApp, TEST_PASSWORD};
use serde_json::json;
use worklog_core::Role;

#[tokio::test]
async fn test_version_is_public() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/v1/version", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_signup_then_signin() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/v1/auth/signup",
            None,
            json!({ "name": "A", "email": "a@b.com", "password": "password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["role"], Role::User.value());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, body) = app
        .post(
            "/v1/auth/signin",
            None,
            json!({ "email": "A@B.com", "password": "password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "A");
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = TestApp::new().await;
    let user = json!({ "name": "A", "email": "a@b.com", "password": "password" });

    let (status, _) = app.post("/v1/auth/signup", None, user.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/v1/auth/signup", None, user).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "email_in_use");
}

#[tokio::test]
async fn test_signup_validation_tags() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/v1/auth/signup",
            None,
            json!({ "email": "a@b.com", "password": "password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "no_name");

    let (_, body) = app
        .post(
            "/v1/auth/signup",
            None,
            json!({ "name": "A", "email": "nope", "password": "password" }),
        )
        .await;
    assert_eq!(error_tag(&body), "bad_email");

    let (_, body) = app
        .post(
            "/v1/auth/signup",
            None,
            json!({ "name": "A", "email": "a@b.com", "password": "abc" }),
        )
        .await;
    assert_eq!(error_tag(&body), "bad_password");
}

#[tokio::test]
async fn test_signin_wrong_password() {
    let app = TestApp::new().await;
    app.seed_user("A", "a@b.com", Role::User).await;

    let (status, body) = app
        .post(
            "/v1/auth/signin",
            None,
            json!({ "email": "a@b.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_tag(&body), "auth_error");

    let (status, _) = app
        .post(
            "/v1/auth/signin",
            None,
            json!({ "email": "ghost@b.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signin_by_token() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let (status, body) = app
        .post("/v1/auth/signin-by-token", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id());

    let (status, body) = app
        .post("/v1/auth/signin-by-token", None, json!({ "token": "garbage" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_tag(&body), "bad_token");

    let (status, body) = app.post("/v1/auth/signin-by-token", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_tag(&body), "no_token");
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let (status, _) = app
        .put(
            "/v1/auth/password",
            None,
            json!({ "token": token, "password": "new-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/v1/auth/signin",
            None,
            json!({ "email": "a@b.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/v1/auth/signin",
            None,
            json!({ "email": "a@b.com", "password": "new-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .put("/v1/auth/password", None, json!({ "password": "new-secret" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "no_token");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/v1/work", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_tag(&body), "no_token");

    let (status, body) = app.get("/v1/work", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_tag(&body), "bad_token");
}

#[tokio::test]
async fn test_token_of_deleted_user_is_forbidden() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_user("Admin", "admin@b.com", Role::Admin).await;
    let (user, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let (status, _) = app
        .delete(&format!("/v1/users/{}", user.id()), &admin_token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/v1/work", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_tag(&body), "forbidden");
}

#[tokio::test]
async fn test_malformed_json_is_bad_format() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/v1/work")
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = tower::util::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error_tag(&body), "bad_format");
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_admin_manages_users() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_user("Admin", "admin@b.com", Role::Admin).await;

    let (status, created) = app
        .post(
            "/v1/users",
            Some(&admin_token),
            json!({
                "name": "M",
                "email": "m@b.com",
                "password": "password",
                "role": Role::Manager.value(),
                "working_hours": "28800"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["role"], Role::Manager.value());
    assert_eq!(created["working_hours"], 28800);

    let id = created["id"].as_i64().unwrap();
    let (status, updated) = app
        .put(
            &format!("/v1/users/{id}"),
            Some(&admin_token),
            json!({ "name": "Mary" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Mary");
    assert_eq!(updated["email"], "m@b.com");
    assert_eq!(updated["working_hours"], 28800);

    let (status, list) = app.get("/v1/users", &admin_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (status, body) = app.delete(&format!("/v1/users/{id}"), &admin_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.get(&format!("/v1/users/{id}"), &admin_token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "user_not_found");
}

#[tokio::test]
async fn test_regular_user_cannot_manage_users() {
    let app = TestApp::new().await;
    let (other, _) = app.seed_user("B", "b@b.com", Role::User).await;
    let (_, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let (status, _) = app.get("/v1/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/v1/users/{}", other.id()), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/v1/users",
            Some(&token),
            json!({ "name": "C", "email": "c@b.com", "password": "password" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_edits_own_profile_but_not_role() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("A", "a@b.com", Role::User).await;
    let uri = format!("/v1/users/{}", user.id());

    let (status, body) = app
        .put(&uri, Some(&token), json!({ "working_hours": 3600 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["working_hours"], 3600);

    let (status, body) = app
        .put(&uri, Some(&token), json!({ "role": Role::Admin.value() }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_tag(&body), "forbidden");

    let (_, body) = app.get(&uri, &token).await;
    assert_eq!(body["role"], Role::User.value());
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = TestApp::new().await;
    let (admin, token) = app.seed_user("Admin", "admin@b.com", Role::Admin).await;

    let (status, body) = app
        .delete(&format!("/v1/users/{}", admin.id()), &token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_tag(&body), "forbidden");

    let (status, _) = app.get(&format!("/v1/users/{}", admin.id()), &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_user_with_records() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_user("Admin", "admin@b.com", Role::Admin).await;
    let (user, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let (status, _) = app
        .post(
            "/v1/work",
            Some(&token),
            json!({ "when": "2016-08-24", "duration": 3600, "note": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .delete(&format!("/v1/users/{}", user.id()), &admin_token)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "user_has_records");
}

#[tokio::test]
async fn test_bad_path_id() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Admin", "admin@b.com", Role::Admin).await;

    let (status, body) = app.get("/v1/users/abc", &token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "bad_id");
}

// ============================================================================
// Work records
// ============================================================================

#[tokio::test]
async fn test_add_and_get_record() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let (status, _) = app
        .put(
            &format!("/v1/users/{}", user.id()),
            Some(&token),
            json!({ "working_hours": 28800 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, created) = app
        .post(
            "/v1/work",
            Some(&token),
            json!({
                "user_id": user.id(),
                "when": "2016-08-24",
                "duration": 7200,
                "note": "x"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);

    let (status, record) = app.get(&format!("/v1/work/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["duration"], 7200);
    assert_eq!(record["note"], "x");
    assert_eq!(record["when"], "2016-08-24");
    assert_eq!(record["user_name"], "A");
    assert_eq!(record["is_under_hours"], true);
    assert!(record["created"].is_string());
}

#[tokio::test]
async fn test_add_record_validation_tags() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let cases = [
        (json!({ "duration": 60, "note": "x" }), "no_date"),
        (json!({ "when": "24/08/2016", "duration": 60, "note": "x" }), "bad_date"),
        (json!({ "when": "2016-08-24", "note": "x" }), "no_duration"),
        (json!({ "when": "2016-08-24", "duration": -5, "note": "x" }), "bad_duration"),
        (json!({ "when": "2016-08-24", "duration": 90000, "note": "x" }), "bad_duration"),
        (json!({ "when": "2016-08-24", "duration": 60 }), "no_note"),
    ];

    for (body, tag) in cases {
        let (status, response) = app.post("/v1/work", Some(&token), body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{tag}");
        assert_eq!(error_tag(&response), tag);
    }
}

#[tokio::test]
async fn test_user_cannot_add_record_for_someone_else() {
    let app = TestApp::new().await;
    let (other, _) = app.seed_user("B", "b@b.com", Role::User).await;
    let (_, token) = app.seed_user("A", "a@b.com", Role::User).await;

    // Rejected before field validation
    let (status, body) = app
        .post("/v1/work", Some(&token), json!({ "user_id": other.id() }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_tag(&body), "forbidden");
}

#[tokio::test]
async fn test_admin_adds_record_for_unknown_user() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Admin", "admin@b.com", Role::Admin).await;

    let (status, body) = app
        .post(
            "/v1/work",
            Some(&token),
            json!({ "user_id": 9999, "when": "2016-08-24", "duration": 60, "note": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "unknown_user");
}

#[tokio::test]
async fn test_manager_cannot_touch_others_records() {
    let app = TestApp::new().await;
    let (_, user_token) = app.seed_user("A", "a@b.com", Role::User).await;
    let (_, manager_token) = app.seed_user("M", "m@b.com", Role::Manager).await;

    let (_, created) = app
        .post(
            "/v1/work",
            Some(&user_token),
            json!({ "when": "2016-08-24", "duration": 60, "note": "x" }),
        )
        .await;
    let uri = format!("/v1/work/{}", created["id"]);

    let (status, _) = app.get(&uri, &manager_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&uri, Some(&manager_token), json!({ "note": "edited" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, &manager_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listing_is_scoped_to_caller() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.seed_user("Admin", "admin@b.com", Role::Admin).await;
    let (a, a_token) = app.seed_user("A", "a@b.com", Role::User).await;
    let (b, b_token) = app.seed_user("B", "b@b.com", Role::User).await;

    for (token, day) in [
        (&a_token, "2016-08-01"),
        (&a_token, "2016-08-10"),
        (&b_token, "2016-08-05"),
    ] {
        let (status, _) = app
            .post(
                "/v1/work",
                Some(token),
                json!({ "when": day, "duration": 60, "note": "x" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // A regular user asking for someone else still only sees their own
    let (status, list) = app
        .get(&format!("/v1/work?user_id={}", b.id()), &a_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|r| r["user_id"] == a.id()));

    let (_, all) = app.get("/v1/work", &admin_token).await;
    let days: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["when"].as_str().unwrap())
        .collect();
    assert_eq!(days, vec!["2016-08-01", "2016-08-05", "2016-08-10"]);

    let (_, ranged) = app
        .get("/v1/work?from=2016-08-02&to=2016-08-10", &admin_token)
        .await;
    assert_eq!(ranged.as_array().unwrap().len(), 2);

    let (status, body) = app.get("/v1/work?from=yesterday", &admin_token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "bad_date");
}

#[tokio::test]
async fn test_update_and_delete_own_record() {
    let app = TestApp::new().await;
    let (other, _) = app.seed_user("B", "b@b.com", Role::User).await;
    let (_, token) = app.seed_user("A", "a@b.com", Role::User).await;

    let (_, created) = app
        .post(
            "/v1/work",
            Some(&token),
            json!({ "when": "2016-08-24", "duration": 60, "note": "x" }),
        )
        .await;
    let uri = format!("/v1/work/{}", created["id"]);

    let (status, updated) = app
        .put(&uri, Some(&token), json!({ "duration": 120 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["duration"], 120);
    assert_eq!(updated["note"], "x");
    assert_eq!(updated["when"], "2016-08-24");

    let (status, _) = app
        .put(&uri, Some(&token), json!({ "user_id": other.id() }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_tag(&body), "rec_not_found");
}
