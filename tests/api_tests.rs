use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bugtrack::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Credentials seeded by the initial migration
const ADMIN_USER: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = bugtrack::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    bugtrack::api::router(state).await
}

fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth",
            None,
            &serde_json::json!({"action": "login", "username": username, "password": password}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> (String, i64) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth",
            None,
            &serde_json::json!({
                "action": "register",
                "username": username,
                "email": email,
                "password": password,
                "confirmPassword": password,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let json = body_json(response).await;
    let user_id = json["user"]["id"].as_i64().unwrap();
    (cookie, user_id)
}

/// Create a project as admin and return its id
async fn create_project(app: &Router, admin_cookie: &str, name: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            Some(admin_cookie),
            &serde_json::json!({"name": name, "description": "test project"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["project_id"].as_i64().unwrap()
}

/// Create a bug and return its id
async fn create_bug(
    app: &Router,
    cookie: &str,
    project_id: i64,
    title: &str,
    extra: serde_json::Value,
) -> i64 {
    let mut body = serde_json::json!({
        "title": title,
        "description": "something broke",
        "project_id": project_id,
    });
    if let Some(extra) = extra.as_object() {
        for (key, value) in extra {
            body[key] = value.clone();
        }
    }

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/bugs", Some(cookie), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["bug"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_bug_creation_defaults() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let project_id = create_project(&app, &admin, "Apollo").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({
                "title": "Crash on save",
                "description": "Saving a draft crashes the app",
                "project_id": project_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["bug"]["status"], "open");
    assert_eq!(json["bug"]["priority"], "medium");
    assert_eq!(json["bug"]["reported_by"], 1);
    assert_eq!(json["bug"]["project_name"], "Apollo");
    assert!(json["bug"]["assigned_to"].is_null());

    // The new bug shows up when filtering its project
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/bugs?project_id={project_id}"),
            Some(&admin),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["bugs"].as_array().unwrap().len(), 1);
    assert_eq!(json["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_bug_creation_validation() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"title": "", "description": "", "project_id": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bug_update_permissions() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let project_id = create_project(&app, &admin, "Hermes").await;
    let bug_id = create_bug(&app, &admin, project_id, "Flaky login", serde_json::json!({})).await;

    let (outsider, _) = register(&app, "mallory", "mallory@example.com", "secret1").await;

    // Neither admin, assignee nor reporter: every mutation is forbidden
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&outsider),
            &serde_json::json!({"id": bug_id, "title": "hijacked"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bugs/status",
            Some(&outsider),
            &serde_json::json!({"bug_id": bug_id, "status": "closed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The row is unchanged afterwards
    let response = app
        .clone()
        .oneshot(get_request("/api/bugs", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    let bug = &json["bugs"].as_array().unwrap()[0];
    assert_eq!(bug["title"], "Flaky login");
    assert_eq!(bug["status"], "open");

    // The assignee may update
    let (assignee_cookie, assignee_id) =
        register(&app, "dev", "dev@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": bug_id, "assigned_to": assignee_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&assignee_cookie),
            &serde_json::json!({"id": bug_id, "priority": "high"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The reporter may update their own bug
    let own_bug =
        create_bug(&app, &outsider, project_id, "Typo on login page", serde_json::json!({})).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&outsider),
            &serde_json::json!({"id": own_bug, "status": "testing"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bug_update_edge_cases() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let project_id = create_project(&app, &admin, "Atlas").await;
    let bug_id = create_bug(&app, &admin, project_id, "Broken build", serde_json::json!({})).await;

    // Unknown id is 404 before anything else
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": 9999, "title": "nope"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A patch without any recognized field is rejected
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": bug_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // An explicit null assignee unassigns and counts as a field
    let (_, dev_id) = register(&app, "dev2", "dev2@example.com", "secret1").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": bug_id, "assigned_to": dev_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": bug_id, "assigned_to": null}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/bugs", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert!(json["bugs"][0]["assigned_to"].is_null());
}

#[tokio::test]
async fn test_bug_status_enum_is_enforced() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let project_id = create_project(&app, &admin, "Daedalus").await;
    let bug_id = create_bug(&app, &admin, project_id, "Slow search", serde_json::json!({})).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bugs/status",
            Some(&admin),
            &serde_json::json!({"bug_id": bug_id, "status": "archived"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The status is unchanged
    let response = app
        .clone()
        .oneshot(get_request("/api/bugs", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["bugs"][0]["status"], "open");

    for status in ["in-progress", "testing", "closed", "open"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/bugs/status",
                Some(&admin),
                &serde_json::json!({"bug_id": bug_id, "status": status}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{status}");
    }
}

#[tokio::test]
async fn test_bug_delete_is_admin_only() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let project_id = create_project(&app, &admin, "Icarus").await;
    let bug_id = create_bug(&app, &admin, project_id, "Leaky socket", serde_json::json!({})).await;

    let (outsider, _) = register(&app, "pat", "pat@example.com", "secret1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/bugs",
            Some(&outsider),
            &serde_json::json!({"id": bug_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": bug_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Gone now
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": bug_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_project_lifecycle() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;
    let (member, _) = register(&app, "sam", "sam@example.com", "secret1").await;

    // Mutation is admin-only
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            Some(&member),
            &serde_json::json!({"name": "Skunkworks"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Name is required
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            Some(&admin),
            &serde_json::json!({"name": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let project_id = create_project(&app, &admin, "Vulcan").await;

    // Everyone logged in can list, and sees the bug count
    let bug_id = create_bug(&app, &member, project_id, "Broken link", serde_json::json!({})).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/projects", Some(&member)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let project = &json["projects"].as_array().unwrap()[0];
    assert_eq!(project["name"], "Vulcan");
    assert_eq!(project["status"], "active");
    assert_eq!(project["bug_count"], 1);

    // Updates: unknown ids are 404, empty patches 400, valid patches stick
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/projects",
            Some(&admin),
            &serde_json::json!({"id": 9999, "name": "Ghost"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/projects",
            Some(&admin),
            &serde_json::json!({"id": project_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/projects",
            Some(&admin),
            &serde_json::json!({"id": project_id, "status": "archived"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Deletion is blocked while bugs reference the project
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/projects",
            Some(&admin),
            &serde_json::json!({"id": project_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Cannot delete project with existing bugs");

    // Still there
    let response = app
        .clone()
        .oneshot(get_request("/api/projects", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["projects"].as_array().unwrap().len(), 1);

    // After the bug is gone the delete goes through
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/bugs",
            Some(&admin),
            &serde_json::json!({"id": bug_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/projects",
            Some(&admin),
            &serde_json::json!({"id": project_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/projects",
            Some(&admin),
            &serde_json::json!({"id": project_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination_over_25_bugs() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let project_id = create_project(&app, &admin, "Backlog").await;

    for i in 1..=25 {
        create_bug(
            &app,
            &admin,
            project_id,
            &format!("Bug {i}"),
            serde_json::json!({}),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/bugs?page=2&limit=10", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let bugs = json["bugs"].as_array().unwrap();
    assert_eq!(bugs.len(), 10);
    assert_eq!(json["pagination"]["page"], 2);
    assert_eq!(json["pagination"]["limit"], 10);
    assert_eq!(json["pagination"]["total"], 25);
    assert_eq!(json["pagination"]["pages"], 3);

    // Newest first: page 2 holds the 11th through 20th most recent
    assert_eq!(bugs[0]["title"], "Bug 15");
    assert_eq!(bugs[9]["title"], "Bug 6");

    // Non-numeric paging falls back to defaults (page 1, configured limit)
    let response = app
        .clone()
        .oneshot(get_request("/api/bugs?page=abc&limit=-5", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["pagination"]["page"], 1);
    assert_eq!(json["pagination"]["limit"], 20);
    assert_eq!(json["bugs"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_bug_list_filters() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;

    let alpha = create_project(&app, &admin, "Alpha").await;
    let beta = create_project(&app, &admin, "Beta").await;

    create_bug(
        &app,
        &admin,
        alpha,
        "High in alpha",
        serde_json::json!({"priority": "high"}),
    )
    .await;
    create_bug(&app, &admin, alpha, "Medium in alpha", serde_json::json!({})).await;
    create_bug(
        &app,
        &admin,
        beta,
        "High in beta",
        serde_json::json!({"priority": "high"}),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/bugs?project_id={alpha}&priority=high"),
            Some(&admin),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    let bugs = json["bugs"].as_array().unwrap();
    assert_eq!(bugs.len(), 1);
    assert_eq!(bugs[0]["title"], "High in alpha");

    let response = app
        .clone()
        .oneshot(get_request("/api/bugs?priority=high", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["bugs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dashboard_aggregates() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;
    let (worker, worker_id) = register(&app, "worker", "worker@example.com", "secret1").await;

    let project_id = create_project(&app, &admin, "Observability").await;

    create_bug(
        &app,
        &admin,
        project_id,
        "High open",
        serde_json::json!({"priority": "high"}),
    )
    .await;
    let closed_bug =
        create_bug(&app, &admin, project_id, "Soon closed", serde_json::json!({})).await;
    create_bug(
        &app,
        &worker,
        project_id,
        "Mine",
        serde_json::json!({"assigned_to": worker_id}),
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bugs/status",
            Some(&admin),
            &serde_json::json!({"bug_id": closed_bug, "status": "closed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Non-admin view: personal queue is populated
    let response = app
        .clone()
        .oneshot(get_request("/api/dashboard", Some(&worker)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["stats"]["total_bugs"], 3);
    assert_eq!(json["stats"]["open_bugs"], 2);
    assert_eq!(json["stats"]["resolved_bugs"], 1);
    assert_eq!(json["stats"]["critical_bugs"], 1);
    assert_eq!(json["stats"]["total_projects"], 1);
    assert_eq!(json["my_bugs"].as_array().unwrap().len(), 1);
    assert_eq!(json["my_bugs"][0]["title"], "Mine");
    assert_eq!(json["recent_bugs"].as_array().unwrap().len(), 3);
    assert!(json["charts"]["status_distribution"].is_array());
    assert!(json["charts"]["priority_distribution"].is_array());

    // Admins get an empty personal queue
    let response = app
        .clone()
        .oneshot(get_request("/api/dashboard", Some(&admin)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["my_bugs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_metrics_endpoint_requires_session() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/metrics", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let admin = login(&app, ADMIN_USER, ADMIN_PASSWORD).await;
    let response = app
        .clone()
        .oneshot(get_request("/api/metrics", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
