use rstest::rstest;

use crate::utils::{json_body, spawn_app, ADMIN, DOCTOR, PATIENT, PATIENT_2};

#[tokio::test]
async fn requests_missing_authorization_are_rejected() {
    let app = spawn_app().await;

    let response = app.get("/appointments").await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(
        r#"Basic realm="Restricted""#,
        response.headers()["WWW-Authenticate"]
    );
}

#[tokio::test]
async fn non_existing_user_is_rejected() {
    let app = spawn_app().await;
    let username = format!("{}@example.com", uuid::Uuid::new_v4());
    let password = uuid::Uuid::new_v4().to_string();

    let response = reqwest::Client::new()
        .get(&format!("{}/appointments", &app.address))
        .basic_auth(username, Some(password))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    assert_eq!(
        r#"Basic realm="Restricted""#,
        response.headers()["WWW-Authenticate"]
    );
}

#[tokio::test]
async fn basic_auth_with_valid_credentials_is_accepted() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/appointments", &app.address))
        .basic_auth(PATIENT, Some("password"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[rstest]
#[case(None, None, 5)]
#[case(Some("doctor"), None, 2)]
#[case(Some("patient"), Some("jane"), 1)]
#[case(Some("doctor"), Some("jane"), 0)]
#[case(None, Some("EXAMPLE.COM"), 5)]
#[case(Some(""), None, 5)]
#[case(Some(""), Some("jane"), 1)]
#[tokio::test]
async fn admins_filter_users_by_role_and_search(
    #[case] role: Option<&str>,
    #[case] search: Option<&str>,
    #[case] expected: usize,
) {
    let app = spawn_app().await;
    app.login_as(ADMIN).await;
    let mut query = Vec::new();
    if let Some(role) = role {
        query.push(format!("role={}", role));
    }
    if let Some(search) = search {
        query.push(format!("search={}", search));
    }

    let body = json_body(app.get(&format!("/users?{}", query.join("&"))).await).await;

    assert_eq!(body["length"], expected);
    let users = body["data"].as_array().unwrap();
    if let Some(role) = role.filter(|role| !role.is_empty()) {
        assert!(users.iter().all(|user| user["role"] == role));
    }
    if expected == 0 {
        assert_eq!(body["status"], "empty");
        assert_eq!(body["message"], "No users found");
    }
}

#[tokio::test]
async fn only_admins_manage_users() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let response = app.get("/users").await;
    assert_eq!(403, response.status().as_u16());
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().starts_with("Access denied"));
}

#[tokio::test]
async fn admins_create_and_delete_users() {
    let app = spawn_app().await;
    app.login_as(ADMIN).await;

    let response = app
        .post(
            "/users",
            &serde_json::json!({
                "email": "new.admin@example.com",
                "firstName": "New",
                "lastName": "Admin",
                "role": "admin",
                "password": "a long enough password"
            }),
        )
        .await;
    assert_eq!(201, response.status().as_u16());
    let created = json_body(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app.delete(&format!("/users/{}", id)).await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(404, app.delete(&format!("/users/{}", id)).await.status().as_u16());
    assert_eq!(403, app.delete("/users/a1").await.status().as_u16());
}

#[tokio::test]
async fn profile_and_password_can_be_changed() {
    let app = spawn_app().await;
    app.login_as(PATIENT_2).await;

    let body = json_body(
        app.put("/profile", &serde_json::json!({"lastName": "Wilson"}))
            .await,
    )
    .await;
    assert_eq!(body["data"]["lastName"], "Wilson");
    assert_eq!(body["data"]["firstName"], "Robert");

    let response = app
        .post(
            "/settings/password",
            &serde_json::json!({
                "currentPassword": "password",
                "newPassword": "brand new password",
                "confirmPassword": "brand new password"
            }),
        )
        .await;
    assert_eq!(200, response.status().as_u16());

    let response = app
        .post_login(&serde_json::json!({
            "email": PATIENT_2,
            "password": "brand new password"
        }))
        .await;
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn admins_edit_users() {
    let app = spawn_app().await;
    app.login_as(ADMIN).await;

    let response = app
        .put(
            "/users/p2",
            &serde_json::json!({
                "email": "robert.brown@example.com",
                "role": "doctor",
                "specialtyId": "s3"
            }),
        )
        .await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["email"], "robert.brown@example.com");
    assert_eq!(body["data"]["role"], "doctor");
    assert_eq!(body["data"]["specialtyId"], "s3");
    assert_eq!(body["data"]["firstName"], "Robert");

    let doctors = json_body(app.get("/specialties/s3/doctors").await).await;
    assert_eq!(doctors["length"], 1);

    let response = app
        .post_login(&serde_json::json!({
            "email": "robert.brown@example.com",
            "password": "password"
        }))
        .await;
    assert_eq!(200, response.status().as_u16());
}

#[rstest]
#[case(serde_json::json!({"email": "doctor@example.com"}), 409)]
#[case(serde_json::json!({"email": "not-an-email"}), 400)]
#[case(serde_json::json!({"role": "doctor"}), 400)]
#[case(serde_json::json!({"role": "doctor", "specialtyId": "s99"}), 404)]
#[case(serde_json::json!({"specialtyId": "s1"}), 400)]
#[case(serde_json::json!({"firstName": "  "}), 400)]
#[tokio::test]
async fn invalid_user_edits_are_rejected(
    #[case] update: serde_json::Value,
    #[case] expected_status: u16,
) {
    let app = spawn_app().await;
    app.login_as(ADMIN).await;

    let response = app.put("/users/p2", &update).await;

    assert_eq!(expected_status, response.status().as_u16());
}

#[tokio::test]
async fn only_admins_edit_users() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let response = app
        .put("/users/p2", &serde_json::json!({"firstName": "Bob"}))
        .await;

    assert_eq!(403, response.status().as_u16());
    app.login_as(ADMIN).await;
    assert_eq!(404, app.put("/users/nobody", &serde_json::json!({})).await.status().as_u16());
    assert_eq!(
        403,
        app.put("/users/a1", &serde_json::json!({"role": "patient"}))
            .await
            .status()
            .as_u16()
    );
}

#[tokio::test]
async fn preferences_start_from_defaults_and_persist() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let defaults = json_body(app.get("/settings/preferences").await).await;
    assert_eq!(defaults["data"]["darkMode"], false);
    assert_eq!(defaults["data"]["language"], "english");
    assert_eq!(defaults["data"]["notifications"]["sms"], false);
    assert_eq!(defaults["data"]["privacy"]["profileVisibility"], "public");

    let response = app
        .put(
            "/settings/preferences",
            &serde_json::json!({
                "darkMode": true,
                "language": "german",
                "privacy": {"profileVisibility": "patients"}
            }),
        )
        .await;
    assert_eq!(200, response.status().as_u16());

    let saved = json_body(app.get("/settings/preferences").await).await;
    assert_eq!(saved["data"]["darkMode"], true);
    assert_eq!(saved["data"]["language"], "german");
    assert_eq!(saved["data"]["privacy"]["profileVisibility"], "patients");
    assert_eq!(saved["data"]["privacy"]["allowMessaging"], true);

    let response = app
        .put("/settings/preferences", &serde_json::json!({"language": "klingon"}))
        .await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn muted_message_notifications_are_not_delivered() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;
    let before = json_body(app.get("/notifications").await).await["length"].clone();
    app.put(
        "/settings/preferences",
        &serde_json::json!({"notifications": {"messages": false}}),
    )
    .await;

    app.login_as(PATIENT_2).await;
    let response = app
        .post(
            "/messages",
            &serde_json::json!({"receiverId": "d1", "content": "Are you in on Friday?"}),
        )
        .await;
    assert_eq!(201, response.status().as_u16());

    app.login_as(DOCTOR).await;
    let after = json_body(app.get("/notifications").await).await;
    assert_eq!(after["length"], before);
}
