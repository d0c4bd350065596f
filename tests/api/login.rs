use rstest::rstest;

use crate::utils::{json_body, spawn_app, ADMIN, DOCTOR, PATIENT};

#[rstest]
#[case(DOCTOR, "d1", "doctor")]
#[case(PATIENT, "p1", "patient")]
#[case(ADMIN, "a1", "admin")]
#[tokio::test]
async fn seeded_accounts_can_log_in(
    #[case] email: &str,
    #[case] user_id: &str,
    #[case] role: &str,
) {
    let app = spawn_app().await;

    let body = app.login_as(email).await;

    assert_eq!(body["data"]["user"]["id"], user_id);
    assert_eq!(body["data"]["user"]["role"], role);
    assert_eq!(body["data"]["token"].as_str().unwrap().len(), 25);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .post_login(&serde_json::json!({
            "email": PATIENT,
            "password": "not-the-password"
        }))
        .await;

    assert_eq!(401, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn the_session_cookie_identifies_the_user() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let body = json_body(app.get("/me").await).await;
    assert_eq!(body["data"]["email"], DOCTOR);

    let response = app.post_empty("/logout").await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(401, app.get("/me").await.status().as_u16());
}

#[tokio::test]
async fn bearer_tokens_work_without_a_session() {
    let app = spawn_app().await;
    let body = app.login_as(PATIENT).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/me", &app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    client
        .post(&format!("{}/logout", &app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");
    let response = client
        .get(&format!("{}/me", &app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn registration_logs_the_new_patient_in() {
    let app = spawn_app().await;
    let email = format!("{}@example.com", uuid::Uuid::new_v4());

    let response = app
        .post(
            "/register",
            &serde_json::json!({
                "email": email,
                "firstName": "Grace",
                "lastName": "Hopper",
                "password": "a long enough password"
            }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["user"]["role"], "patient");
    let me = json_body(app.get("/me").await).await;
    assert_eq!(me["data"]["email"], email.as_str());
}

#[rstest]
#[case(serde_json::json!({"email": "doctor@example.com", "firstName": "A", "lastName": "B", "password": "password123"}), 409)]
#[case(serde_json::json!({"email": "boss@example.com", "firstName": "A", "lastName": "B", "role": "admin", "password": "password123"}), 403)]
#[case(serde_json::json!({"email": "short@example.com", "firstName": "A", "lastName": "B", "password": "short"}), 400)]
#[case(serde_json::json!({"email": "doc@example.com", "firstName": "A", "lastName": "B", "role": "doctor", "specialtyId": "s99", "password": "password123"}), 404)]
#[tokio::test]
async fn invalid_registrations_are_rejected(
    #[case] body: serde_json::Value,
    #[case] expected_status: u16,
) {
    let app = spawn_app().await;

    let response = app.post("/register", &body).await;

    assert_eq!(expected_status, response.status().as_u16());
}
