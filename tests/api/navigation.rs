use rstest::rstest;

use crate::utils::{json_body, spawn_app, ADMIN, DOCTOR, PATIENT};

#[rstest]
#[case(PATIENT, vec!["dashboard", "appointments", "messages", "medicalRecords", "profile", "settings"])]
#[case(DOCTOR, vec!["dashboard", "appointments", "messages", "medicalRecords", "consultations", "availability", "profile", "settings"])]
#[case(ADMIN, vec!["dashboard", "appointments", "users", "profile", "settings"])]
#[tokio::test]
async fn the_menu_depends_on_the_role(#[case] email: &str, #[case] expected: Vec<&str>) {
    let app = spawn_app().await;
    app.login_as(email).await;

    let body = json_body(app.get("/navigation").await).await;

    let pages: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["page"].as_str().unwrap())
        .collect();
    assert_eq!(pages, expected);
    assert_eq!(body["data"][0]["path"], "/");
}

#[rstest]
#[case(PATIENT, "/users")]
#[case(PATIENT, "/consultations")]
#[case(PATIENT, "/availability")]
#[case(DOCTOR, "/users")]
#[case(ADMIN, "/messages")]
#[case(ADMIN, "/medical-records")]
#[case(ADMIN, "/availability")]
#[tokio::test]
async fn pages_outside_the_menu_are_refused(#[case] email: &str, #[case] path: &str) {
    let app = spawn_app().await;
    app.login_as(email).await;

    let response = app.get(path).await;

    assert_eq!(403, response.status().as_u16());
    let body = json_body(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Access denied"));
}

#[tokio::test]
async fn navigation_requires_a_session() {
    let app = spawn_app().await;

    let response = app.get("/navigation").await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn patient_dashboard_counts_their_own_data() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let body = json_body(app.get("/dashboard").await).await;

    let summary = &body["data"];
    assert_eq!(summary["unreadMessages"], 1);
    assert_eq!(summary["unreadNotifications"], 1);
    assert_eq!(summary["medicalRecords"], 2);
    assert_eq!(summary["prescriptions"], 1);
    assert!(summary.get("totalUsers").is_none());
}

#[tokio::test]
async fn doctor_dashboard_counts_patients_and_records() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let body = json_body(app.get("/dashboard").await).await;

    assert_eq!(body["data"]["totalPatients"], 2);
    assert_eq!(body["data"]["medicalRecords"], 1);
}

#[tokio::test]
async fn admin_dashboard_counts_accounts() {
    let app = spawn_app().await;
    app.login_as(ADMIN).await;

    let body = json_body(app.get("/dashboard").await).await;

    assert_eq!(body["data"]["totalUsers"], 5);
    assert_eq!(body["data"]["totalDoctors"], 2);
    assert!(body["data"].get("prescriptions").is_none());
}
