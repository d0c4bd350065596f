use rstest::rstest;

use crate::utils::{json_body, spawn_app, ADMIN, DOCTOR, PATIENT, PATIENT_2};

#[tokio::test]
async fn booking_yields_a_fresh_scheduled_appointment() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;
    let existing = json_body(app.get("/appointments").await).await;
    let existing_ids: Vec<String> = existing["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect();

    let response = app
        .post(
            "/appointments",
            &serde_json::json!({
                "doctorId": "d1",
                "date": "2025-06-20",
                "time": "09:00"
            }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    let appointment = &body["data"];
    assert_eq!(appointment["status"], "scheduled");
    assert_eq!(appointment["patientId"], "p1");
    assert_eq!(appointment["duration"], 30);
    assert_eq!(appointment["type"], "in-person");
    assert!(!existing_ids.contains(&appointment["id"].as_str().unwrap().to_string()));
}

#[tokio::test]
async fn the_same_booking_twice_creates_two_appointments() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;
    let body = serde_json::json!({
        "doctorId": "d2",
        "date": "2025-06-20",
        "time": "10:00",
        "type": "teleconsultation"
    });

    let first = json_body(app.post("/appointments", &body).await).await;
    let second = json_body(app.post("/appointments", &body).await).await;

    assert_ne!(first["data"]["id"], second["data"]["id"]);
    let all = json_body(app.get("/appointments").await).await;
    assert_eq!(all["length"], 4);
}

#[rstest]
#[case(serde_json::json!({"doctorId": "d1", "date": "2025-06-21", "time": "09:00"}), 400)]
#[case(serde_json::json!({"doctorId": "d1", "date": "2025-06-20", "time": "09:15"}), 400)]
#[case(serde_json::json!({"doctorId": "d1", "date": "2025-06-20", "time": "09:00", "duration": 0}), 400)]
#[case(serde_json::json!({"doctorId": "p2", "date": "2025-06-20", "time": "09:00"}), 404)]
#[tokio::test]
async fn invalid_bookings_are_rejected(
    #[case] body: serde_json::Value,
    #[case] expected_status: u16,
) {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let response = app.post("/appointments", &body).await;

    assert_eq!(expected_status, response.status().as_u16());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let response = app
        .api_client
        .post(&format!("{}/appointments", &app.address))
        .header("Content-Type", "application/json")
        .body("bad input")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[rstest]
#[case(PATIENT, 2)]
#[case(DOCTOR, 2)]
#[case(ADMIN, 3)]
#[tokio::test]
async fn appointments_are_scoped_to_the_caller(#[case] email: &str, #[case] expected: usize) {
    let app = spawn_app().await;
    app.login_as(email).await;

    let body = json_body(app.get("/appointments").await).await;

    assert_eq!(body["length"], expected);
}

#[tokio::test]
async fn admins_book_on_behalf_of_a_patient() {
    let app = spawn_app().await;
    app.login_as(ADMIN).await;

    let missing_patient = app
        .post(
            "/appointments",
            &serde_json::json!({"doctorId": "d1", "date": "2025-06-20", "time": "11:00"}),
        )
        .await;
    assert_eq!(400, missing_patient.status().as_u16());

    let response = app
        .post(
            "/appointments",
            &serde_json::json!({
                "patientId": "p2",
                "doctorId": "d1",
                "date": "2025-06-20",
                "time": "11:00"
            }),
        )
        .await;
    assert_eq!(201, response.status().as_u16());
}

#[tokio::test]
async fn doctors_cannot_book_through_the_patient_form() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let response = app
        .post(
            "/appointments",
            &serde_json::json!({"doctorId": "d1", "date": "2025-06-20", "time": "09:00"}),
        )
        .await;

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn cancelled_appointments_cannot_be_completed() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;
    let response = app.post_empty("/appointments/a1/cancel").await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(json_body(response).await["data"]["status"], "cancelled");

    app.login_as(DOCTOR).await;
    let response = app.post_empty("/appointments/a1/complete").await;
    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn patients_cannot_complete_appointments() {
    let app = spawn_app().await;
    app.login_as(PATIENT_2).await;

    let response = app.post_empty("/appointments/a3/complete").await;

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn specialty_catalogue_and_doctors() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let specialties = json_body(app.get("/specialties").await).await;
    assert_eq!(specialties["length"], 6);

    let doctors = json_body(app.get("/specialties/s1/doctors").await).await;
    assert_eq!(doctors["length"], 2);
    let doctors = json_body(app.get("/specialties/s3/doctors").await).await;
    assert_eq!(doctors["length"], 0);
    assert_eq!(
        404,
        app.get("/specialties/s99/doctors").await.status().as_u16()
    );
}

#[rstest]
#[case("2025-06-20", 17)]
#[case("2025-06-21", 0)]
#[tokio::test]
async fn doctor_slots_follow_the_weekly_grid(#[case] date: &str, #[case] open: usize) {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let body = json_body(
        app.get(&format!("/doctors/d1/availability?date={}", date))
            .await,
    )
    .await;

    let slots = body["data"].as_array().unwrap();
    assert_eq!(slots.len(), 17);
    assert_eq!(slots[0]["time"], "09:00");
    assert_eq!(
        slots.iter().filter(|s| s["available"] == true).count(),
        open
    );
}

#[tokio::test]
async fn doctors_schedule_and_filter_consultations() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let response = app
        .post(
            "/consultations",
            &serde_json::json!({
                "patientId": "p2",
                "date": "2099-01-02",
                "time": "14:00",
                "type": "teleconsultation",
                "notes": "Blood pressure review"
            }),
        )
        .await;
    assert_eq!(201, response.status().as_u16());

    let upcoming = json_body(app.get("/consultations?tab=upcoming").await).await;
    assert_eq!(upcoming["length"], 1);
    assert_eq!(upcoming["data"][0]["notes"], "Blood pressure review");

    let searched = json_body(app.get("/consultations?tab=upcoming&search=PRESSURE").await).await;
    assert_eq!(searched["length"], 1);
    let missed = json_body(app.get("/consultations?tab=upcoming&search=in-person").await).await;
    assert_eq!(missed["status"], "empty");

    let past = json_body(app.get("/consultations?tab=past").await).await;
    assert_eq!(past["length"], 2);
}

#[tokio::test]
async fn an_empty_tab_lists_every_consultation() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let all = json_body(app.get("/consultations").await).await;
    let response = app.get("/consultations?tab=&search=").await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(json_body(response).await["length"], all["length"]);
}

#[tokio::test]
async fn patients_cannot_open_consultations() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    assert_eq!(403, app.get("/consultations").await.status().as_u16());
}
