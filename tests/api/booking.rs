use crate::utils::{json_body, spawn_app, ADMIN, DOCTOR, PATIENT};

#[tokio::test]
async fn opening_the_form_loads_the_specialties() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let body = json_body(app.get("/booking").await).await;

    let view = &body["data"];
    assert_eq!(view["phase"]["state"], "idle");
    assert_eq!(view["specialties"].as_array().unwrap().len(), 6);
    assert_eq!(view["doctorSelectable"], false);
    assert_eq!(view["dateSelectable"], false);
    assert_eq!(view["canSubmit"], false);
    assert_eq!(view["loading"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn a_patient_books_through_the_whole_form() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let view = json_body(
        app.post("/booking/specialty", &serde_json::json!({"specialtyId": "s1"}))
            .await,
    )
    .await;
    assert_eq!(view["data"]["phase"]["state"], "specialtySelected");
    assert_eq!(view["data"]["doctors"].as_array().unwrap().len(), 2);
    assert_eq!(view["data"]["doctorSelectable"], true);

    let view = json_body(
        app.post("/booking/doctor", &serde_json::json!({"doctorId": "d1"}))
            .await,
    )
    .await;
    assert_eq!(view["data"]["phase"]["state"], "doctorSelected");
    assert_eq!(view["data"]["dateSelectable"], true);

    let view = json_body(
        app.post("/booking/date", &serde_json::json!({"date": "2025-06-20"}))
            .await,
    )
    .await;
    assert_eq!(view["data"]["phase"]["state"], "slotsLoaded");
    assert_eq!(view["data"]["slots"].as_array().unwrap().len(), 17);

    let view = json_body(
        app.post("/booking/time", &serde_json::json!({"time": "10:30"}))
            .await,
    )
    .await;
    assert_eq!(view["data"]["time"], "10:30");
    assert_eq!(view["data"]["canSubmit"], true);

    app.post(
        "/booking/details",
        &serde_json::json!({"type": "teleconsultation", "notes": "Recurring headaches"}),
    )
    .await;

    let response = app.post_empty("/booking/submit").await;
    assert_eq!(200, response.status().as_u16());
    let view = json_body(response).await;
    let phase = &view["data"]["phase"];
    assert_eq!(phase["state"], "booked");
    assert_eq!(phase["appointment"]["doctorId"], "d1");
    assert_eq!(phase["appointment"]["time"], "10:30");
    assert_eq!(phase["appointment"]["type"], "teleconsultation");
    assert_eq!(phase["appointment"]["notes"], "Recurring headaches");
    assert_eq!(view["data"]["specialtyId"], serde_json::Value::Null);
    assert_eq!(view["data"]["canSubmit"], false);

    let appointments = json_body(app.get("/appointments").await).await;
    assert_eq!(appointments["length"], 3);
}

#[tokio::test]
async fn a_specialty_without_doctors_disables_doctor_selection() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let view = json_body(
        app.post("/booking/specialty", &serde_json::json!({"specialtyId": "s4"}))
            .await,
    )
    .await;

    assert_eq!(view["data"]["doctors"].as_array().unwrap().len(), 0);
    assert_eq!(view["data"]["doctorSelectable"], false);
}

#[tokio::test]
async fn changing_the_specialty_clears_downstream_choices() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;
    app.post("/booking/specialty", &serde_json::json!({"specialtyId": "s1"}))
        .await;
    app.post("/booking/doctor", &serde_json::json!({"doctorId": "d2"}))
        .await;
    app.post("/booking/date", &serde_json::json!({"date": "2025-06-20"}))
        .await;

    let view = json_body(
        app.post("/booking/specialty", &serde_json::json!({"specialtyId": "s2"}))
            .await,
    )
    .await;

    let view = &view["data"];
    assert_eq!(view["specialtyId"], "s2");
    assert_eq!(view["doctorId"], serde_json::Value::Null);
    assert_eq!(view["date"], serde_json::Value::Null);
    assert_eq!(view["slots"].as_array().unwrap().len(), 0);
    assert_eq!(view["dateSelectable"], false);

    let cleared = json_body(
        app.post("/booking/specialty", &serde_json::json!({"specialtyId": ""}))
            .await,
    )
    .await;
    assert_eq!(cleared["data"]["phase"]["state"], "idle");
}

#[tokio::test]
async fn unavailable_choices_are_rejected() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let response = app
        .post("/booking/date", &serde_json::json!({"date": "2025-06-20"}))
        .await;
    assert_eq!(400, response.status().as_u16());

    app.post("/booking/specialty", &serde_json::json!({"specialtyId": "s1"}))
        .await;
    let response = app
        .post("/booking/doctor", &serde_json::json!({"doctorId": "d9"}))
        .await;
    assert_eq!(400, response.status().as_u16());

    app.post("/booking/doctor", &serde_json::json!({"doctorId": "d1"}))
        .await;
    app.post("/booking/date", &serde_json::json!({"date": "2025-06-21"}))
        .await;
    let response = app
        .post("/booking/time", &serde_json::json!({"time": "09:00"}))
        .await;
    assert_eq!(400, response.status().as_u16());

    let response = app.post_empty("/booking/submit").await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn retry_without_a_failure_is_rejected() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let response = app.post_empty("/booking/retry").await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn discarding_the_form_starts_over() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;
    app.post("/booking/specialty", &serde_json::json!({"specialtyId": "s1"}))
        .await;

    let response = app.delete("/booking").await;
    assert_eq!(204, response.status().as_u16());

    let view = json_body(app.get("/booking").await).await;
    assert_eq!(view["data"]["specialtyId"], serde_json::Value::Null);
    assert_eq!(view["data"]["phase"]["state"], "idle");
}

#[tokio::test]
async fn only_patients_use_the_booking_form() {
    let app = spawn_app().await;

    app.login_as(DOCTOR).await;
    assert_eq!(403, app.get("/booking").await.status().as_u16());

    app.login_as(ADMIN).await;
    assert_eq!(403, app.get("/booking").await.status().as_u16());
}
