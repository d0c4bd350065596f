use rstest::rstest;
use serde_json::Value;

use crate::utils::{json_body, spawn_app, DOCTOR, PATIENT};

fn all_slots(day: &Value, open: bool) -> bool {
    day["slots"]
        .as_object()
        .unwrap()
        .values()
        .all(|slot| *slot == Value::Bool(open))
}

#[tokio::test]
async fn doctors_start_from_the_default_week() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let body = json_body(app.get("/availability").await).await;

    let grid = &body["data"];
    assert_eq!(grid.as_object().unwrap().len(), 7);
    assert_eq!(grid["Monday"]["available"], true);
    assert!(all_slots(&grid["Friday"], true));
    assert_eq!(grid["Saturday"]["available"], false);
    assert!(all_slots(&grid["Sunday"], false));
    assert_eq!(grid["Monday"]["slots"].as_object().unwrap().len(), 17);
}

#[tokio::test]
async fn opening_a_day_leaves_its_slots_closed() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let body = json_body(app.post_empty("/availability/draft/days/saturday/toggle").await).await;

    assert_eq!(body["data"]["Saturday"]["available"], true);
    assert!(all_slots(&body["data"]["Saturday"], false));
}

#[tokio::test]
async fn closing_a_day_closes_all_its_slots() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let body = json_body(app.post_empty("/availability/draft/days/Monday/toggle").await).await;

    assert_eq!(body["data"]["Monday"]["available"], false);
    assert!(all_slots(&body["data"]["Monday"], false));

    let reopened = json_body(app.post_empty("/availability/draft/days/Monday/toggle").await).await;
    assert_eq!(reopened["data"]["Monday"]["available"], true);
    assert!(all_slots(&reopened["data"]["Monday"], false));
}

#[rstest]
#[case("/availability/draft/days/Sunday/slots/10:00/toggle")]
#[case("/availability/draft/days/Monday/slots/08:00/toggle")]
#[case("/availability/draft/days/Monday/slots/10:15/toggle")]
#[case("/availability/draft/days/Someday/toggle")]
#[tokio::test]
async fn invalid_toggles_are_rejected(#[case] path: &str) {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;

    let response = app.post_empty(path).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn a_saved_draft_changes_the_bookable_slots() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;
    app.post_empty("/availability/draft/days/Saturday/toggle")
        .await;
    let draft = json_body(
        app.post_empty("/availability/draft/days/Saturday/slots/10:00/toggle")
            .await,
    )
    .await;
    assert_eq!(draft["data"]["Saturday"]["slots"]["10:00"], true);

    let before = json_body(app.get("/doctors/d1/availability?date=2025-06-21").await).await;
    assert!(before["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|slot| slot["available"] == false));

    let saved = json_body(app.post_empty("/availability/draft/save").await).await;
    // The seeded Sunday appointment falls outside any weekday-only week.
    let outside: Vec<&str> = saved["outsideAvailability"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(outside, vec!["a1"]);

    let after = json_body(app.get("/doctors/d1/availability?date=2025-06-21").await).await;
    let open: Vec<&str> = after["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|slot| slot["available"] == true)
        .map(|slot| slot["time"].as_str().unwrap())
        .collect();
    assert_eq!(open, vec!["10:00"]);

    app.login_as(PATIENT).await;
    let booked = app
        .post(
            "/appointments",
            &serde_json::json!({"doctorId": "d1", "date": "2025-06-21", "time": "10:00"}),
        )
        .await;
    assert_eq!(201, booked.status().as_u16());
}

#[tokio::test]
async fn discarding_a_draft_restores_the_saved_grid() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;
    app.post_empty("/availability/draft/days/Tuesday/toggle")
        .await;

    let response = app.delete("/availability/draft").await;
    assert_eq!(204, response.status().as_u16());

    let draft = json_body(app.get("/availability/draft").await).await;
    assert_eq!(draft["data"]["Tuesday"]["available"], true);
}

#[tokio::test]
async fn replacing_the_grid_validates_it() {
    let app = spawn_app().await;
    app.login_as(DOCTOR).await;
    let mut grid = json_body(app.get("/availability").await).await["data"].clone();

    grid["Sunday"]["slots"]["09:00"] = Value::Bool(true);
    let response = app.put("/availability", &grid).await;
    assert_eq!(400, response.status().as_u16());

    grid["Sunday"]["available"] = Value::Bool(true);
    let response = app.put("/availability", &grid).await;
    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["data"]["Sunday"]["slots"]["09:00"], true);
    // Opening Sunday 09:00 brings the seeded Sunday appointment back inside.
    assert_eq!(body["outsideAvailability"].as_array().unwrap().len(), 0);

    grid.as_object_mut().unwrap().remove("Wednesday");
    let response = app.put("/availability", &grid).await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn patients_cannot_edit_availability() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    assert_eq!(403, app.get("/availability").await.status().as_u16());
    assert_eq!(
        403,
        app.post_empty("/availability/draft/days/Monday/toggle")
            .await
            .status()
            .as_u16()
    );
}
