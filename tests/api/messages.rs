use rstest::rstest;

use crate::utils::{json_body, spawn_app, ADMIN, DOCTOR, PATIENT, PATIENT_2};

#[tokio::test]
async fn conversations_are_listed_oldest_first() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let body = json_body(app.get("/messages").await).await;

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn sending_a_message_notifies_the_receiver() {
    let app = spawn_app().await;
    app.login_as(PATIENT_2).await;

    let response = app
        .post(
            "/messages",
            &serde_json::json!({"receiverId": "d1", "content": "  Can I move my appointment?  "}),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let sent = json_body(response).await;
    assert_eq!(sent["data"]["senderId"], "p2");
    assert_eq!(sent["data"]["content"], "Can I move my appointment?");
    assert_eq!(sent["data"]["read"], false);

    app.login_as(DOCTOR).await;
    let notifications = json_body(app.get("/notifications").await).await;
    let newest = &notifications["data"][0];
    assert_eq!(newest["title"], "New Message");
    assert_eq!(
        newest["message"],
        "You have a new message from Robert Brown"
    );

    let read = json_body(
        app.post_empty(&format!("/notifications/{}/read", newest["id"].as_str().unwrap()))
            .await,
    )
    .await;
    assert_eq!(read["data"]["read"], true);
}

#[rstest]
#[case(serde_json::json!({"receiverId": "d1", "content": "   "}), 400)]
#[case(serde_json::json!({"receiverId": "p1", "content": "Hello me"}), 400)]
#[case(serde_json::json!({"receiverId": "nobody", "content": "Hello"}), 404)]
#[case(serde_json::json!({"content": "Hello"}), 400)]
#[tokio::test]
async fn invalid_messages_are_rejected(
    #[case] body: serde_json::Value,
    #[case] expected_status: u16,
) {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let response = app.post("/messages", &body).await;

    assert_eq!(expected_status, response.status().as_u16());
}

#[tokio::test]
async fn only_the_receiver_marks_a_message_read() {
    let app = spawn_app().await;

    app.login_as(DOCTOR).await;
    assert_eq!(404, app.post_empty("/messages/m3/read").await.status().as_u16());

    app.login_as(PATIENT).await;
    let response = app.post_empty("/messages/m3/read").await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(json_body(response).await["data"]["read"], true);

    let dashboard = json_body(app.get("/dashboard").await).await;
    assert_eq!(dashboard["data"]["unreadMessages"], 0);
}

#[rstest]
#[case(PATIENT, "", 2)]
#[case(PATIENT, "sarah", 1)]
#[case(PATIENT, "JOHN", 2)]
#[case(DOCTOR, "", 2)]
#[case(DOCTOR, "doe", 1)]
#[tokio::test]
async fn contacts_can_be_searched_by_name(
    #[case] email: &str,
    #[case] search: &str,
    #[case] expected: usize,
) {
    let app = spawn_app().await;
    app.login_as(email).await;

    let body = json_body(app.get(&format!("/messages/contacts?search={}", search)).await).await;

    assert_eq!(body["length"], expected);
}

#[tokio::test]
async fn unmatched_contact_search_reports_an_empty_state() {
    let app = spawn_app().await;
    app.login_as(PATIENT).await;

    let body = json_body(app.get("/messages/contacts?search=zzz").await).await;

    assert_eq!(body["status"], "empty");
    assert_eq!(body["message"], "No contacts found");
}

#[tokio::test]
async fn admins_have_no_inbox() {
    let app = spawn_app().await;
    app.login_as(ADMIN).await;

    assert_eq!(403, app.get("/messages").await.status().as_u16());
    let response = app
        .post(
            "/messages",
            &serde_json::json!({"receiverId": "p1", "content": "Hello"}),
        )
        .await;
    assert_eq!(403, response.status().as_u16());
}
