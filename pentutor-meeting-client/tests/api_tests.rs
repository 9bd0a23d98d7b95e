/*
 * Copyright 2025 PenTutor Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

use std::time::Duration;

use pentutor_meeting_client::{ApiError, MeetingApiClient};
use pentutor_meeting_types::requests::CreateMeetingRequest;
use pentutor_meeting_types::responses::MeetingStatus;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> MeetingApiClient {
    MeetingApiClient::new(&server.uri(), "test-token").unwrap()
}

#[tokio::test]
async fn list_participants_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/meetings/m1/participants/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "meeting": {"meeting_id": "m1", "title": "Algebra", "status": "active"},
            "participants": [{"id": 3, "display_name": "Ada"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).list_participants("m1").await.unwrap();
    assert_eq!(resp.participants.len(), 1);
    assert_eq!(resp.participants[0].id, "3");
    assert_eq!(resp.meeting.unwrap().status, MeetingStatus::Active);
}

#[tokio::test]
async fn participants_status_codes_map_to_distinct_errors() {
    let server = MockServer::start().await;
    for (id, status) in [("a", 401u16), ("b", 403), ("c", 404), ("d", 410), ("e", 500)] {
        Mock::given(method("GET"))
            .and(path(format!("/api/meetings/{id}/participants/")))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({"detail": "nope"})),
            )
            .mount(&server)
            .await;
    }
    let client = client(&server);

    assert!(matches!(
        client.list_participants("a").await,
        Err(ApiError::NotAuthenticated)
    ));
    assert!(matches!(
        client.list_participants("b").await,
        Err(ApiError::Forbidden(m)) if m == "nope"
    ));
    assert!(matches!(
        client.list_participants("c").await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        client.list_participants("d").await,
        Err(ApiError::Expired(_))
    ));
    assert!(matches!(
        client.list_participants("e").await,
        Err(ApiError::ServerError { status: 500, .. })
    ));
}

#[tokio::test]
async fn join_meeting_posts_id_and_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/meetings/join/m1/"))
        .and(body_json(serde_json::json!({"meetingId": "m1", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"participantCount": 2, "status": "active"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).join_meeting("m1", Some("pw")).await.unwrap();
    assert_eq!(resp.participant_count, 2);
    assert_eq!(resp.status, "active");
}

#[tokio::test]
async fn join_meeting_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/meetings/join/slow/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(serde_json::json!({"status": "active"})),
        )
        .mount(&server)
        .await;

    let client = client(&server).with_join_timeout(Duration::from_millis(100));
    assert!(matches!(
        client.join_meeting("slow", None).await,
        Err(ApiError::Timeout)
    ));
}

#[tokio::test]
async fn end_meeting_ignores_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/meetings/end/m1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).end_meeting("m1").await.unwrap();
}

#[tokio::test]
async fn create_and_list_meetings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/meetings/create/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "meeting_id": "abc",
            "meeting": {"id": "abc", "title": "Calculus", "status": "scheduled"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/meetings/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"meeting_id": "abc", "title": "Calculus", "status": "scheduled"},
                {"meeting_id": "old", "title": "Geometry", "status": "ended"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let created = client
        .create_meeting(&CreateMeetingRequest::instant("Calculus"))
        .await
        .unwrap();
    assert_eq!(created.meeting_id, "abc");

    let meetings = client.list_meetings().await.unwrap();
    assert_eq!(meetings.len(), 2);
    assert_eq!(meetings[1].status, MeetingStatus::Ended);
}

#[tokio::test]
async fn recordings_list_and_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/meetings/recordings/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"meeting_id": "abc", "meeting_title": "Calculus", "duration": 42}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/meetings/download-recording/abc/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 1, 2, 3]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/meetings/download-recording/missing/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    let recordings = client.list_recordings().await.unwrap();
    assert_eq!(recordings[0].meeting_title, "Calculus");
    assert_eq!(client.download_recording("abc").await.unwrap(), vec![0, 1, 2, 3]);
    assert!(matches!(
        client.download_recording("missing").await,
        Err(ApiError::NotFound(_))
    ));
}
