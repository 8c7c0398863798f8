mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use db::models::user;
use db::test_utils::seed;
use helpers::{send, test_app, token_for};

#[tokio::test]
#[serial]
async fn admin_can_stand_up_a_full_catalog() {
    let (app, db) = test_app().await;
    let admin = seed::user(&db, "registrar", user::Role::Administrator).await;
    let teacher = seed::user(&db, "prof.ada", user::Role::Teacher).await;
    let token = token_for(&admin);

    let (status, prereq) = send(
        &app,
        "POST",
        "/api/v1/subjects",
        Some(&token),
        Some(json!({ "code": "MAT100", "name": "Precalculus", "semester": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let prereq_id = prereq["data"]["id"].as_i64().unwrap();

    let (status, subject) = send(
        &app,
        "POST",
        "/api/v1/subjects",
        Some(&token),
        Some(json!({
            "code": "MAT101",
            "name": "Calculus I",
            "semester": 2,
            "prerequisite_ids": [prereq_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subject["data"]["prerequisite_ids"][0], prereq_id);
    let subject_id = subject["data"]["id"].as_i64().unwrap();

    let (status, room) = send(
        &app,
        "POST",
        "/api/v1/classrooms",
        Some(&token),
        Some(json!({ "code": "A-101", "capacity": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let classroom_id = room["data"]["id"].as_i64().unwrap();

    let (status, period) = send(
        &app,
        "POST",
        "/api/v1/periods",
        Some(&token),
        Some(json!({
            "name": "2026-1",
            "start_date": "2026-01-01T00:00:00Z",
            "end_date": "2026-03-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(period["data"]["status"], "draft");
    let period_id = period["data"]["id"].as_i64().unwrap();

    let (status, offering) = send(
        &app,
        "POST",
        "/api/v1/offerings",
        Some(&token),
        Some(json!({
            "subject_id": subject_id,
            "teacher_id": teacher.id,
            "classroom_id": classroom_id,
            "period_id": period_id,
            "max_quota": 30,
            "slots": [
                { "day": "monday", "start_time": "08:00", "end_time": "10:00" },
                { "day": "wednesday", "start_time": "08:00", "end_time": "10:00" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let offering_id = offering["data"]["id"].as_i64().unwrap();

    let (status, listing) = send(
        &app,
        "GET",
        &format!("/api/v1/offerings?period_id={period_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = listing["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64().unwrap(), offering_id);
    assert_eq!(items[0]["subject_code"], "MAT101");
    assert_eq!(items[0]["slots"].as_array().unwrap().len(), 2);
    assert_eq!(items[0]["enrolled"], 0);
}

#[tokio::test]
#[serial]
async fn duplicate_subject_codes_are_rejected() {
    let (app, db) = test_app().await;
    let admin = seed::user(&db, "registrar", user::Role::Administrator).await;
    seed::subject(&db, "MAT101", "Calculus I", 1).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/subjects",
        Some(&token_for(&admin)),
        Some(json!({ "code": "MAT101", "name": "Calculus I again", "semester": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn offerings_cannot_be_assigned_to_non_teachers() {
    let (app, db) = test_app().await;
    let admin = seed::user(&db, "registrar", user::Role::Administrator).await;
    let (student_account, _) = seed::student(&db, "nina", "EST-2026-0001", 7).await;
    let subject = seed::subject(&db, "MAT101", "Calculus I", 1).await;
    let room = seed::classroom(&db, "A-101", 40).await;
    let period = seed::period(&db, "2026-1", db::models::enrollment_period::Status::Draft).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/offerings",
        Some(&token_for(&admin)),
        Some(json!({
            "subject_id": subject.id,
            "teacher_id": student_account.id,
            "classroom_id": room.id,
            "period_id": period.id,
            "max_quota": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Assigned user is not a teacher");
}

#[tokio::test]
#[serial]
async fn only_one_period_may_be_open() {
    let (app, db) = test_app().await;
    let admin = seed::user(&db, "registrar", user::Role::Administrator).await;
    let token = token_for(&admin);
    let first = seed::period(&db, "2026-1", db::models::enrollment_period::Status::Draft).await;
    let second = seed::period(&db, "2026-2", db::models::enrollment_period::Status::Draft).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/periods/{}/open", first.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "open");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/periods/{}/open", second.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/periods/{}/close", first.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/periods/{}/open", second.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
