mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use db::models::{enrollment, enrollment_period, user};
use db::test_utils::seed;
use helpers::{send, test_app, token_for};
use sea_orm::DatabaseConnection;

struct GradeFixture {
    admin_token: String,
    teacher_token: String,
    student_token: String,
    offering_id: i64,
    enrollment_id: i64,
}

async fn grade_fixture(db: &DatabaseConnection) -> GradeFixture {
    let admin = seed::user(db, "registrar", user::Role::Administrator).await;
    let teacher = seed::user(db, "prof.ada", user::Role::Teacher).await;
    let (student_account, profile) = seed::student(db, "nina", "EST-2026-0001", 7).await;

    let subject = seed::subject(db, "MAT101", "Calculus I", 1).await;
    let room = seed::classroom(db, "A-101", 40).await;
    let period = seed::period(db, "2026-1", enrollment_period::Status::Open).await;
    let offering = seed::offering(db, subject.id, teacher.id, room.id, period.id, 30).await;
    let enr = seed::enrollment(db, profile.id, offering.id, enrollment::Status::Active).await;

    GradeFixture {
        admin_token: token_for(&admin),
        teacher_token: token_for(&teacher),
        student_token: token_for(&student_account),
        offering_id: offering.id,
        enrollment_id: enr.id,
    }
}

#[tokio::test]
#[serial]
async fn full_grade_lifecycle_reaches_the_student() {
    let (app, db) = test_app().await;
    let f = grade_fixture(&db).await;
    let grades_uri = format!("/api/v1/offerings/{}/grades", f.offering_id);

    // Teacher defines the structure.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("{grades_uri}/structure"),
        Some(&f.teacher_token),
        Some(json!({
            "components": [
                { "name": "Assignments", "max_score": 100.0, "weight_percent": 50 },
                { "name": "Exam", "max_score": 100.0, "weight_percent": 50 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let components = body["data"].as_array().unwrap();
    let assignments_id = components[0]["id"].as_i64().unwrap();
    let exam_id = components[1]["id"].as_i64().unwrap();

    // Submitting with a missing exam score is blocked and names the gap.
    let (status, _) = send(
        &app,
        "POST",
        &grades_uri,
        Some(&f.teacher_token),
        Some(json!({
            "scores": [
                { "enrollment_id": f.enrollment_id, "component_id": assignments_id, "score": 80.0 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{grades_uri}/submit"),
        Some(&f.teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["missing"][0]["student_code"], "EST-2026-0001");
    assert_eq!(body["data"]["missing"][0]["component_name"], "Exam");

    // Entering the last score unlocks submit.
    let (status, _) = send(
        &app,
        "POST",
        &grades_uri,
        Some(&f.teacher_token),
        Some(json!({
            "scores": [
                { "enrollment_id": f.enrollment_id, "component_id": exam_id, "score": 40.0 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{grades_uri}/submit"),
        Some(&f.teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted");
    let submission_id = body["data"]["id"].as_i64().unwrap();

    // Admin sees it in the queue; rejection without notes is refused.
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/grades/submissions?status=submitted",
        Some(&f.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"].as_i64().unwrap(), submission_id);
    assert_eq!(body["data"][0]["subject_code"], "MAT101");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/grades/submissions/{submission_id}/reject"),
        Some(&f.admin_token),
        Some(json!({ "notes": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/grades/submissions/{submission_id}/reject"),
        Some(&f.admin_token),
        Some(json!({ "notes": "Exam scores look transposed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected");

    // Teacher sees the notes, corrects and resubmits.
    let (status, body) = send(&app, "GET", &grades_uri, Some(&f.teacher_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rejection_notes"], "Exam scores look transposed");

    let (status, _) = send(
        &app,
        "POST",
        &format!("{grades_uri}/submit"),
        Some(&f.teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Approve, publish, and the student sees the final grade.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/grades/submissions/{submission_id}/approve"),
        Some(&f.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/grades/submissions/{submission_id}/publish"),
        Some(&f.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "published");

    let (status, body) = send(&app, "GET", "/api/v1/me/grades", Some(&f.student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let grades = body["data"].as_array().unwrap();
    assert_eq!(grades.len(), 1);
    assert_eq!(grades[0]["subject_code"], "MAT101");
    assert_eq!(grades[0]["final_grade"], 60.0);
    assert_eq!(grades[0]["status"], "passed");

    // The audit trail recorded the whole journey.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/grades/submissions/{submission_id}"),
        Some(&f.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["data"]["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert_eq!(
        actions,
        vec!["start", "submit", "reject", "resubmit", "approve", "publish"]
    );
}

#[tokio::test]
#[serial]
async fn unpublished_grades_stay_hidden_from_students() {
    let (app, db) = test_app().await;
    let f = grade_fixture(&db).await;

    let (status, body) = send(&app, "GET", "/api/v1/me/grades", Some(&f.student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn only_the_assigned_teacher_touches_the_sheet() {
    let (app, db) = test_app().await;
    let f = grade_fixture(&db).await;
    let other = seed::user(&db, "prof.eve", user::Role::Teacher).await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/offerings/{}/grades", f.offering_id),
        Some(&token_for(&other)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn structure_is_frozen_while_under_review() {
    let (app, db) = test_app().await;
    let f = grade_fixture(&db).await;
    let grades_uri = format!("/api/v1/offerings/{}/grades", f.offering_id);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{grades_uri}/structure"),
        Some(&f.teacher_token),
        Some(json!({
            "components": [{ "name": "Exam", "max_score": 100.0, "weight_percent": 100 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let exam_id = body["data"][0]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &grades_uri,
        Some(&f.teacher_token),
        Some(json!({
            "scores": [{ "enrollment_id": f.enrollment_id, "component_id": exam_id, "score": 70.0 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{grades_uri}/submit"),
        Some(&f.teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("{grades_uri}/structure"),
        Some(&f.teacher_token),
        Some(json!({
            "components": [{ "name": "Exam", "max_score": 100.0, "weight_percent": 100 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
