use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Fixture builders shared by the engine and route tests. All of them
/// panic on database errors, which is the desired behavior in tests.
pub mod seed {
    use chrono::{Duration, NaiveTime, Utc};
    use sea_orm::ActiveValue::Set;
    use sea_orm::{ActiveModelTrait, DatabaseConnection};

    use crate::models::{
        classroom, enrollment, enrollment_period, grade_component, offering, schedule_slot,
        student, student_grade, subject, subject_prerequisite, user,
    };

    pub async fn user(db: &DatabaseConnection, username: &str, role: user::Role) -> user::Model {
        user::Model::create(db, username, &format!("{username}@example.edu"), "password1", role)
            .await
            .expect("Failed to seed user")
    }

    /// A `student` user plus its student profile.
    pub async fn student(
        db: &DatabaseConnection,
        username: &str,
        code: &str,
        max_subjects: i32,
    ) -> (user::Model, student::Model) {
        let account = user(db, username, user::Role::Student).await;
        let profile = student::Model::create(db, account.id, code, max_subjects)
            .await
            .expect("Failed to seed student profile");
        (account, profile)
    }

    pub async fn subject(
        db: &DatabaseConnection,
        code: &str,
        name: &str,
        semester: i32,
    ) -> subject::Model {
        let now = Utc::now();
        subject::ActiveModel {
            code: Set(code.to_owned()),
            name: Set(name.to_owned()),
            semester: Set(semester),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed subject")
    }

    pub async fn prerequisite(db: &DatabaseConnection, subject_id: i64, prerequisite_id: i64) {
        subject_prerequisite::ActiveModel {
            subject_id: Set(subject_id),
            prerequisite_id: Set(prerequisite_id),
        }
        .insert(db)
        .await
        .expect("Failed to seed prerequisite");
    }

    pub async fn classroom(db: &DatabaseConnection, code: &str, capacity: i32) -> classroom::Model {
        classroom::ActiveModel {
            code: Set(code.to_owned()),
            capacity: Set(capacity),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed classroom")
    }

    /// A period whose date window surrounds now by a day on each side.
    pub async fn period(
        db: &DatabaseConnection,
        name: &str,
        status: enrollment_period::Status,
    ) -> enrollment_period::Model {
        let now = Utc::now();
        enrollment_period::ActiveModel {
            name: Set(name.to_owned()),
            start_date: Set(now - Duration::days(1)),
            end_date: Set(now + Duration::days(30)),
            status: Set(status),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed enrollment period")
    }

    pub async fn offering(
        db: &DatabaseConnection,
        subject_id: i64,
        teacher_id: i64,
        classroom_id: i64,
        period_id: i64,
        max_quota: i32,
    ) -> offering::Model {
        let now = Utc::now();
        offering::ActiveModel {
            subject_id: Set(subject_id),
            teacher_id: Set(teacher_id),
            classroom_id: Set(classroom_id),
            period_id: Set(period_id),
            max_quota: Set(max_quota),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed offering")
    }

    pub async fn slot(
        db: &DatabaseConnection,
        offering_id: i64,
        day: schedule_slot::Day,
        start: &str,
        end: &str,
    ) -> schedule_slot::Model {
        schedule_slot::ActiveModel {
            offering_id: Set(offering_id),
            day: Set(day),
            start_time: Set(NaiveTime::parse_from_str(start, "%H:%M").expect("Bad start time")),
            end_time: Set(NaiveTime::parse_from_str(end, "%H:%M").expect("Bad end time")),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed schedule slot")
    }

    pub async fn enrollment(
        db: &DatabaseConnection,
        student_id: i64,
        offering_id: i64,
        status: enrollment::Status,
    ) -> enrollment::Model {
        let now = Utc::now();
        enrollment::ActiveModel {
            student_id: Set(student_id),
            offering_id: Set(offering_id),
            status: Set(status),
            final_grade: Set(None),
            enrolled_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed enrollment")
    }

    pub async fn component(
        db: &DatabaseConnection,
        offering_id: i64,
        name: &str,
        max_score: f64,
        weight_percent: i32,
        ordinal: i32,
    ) -> grade_component::Model {
        grade_component::ActiveModel {
            offering_id: Set(offering_id),
            name: Set(name.to_owned()),
            max_score: Set(max_score),
            weight_percent: Set(weight_percent),
            ordinal: Set(ordinal),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed grade component")
    }

    pub async fn score(
        db: &DatabaseConnection,
        enrollment_id: i64,
        component_id: i64,
        value: f64,
    ) -> student_grade::Model {
        student_grade::ActiveModel {
            enrollment_id: Set(enrollment_id),
            component_id: Set(component_id),
            score: Set(value),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed score")
    }
}
