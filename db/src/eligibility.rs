//! Enrollment eligibility and the enroll/unenroll/finalize operations.
//!
//! Evaluation is split in two: `EnrollmentContext::load` gathers everything
//! the rules need in one pass, and `evaluate` is a pure function over that
//! context. A failing rule never short-circuits the rest, so the student
//! sees every reason at once. Approved exception requests switch off the
//! single rule they name.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use crate::error::DomainError;
use crate::models::{
    enrollment, enrollment_period, exception_request, offering, period_finalization,
    schedule_slot, student, subject,
};

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub eligible: bool,
    pub reasons: Vec<String>,
}

/// One of the student's active enrollments in the period under evaluation.
#[derive(Debug, Clone)]
pub struct CurrentEnrollment {
    pub enrollment_id: i64,
    pub subject_id: i64,
    pub subject_code: String,
    pub slots: Vec<schedule_slot::Model>,
}

/// Everything `evaluate` needs, loaded up front.
#[derive(Debug, Clone)]
pub struct EnrollmentContext {
    pub student: student::Model,
    pub offering: offering::Model,
    pub subject: subject::Model,
    pub period: enrollment_period::Model,
    pub offering_slots: Vec<schedule_slot::Model>,
    /// Active enrollments currently holding seats in the offering.
    pub active_seats: u64,
    /// The student's active enrollments within the same period.
    pub current: Vec<CurrentEnrollment>,
    pub passed_subject_ids: HashSet<i64>,
    pub prerequisites: Vec<subject::Model>,
    pub finalized: bool,
    pub exceptions: Vec<exception_request::Model>,
}

impl EnrollmentContext {
    pub async fn load(
        db: &DatabaseConnection,
        student: &student::Model,
        offering_id: i64,
    ) -> Result<Self, DomainError> {
        let offering = offering::Entity::find_by_id(offering_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Offering"))?;
        let subject = subject::Entity::find_by_id(offering.subject_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Subject"))?;
        let period = enrollment_period::Entity::find_by_id(offering.period_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound("Enrollment period"))?;

        let offering_slots = offering.slots(db).await?;
        let active_seats = offering.enrolled_count(db).await?;

        // The student's entire enrollment history with offerings attached;
        // active rows in this period feed the clash rules, passed rows feed
        // the prerequisite rule.
        let history = enrollment::Entity::find()
            .filter(enrollment::Column::StudentId.eq(student.id))
            .find_also_related(offering::Entity)
            .all(db)
            .await?;

        let mut passed_subject_ids = HashSet::new();
        let mut active: Vec<(enrollment::Model, offering::Model)> = Vec::new();
        for (enr, off) in history {
            let off = off.ok_or(DomainError::NotFound("Offering"))?;
            match enr.status {
                enrollment::Status::Passed => {
                    passed_subject_ids.insert(off.subject_id);
                }
                enrollment::Status::Active if off.period_id == period.id => {
                    active.push((enr, off));
                }
                _ => {}
            }
        }

        let current = load_current(db, &active).await?;

        let prerequisite_ids = subject.prerequisite_ids(db).await?;
        let prerequisites = if prerequisite_ids.is_empty() {
            Vec::new()
        } else {
            subject::Entity::find()
                .filter(subject::Column::Id.is_in(prerequisite_ids))
                .all(db)
                .await?
        };

        let finalized = period_finalization::Entity::find_by_id((student.id, period.id))
            .one(db)
            .await?
            .is_some();

        let exceptions =
            exception_request::Model::approved_for_student(db, student.id).await?;

        Ok(Self {
            student: student.clone(),
            offering,
            subject,
            period,
            offering_slots,
            active_seats,
            current,
            passed_subject_ids,
            prerequisites,
            finalized,
            exceptions,
        })
    }

    /// True when an approved exception of this kind applies to the offering
    /// under evaluation. `extra_subject` is student-wide; the other kinds
    /// are scoped to the offering they were requested for.
    fn has_override(&self, kind: exception_request::Kind) -> bool {
        self.exceptions.iter().any(|e| {
            e.kind == kind
                && (kind == exception_request::Kind::ExtraSubject
                    || e.offering_id == Some(self.offering.id))
        })
    }
}

async fn load_current(
    db: &DatabaseConnection,
    active: &[(enrollment::Model, offering::Model)],
) -> Result<Vec<CurrentEnrollment>, DomainError> {
    if active.is_empty() {
        return Ok(Vec::new());
    }

    let offering_ids: Vec<i64> = active.iter().map(|(_, o)| o.id).collect();
    let mut slots_by_offering: HashMap<i64, Vec<schedule_slot::Model>> = HashMap::new();
    for slot in schedule_slot::Entity::find()
        .filter(schedule_slot::Column::OfferingId.is_in(offering_ids))
        .all(db)
        .await?
    {
        slots_by_offering.entry(slot.offering_id).or_default().push(slot);
    }

    let subject_ids: Vec<i64> = active.iter().map(|(_, o)| o.subject_id).collect();
    let codes: HashMap<i64, String> = subject::Entity::find()
        .filter(subject::Column::Id.is_in(subject_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.code))
        .collect();

    Ok(active
        .iter()
        .map(|(enr, off)| CurrentEnrollment {
            enrollment_id: enr.id,
            subject_id: off.subject_id,
            subject_code: codes.get(&off.subject_id).cloned().unwrap_or_default(),
            slots: slots_by_offering.remove(&off.id).unwrap_or_default(),
        })
        .collect())
}

/// Runs every rule and returns the full list of violations.
pub fn evaluate(ctx: &EnrollmentContext, now: DateTime<Utc>) -> EligibilityReport {
    use exception_request::Kind;

    let mut reasons = Vec::new();

    if !ctx.period.is_open_at(now) {
        reasons.push("Enrollment period is not open".to_owned());
    }
    if ctx.finalized {
        reasons.push("Enrollment has already been finalized for this period".to_owned());
    }

    if ctx.passed_subject_ids.contains(&ctx.subject.id) {
        reasons.push(format!("Subject {} has already been passed", ctx.subject.code));
    }
    if ctx.current.iter().any(|c| c.subject_id == ctx.subject.id) {
        reasons.push("Already enrolled in this subject".to_owned());
    }

    if ctx.active_seats >= ctx.offering.max_quota as u64 && !ctx.has_override(Kind::QuotaOverride) {
        reasons.push("No quota available in this offering".to_owned());
    }

    if !ctx.has_override(Kind::ScheduleConflict) {
        for current in &ctx.current {
            let clashes = ctx
                .offering_slots
                .iter()
                .any(|slot| current.slots.iter().any(|other| slot.overlaps(other)));
            if clashes {
                reasons.push(format!("Schedule conflict with {}", current.subject_code));
            }
        }
    }

    if !ctx.has_override(Kind::SkipPrerequisite) {
        for prerequisite in &ctx.prerequisites {
            if !ctx.passed_subject_ids.contains(&prerequisite.id) {
                reasons.push(format!("Missing prerequisite: {}", prerequisite.code));
            }
        }
    }

    if ctx.current.len() >= ctx.student.max_subjects as usize
        && !ctx.has_override(Kind::ExtraSubject)
    {
        reasons.push("Maximum number of subjects reached".to_owned());
    }

    EligibilityReport {
        eligible: reasons.is_empty(),
        reasons,
    }
}

/// Load-then-evaluate convenience for the read-only eligibility endpoint.
pub async fn check(
    db: &DatabaseConnection,
    student: &student::Model,
    offering_id: i64,
    now: DateTime<Utc>,
) -> Result<EligibilityReport, DomainError> {
    let ctx = EnrollmentContext::load(db, student, offering_id).await?;
    Ok(evaluate(&ctx, now))
}

/// Enrolls the student, re-checking the quota and the duplicate guard inside
/// the transaction so two racing requests cannot both take the last seat.
/// A previously dropped or failed row for the same offering is reactivated
/// instead of inserting a second one.
pub async fn enroll(
    db: &DatabaseConnection,
    student: &student::Model,
    offering_id: i64,
    now: DateTime<Utc>,
) -> Result<enrollment::Model, DomainError> {
    let existing = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(student.id))
        .filter(enrollment::Column::OfferingId.eq(offering_id))
        .one(db)
        .await?;
    if let Some(ref enr) = existing {
        if enr.status == enrollment::Status::Active {
            return Err(DomainError::AlreadyEnrolled { enrollment_id: enr.id });
        }
    }

    let ctx = EnrollmentContext::load(db, student, offering_id).await?;
    let report = evaluate(&ctx, now);
    if !report.eligible {
        return Err(DomainError::NotEligible(report.reasons));
    }

    let txn = db.begin().await?;

    let seats = enrollment::Entity::find()
        .filter(enrollment::Column::OfferingId.eq(offering_id))
        .filter(enrollment::Column::Status.eq(enrollment::Status::Active))
        .count(&txn)
        .await?;
    if seats >= ctx.offering.max_quota as u64
        && !ctx.has_override(exception_request::Kind::QuotaOverride)
    {
        return Err(DomainError::Conflict);
    }

    let duplicate = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(student.id))
        .filter(enrollment::Column::OfferingId.eq(offering_id))
        .filter(enrollment::Column::Status.eq(enrollment::Status::Active))
        .one(&txn)
        .await?;
    if let Some(enr) = duplicate {
        return Err(DomainError::AlreadyEnrolled { enrollment_id: enr.id });
    }

    let enrolled = match existing {
        Some(previous) => {
            let mut reactivated: enrollment::ActiveModel = previous.into();
            reactivated.status = Set(enrollment::Status::Active);
            reactivated.final_grade = Set(None);
            reactivated.updated_at = Set(now);
            reactivated.update(&txn).await?
        }
        None => {
            enrollment::ActiveModel {
                student_id: Set(student.id),
                offering_id: Set(offering_id),
                status: Set(enrollment::Status::Active),
                final_grade: Set(None),
                enrolled_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;

    info!(
        student_id = student.id,
        offering_id,
        enrollment_id = enrolled.id,
        "student enrolled"
    );
    Ok(enrolled)
}

/// Drops an active enrollment. Only the owning student may do this, only
/// while the period is open, and only before finalizing.
pub async fn unenroll(
    db: &DatabaseConnection,
    student: &student::Model,
    enrollment_id: i64,
    now: DateTime<Utc>,
) -> Result<enrollment::Model, DomainError> {
    let enr = enrollment::Entity::find_by_id(enrollment_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound("Enrollment"))?;
    if enr.student_id != student.id {
        return Err(DomainError::Forbidden);
    }
    if enr.status != enrollment::Status::Active {
        return Err(DomainError::Validation("Enrollment is not active".into()));
    }

    let off = enr
        .find_related(offering::Entity)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound("Offering"))?;
    let period = enrollment_period::Entity::find_by_id(off.period_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound("Enrollment period"))?;
    if !period.is_open_at(now) {
        return Err(DomainError::Validation("Enrollment period is not open".into()));
    }
    if period_finalization::Entity::find_by_id((student.id, period.id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(DomainError::Validation(
            "Enrollment has already been finalized for this period".into(),
        ));
    }

    let mut dropped: enrollment::ActiveModel = enr.into();
    dropped.status = Set(enrollment::Status::Dropped);
    dropped.updated_at = Set(now);
    let dropped = dropped.update(db).await?;

    info!(student_id = student.id, enrollment_id, "student unenrolled");
    Ok(dropped)
}

/// Locks in the student's enrollment set for the currently open period.
/// Requires at least one active enrollment; repeating the call is rejected.
pub async fn finalize(
    db: &DatabaseConnection,
    student: &student::Model,
    now: DateTime<Utc>,
) -> Result<period_finalization::Model, DomainError> {
    let period = enrollment_period::Model::current_open(db, now)
        .await?
        .ok_or_else(|| {
            DomainError::Validation("No enrollment period is currently open".into())
        })?;

    if period_finalization::Entity::find_by_id((student.id, period.id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(DomainError::Validation(
            "Enrollment has already been finalized for this period".into(),
        ));
    }

    let active = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(student.id))
        .filter(enrollment::Column::Status.eq(enrollment::Status::Active))
        .find_also_related(offering::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter(|(_, off)| off.as_ref().is_some_and(|o| o.period_id == period.id))
        .count();
    if active == 0 {
        return Err(DomainError::Validation(
            "Cannot finalize without at least one active enrollment".into(),
        ));
    }

    let finalization = period_finalization::ActiveModel {
        student_id: Set(student.id),
        period_id: Set(period.id),
        finalized_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(
        student_id = student.id,
        period_id = period.id,
        enrollments = active,
        "enrollment finalized"
    );
    Ok(finalization)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use sea_orm::DatabaseConnection;

    use super::*;
    use crate::models::schedule_slot::Day;
    use crate::models::user;
    use crate::test_utils::{seed, setup_test_db};

    fn slot(day: Day, start: &str, end: &str) -> schedule_slot::Model {
        schedule_slot::Model {
            id: 0,
            offering_id: 0,
            day,
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        }
    }

    #[test]
    fn slot_overlap_is_half_open() {
        let base = slot(Day::Monday, "08:00", "10:00");

        assert!(base.overlaps(&slot(Day::Monday, "09:00", "11:00")));
        assert!(base.overlaps(&slot(Day::Monday, "08:30", "09:30")));
        // Back-to-back blocks share an endpoint but not a minute.
        assert!(!base.overlaps(&slot(Day::Monday, "10:00", "12:00")));
        assert!(!base.overlaps(&slot(Day::Tuesday, "09:00", "11:00")));
    }

    struct Fixture {
        db: DatabaseConnection,
        teacher: user::Model,
        student: student::Model,
        room_id: i64,
        period_id: i64,
    }

    async fn fixture() -> Fixture {
        let db = setup_test_db().await;
        let teacher = seed::user(&db, "prof.ada", user::Role::Teacher).await;
        let (_, student) = seed::student(&db, "nina", "EST-2026-0001", 2).await;
        let room = seed::classroom(&db, "A-101", 40).await;
        let period = seed::period(&db, "2026-1", enrollment_period::Status::Open).await;
        Fixture {
            db,
            teacher,
            student,
            room_id: room.id,
            period_id: period.id,
        }
    }

    impl Fixture {
        async fn offering(&self, code: &str, quota: i32) -> offering::Model {
            let subject = seed::subject(&self.db, code, code, 1).await;
            seed::offering(
                &self.db,
                subject.id,
                self.teacher.id,
                self.room_id,
                self.period_id,
                quota,
            )
            .await
        }

        async fn grant_exception(
            &self,
            kind: exception_request::Kind,
            offering_id: Option<i64>,
        ) {
            let now = Utc::now();
            exception_request::ActiveModel {
                student_id: Set(self.student.id),
                kind: Set(kind),
                offering_id: Set(offering_id),
                reason: Set("test".to_owned()),
                status: Set(exception_request::Status::Approved),
                reviewed_by: Set(None),
                admin_notes: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .expect("Failed to grant exception");
        }
    }

    #[tokio::test]
    async fn eligible_student_gets_empty_report() {
        let f = fixture().await;
        let off = f.offering("MAT101", 30).await;

        let report = check(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert!(report.eligible);
        assert!(report.reasons.is_empty());
    }

    #[tokio::test]
    async fn all_violated_rules_are_reported_together() {
        let f = fixture().await;
        // Quota of zero plus an unmet prerequisite, in a draft period.
        let prereq = seed::subject(&f.db, "MAT100", "Precalculus", 1).await;
        let off = f.offering("MAT101", 0).await;
        let subject_id = off.subject_id;
        seed::prerequisite(&f.db, subject_id, prereq.id).await;

        let closed = seed::period(&f.db, "2026-2", enrollment_period::Status::Draft).await;
        let room2 = seed::classroom(&f.db, "B-202", 20).await;
        let adv = seed::subject(&f.db, "MAT201", "Calculus II", 2).await;
        seed::prerequisite(&f.db, adv.id, prereq.id).await;
        let gated =
            seed::offering(&f.db, adv.id, f.teacher.id, room2.id, closed.id, 0).await;

        let report = check(&f.db, &f.student, gated.id, Utc::now()).await.unwrap();
        assert!(!report.eligible);
        assert_eq!(
            report.reasons,
            vec![
                "Enrollment period is not open".to_owned(),
                "No quota available in this offering".to_owned(),
                "Missing prerequisite: MAT100".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn full_offering_blocks_unless_quota_override_granted() {
        let f = fixture().await;
        let off = f.offering("MAT101", 1).await;
        let (_, other) = seed::student(&f.db, "omar", "EST-2026-0002", 7).await;
        seed::enrollment(&f.db, other.id, off.id, enrollment::Status::Active).await;

        let report = check(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert_eq!(report.reasons, vec!["No quota available in this offering".to_owned()]);

        f.grant_exception(exception_request::Kind::QuotaOverride, Some(off.id)).await;
        let report = check(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert!(report.eligible);
    }

    #[tokio::test]
    async fn quota_override_is_scoped_to_one_offering() {
        let f = fixture().await;
        let off = f.offering("MAT101", 0).await;
        let unrelated = f.offering("FIS101", 30).await;

        f.grant_exception(exception_request::Kind::QuotaOverride, Some(unrelated.id)).await;
        let report = check(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert!(!report.eligible);
    }

    #[tokio::test]
    async fn missing_prerequisite_blocks_until_passed_or_waived() {
        let f = fixture().await;
        let prereq = seed::subject(&f.db, "MAT100", "Precalculus", 1).await;
        let off = f.offering("MAT101", 30).await;
        seed::prerequisite(&f.db, off.subject_id, prereq.id).await;

        let report = check(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert_eq!(report.reasons, vec!["Missing prerequisite: MAT100".to_owned()]);

        // A passed enrollment in any offering of the prerequisite satisfies it.
        let closed = seed::period(&f.db, "2025-2", enrollment_period::Status::Closed).await;
        let past =
            seed::offering(&f.db, prereq.id, f.teacher.id, f.room_id, closed.id, 30).await;
        seed::enrollment(&f.db, f.student.id, past.id, enrollment::Status::Passed).await;

        let report = check(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert!(report.eligible);
    }

    #[tokio::test]
    async fn skip_prerequisite_exception_waives_the_rule() {
        let f = fixture().await;
        let prereq = seed::subject(&f.db, "MAT100", "Precalculus", 1).await;
        let off = f.offering("MAT101", 30).await;
        seed::prerequisite(&f.db, off.subject_id, prereq.id).await;

        f.grant_exception(exception_request::Kind::SkipPrerequisite, Some(off.id)).await;
        let report = check(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert!(report.eligible);
    }

    #[tokio::test]
    async fn timetable_clash_is_reported_with_the_other_subject() {
        let f = fixture().await;
        let taken = f.offering("FIS101", 30).await;
        seed::slot(&f.db, taken.id, Day::Monday, "08:00", "10:00").await;
        enroll(&f.db, &f.student, taken.id, Utc::now()).await.unwrap();

        let clashing = f.offering("MAT101", 30).await;
        seed::slot(&f.db, clashing.id, Day::Monday, "09:00", "11:00").await;

        let report = check(&f.db, &f.student, clashing.id, Utc::now()).await.unwrap();
        assert_eq!(report.reasons, vec!["Schedule conflict with FIS101".to_owned()]);

        f.grant_exception(exception_request::Kind::ScheduleConflict, Some(clashing.id)).await;
        let report = check(&f.db, &f.student, clashing.id, Utc::now()).await.unwrap();
        assert!(report.eligible);
    }

    #[tokio::test]
    async fn back_to_back_slots_do_not_clash() {
        let f = fixture().await;
        let taken = f.offering("FIS101", 30).await;
        seed::slot(&f.db, taken.id, Day::Monday, "08:00", "10:00").await;
        enroll(&f.db, &f.student, taken.id, Utc::now()).await.unwrap();

        let adjacent = f.offering("MAT101", 30).await;
        seed::slot(&f.db, adjacent.id, Day::Monday, "10:00", "12:00").await;

        let report = check(&f.db, &f.student, adjacent.id, Utc::now()).await.unwrap();
        assert!(report.eligible);
    }

    #[tokio::test]
    async fn subject_cap_applies_unless_extra_subject_granted() {
        // The fixture student is capped at two subjects.
        let f = fixture().await;
        for code in ["FIS101", "QUI101"] {
            let off = f.offering(code, 30).await;
            enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        }

        let third = f.offering("MAT101", 30).await;
        let report = check(&f.db, &f.student, third.id, Utc::now()).await.unwrap();
        assert_eq!(report.reasons, vec!["Maximum number of subjects reached".to_owned()]);

        f.grant_exception(exception_request::Kind::ExtraSubject, None).await;
        let report = check(&f.db, &f.student, third.id, Utc::now()).await.unwrap();
        assert!(report.eligible);
    }

    #[tokio::test]
    async fn another_offering_of_an_enrolled_subject_is_ineligible() {
        let f = fixture().await;
        let subject = seed::subject(&f.db, "MAT101", "Calculus I", 1).await;
        let morning =
            seed::offering(&f.db, subject.id, f.teacher.id, f.room_id, f.period_id, 30).await;
        let room2 = seed::classroom(&f.db, "B-202", 20).await;
        let evening =
            seed::offering(&f.db, subject.id, f.teacher.id, room2.id, f.period_id, 30).await;

        enroll(&f.db, &f.student, morning.id, Utc::now()).await.unwrap();

        let report = check(&f.db, &f.student, evening.id, Utc::now()).await.unwrap();
        assert!(!report.eligible);
        assert_eq!(report.reasons, vec!["Already enrolled in this subject".to_owned()]);
    }

    #[tokio::test]
    async fn enrolling_twice_returns_the_existing_enrollment() {
        let f = fixture().await;
        let off = f.offering("MAT101", 30).await;

        let first = enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        let err = enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap_err();
        match err {
            DomainError::AlreadyEnrolled { enrollment_id } => {
                assert_eq!(enrollment_id, first.id)
            }
            other => panic!("expected AlreadyEnrolled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropping_and_re_enrolling_reuses_the_row() {
        let f = fixture().await;
        let off = f.offering("MAT101", 30).await;

        let first = enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        let dropped = unenroll(&f.db, &f.student, first.id, Utc::now()).await.unwrap();
        assert_eq!(dropped.status, enrollment::Status::Dropped);

        let again = enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.status, enrollment::Status::Active);
    }

    #[tokio::test]
    async fn dropping_frees_the_seat_for_others() {
        let f = fixture().await;
        let off = f.offering("MAT101", 1).await;
        let enr = enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap();

        let (_, other) = seed::student(&f.db, "omar", "EST-2026-0002", 7).await;
        let err = enroll(&f.db, &other, off.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotEligible(_)));

        unenroll(&f.db, &f.student, enr.id, Utc::now()).await.unwrap();
        assert!(enroll(&f.db, &other, off.id, Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn students_cannot_drop_someone_elses_enrollment() {
        let f = fixture().await;
        let off = f.offering("MAT101", 30).await;
        let enr = enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap();

        let (_, other) = seed::student(&f.db, "omar", "EST-2026-0002", 7).await;
        let err = unenroll(&f.db, &other, enr.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn finalize_requires_an_active_enrollment_and_happens_once() {
        let f = fixture().await;

        let err = finalize(&f.db, &f.student, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let off = f.offering("MAT101", 30).await;
        let enr = enroll(&f.db, &f.student, off.id, Utc::now()).await.unwrap();
        finalize(&f.db, &f.student, Utc::now()).await.unwrap();

        // Finalizing locks the set: no repeat, no further drops, no new seats.
        let err = finalize(&f.db, &f.student, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = unenroll(&f.db, &f.student, enr.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let other = f.offering("FIS101", 30).await;
        let err = enroll(&f.db, &f.student, other.id, Utc::now()).await.unwrap_err();
        match err {
            DomainError::NotEligible(reasons) => assert!(
                reasons.contains(&"Enrollment has already been finalized for this period".to_owned())
            ),
            other => panic!("expected NotEligible, got {other:?}"),
        }
    }
}
