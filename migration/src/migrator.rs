use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202608010001_create_users::Migration),
            Box::new(migrations::m202608010002_create_students::Migration),
            Box::new(migrations::m202608010003_create_subjects::Migration),
            Box::new(migrations::m202608010004_create_subject_prerequisites::Migration),
            Box::new(migrations::m202608010005_create_classrooms::Migration),
            Box::new(migrations::m202608010006_create_enrollment_periods::Migration),
            Box::new(migrations::m202608010007_create_offerings::Migration),
            Box::new(migrations::m202608010008_create_schedule_slots::Migration),
            Box::new(migrations::m202608010009_create_enrollments::Migration),
            Box::new(migrations::m202608010010_create_period_finalizations::Migration),
            Box::new(migrations::m202608010011_create_grade_submissions::Migration),
            Box::new(migrations::m202608010012_create_grade_components::Migration),
            Box::new(migrations::m202608010013_create_student_grades::Migration),
            Box::new(migrations::m202608010014_create_workflow_logs::Migration),
            Box::new(migrations::m202608010015_create_exception_requests::Migration),
        ]
    }
}
