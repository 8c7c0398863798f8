pub mod m202608010001_create_users;
pub mod m202608010002_create_students;
pub mod m202608010003_create_subjects;
pub mod m202608010004_create_subject_prerequisites;
pub mod m202608010005_create_classrooms;
pub mod m202608010006_create_enrollment_periods;
pub mod m202608010007_create_offerings;
pub mod m202608010008_create_schedule_slots;
pub mod m202608010009_create_enrollments;
pub mod m202608010010_create_period_finalizations;
pub mod m202608010011_create_grade_submissions;
pub mod m202608010012_create_grade_components;
pub mod m202608010013_create_student_grades;
pub mod m202608010014_create_workflow_logs;
pub mod m202608010015_create_exception_requests;
