pub mod classroom;
pub mod enrollment;
pub mod enrollment_period;
pub mod exception_request;
pub mod grade_component;
pub mod grade_submission;
pub mod offering;
pub mod period_finalization;
pub mod schedule_slot;
pub mod student;
pub mod student_grade;
pub mod subject;
pub mod subject_prerequisite;
pub mod user;
pub mod workflow_log;

pub use classroom::Entity as Classroom;
pub use enrollment::Entity as Enrollment;
pub use enrollment_period::Entity as EnrollmentPeriod;
pub use exception_request::Entity as ExceptionRequest;
pub use grade_component::Entity as GradeComponent;
pub use grade_submission::Entity as GradeSubmission;
pub use offering::Entity as Offering;
pub use period_finalization::Entity as PeriodFinalization;
pub use schedule_slot::Entity as ScheduleSlot;
pub use student::Entity as Student;
pub use student_grade::Entity as StudentGrade;
pub use subject::Entity as Subject;
pub use subject_prerequisite::Entity as SubjectPrerequisite;
pub use user::Entity as User;
pub use workflow_log::Entity as WorkflowLog;
