//! Helpers shared across route modules.

use sea_orm::{DatabaseConnection, EntityTrait};
use validator::ValidationErrors;

use crate::auth::claims::AuthUser;
use db::DomainError;
use db::models::{offering, student, user};

/// Flattens `validator` errors into one user-facing message.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub async fn require_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<user::Model, DomainError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound("User"))
}

/// The student profile behind the authenticated account.
pub async fn require_student(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<student::Model, DomainError> {
    student::Model::for_user(db, user_id)
        .await?
        .ok_or(DomainError::NotFound("Student profile"))
}

/// Loads an offering and checks the caller may manage its grade sheet:
/// the assigned teacher, or any administrator.
pub async fn require_offering_access(
    db: &DatabaseConnection,
    auth: &AuthUser,
    offering_id: i64,
) -> Result<offering::Model, DomainError> {
    let off = offering::Entity::find_by_id(offering_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound("Offering"))?;

    if auth.0.role != user::Role::Administrator && off.teacher_id != auth.0.sub {
        return Err(DomainError::Forbidden);
    }
    Ok(off)
}
