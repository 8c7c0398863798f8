use db::models::user::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub exp: usize,
}

/// The authenticated caller, decoded from the Bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
