use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,                 // ULID
    pub email: String,
    pub username: String,
    pub avatar: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,   // Argon2 PHC string, never exposed in JSON
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    pub last_login_at: Option<PrimitiveDateTime>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

/// Values for a new `users` row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub verification_token: Option<String>,
}
