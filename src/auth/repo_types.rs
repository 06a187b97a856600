use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// `confirm_otp` is only populated while an email confirmation is pending;
/// a confirmed user always carries NULL there.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub first_name: String,
    pub last_name: String,
    pub email: String,              // unique, natural lookup key
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub is_confirmed: bool,         // email ownership proven
    pub confirm_otp: Option<i32>,   // pending confirmation code
    pub status: bool,               // administratively active
    pub created_at: OffsetDateTime, // creation timestamp
}
