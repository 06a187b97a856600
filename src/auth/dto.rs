use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::auth::validate::sanitize;

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trim whitespace and lowercase the email before validation.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.password = self.password.trim().to_string();
        self
    }

    /// Escape unsafe characters in every field. Runs after validation so
    /// that length and format checks see the raw input.
    pub fn sanitized(mut self) -> Self {
        self.first_name = sanitize(&self.first_name);
        self.last_name = sanitize(&self.last_name);
        self.email = sanitize(&self.email);
        self.password = sanitize(&self.password);
        self
    }
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self.password = self.password.trim().to_string();
        self
    }

    /// Same escaping as registration, so hashes compare against the same
    /// bytes that were stored.
    pub fn sanitized(mut self) -> Self {
        self.email = sanitize(&self.email);
        self.password = sanitize(&self.password);
        self
    }
}

/// Request body for OTP confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

impl VerifyOtpRequest {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self.otp = self.otp.trim().to_string();
        self
    }

    /// Escape the email so lookups hit the same value registration stored.
    pub fn sanitized(mut self) -> Self {
        self.email = sanitize(&self.email);
        self
    }
}

/// Request body for re-sending the confirmation OTP.
#[derive(Debug, Clone, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

impl ResendOtpRequest {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self
    }

    pub fn sanitized(mut self) -> Self {
        self.email = sanitize(&self.email);
        self
    }
}

/// Public part of the user returned to the client. Password hash and
/// pending OTP never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Response payload for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginData {
    #[serde(flatten)]
    pub user: UserSummary,
    pub token: String,
}
