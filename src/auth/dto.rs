use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::User;
use crate::error::AppError;
use crate::payload::{is_valid_email, require, Validate};
use crate::store::UserId;

/// Request attributes for sign-up.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("username", &self.username)?;
        require("email", &self.email)?;
        require("password", &self.password)?;
        if !is_valid_email(self.email.trim()) {
            return Err(AppError::validation("email", "is not a valid address"));
        }
        Ok(())
    }
}

/// Request attributes for login: a username or an email, plus the password.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

impl LoginRequest {
    pub fn username(&self) -> Option<&str> {
        non_blank(self.username.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        require("password", &self.password)?;
        if self.username().is_none() && self.email().is_none() {
            return Err(AppError::validation("username", "username or email is required"));
        }
        Ok(())
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}
