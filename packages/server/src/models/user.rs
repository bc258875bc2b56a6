use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::entity::{role, user};
use crate::models::role::RoleSummary;
use crate::models::shared::{Pagination, Validator, clean};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Create or replace a user. `password` may be omitted on update.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UserRequest {
    #[schema(example = "Ana Torres")]
    #[serde(default)]
    pub name: Option<String>,
    #[schema(example = "ana@example.com")]
    #[serde(default)]
    pub email: Option<String>,
    /// Plaintext password, at least 8 characters.
    #[schema(example = "s3cure_P@ss!")]
    #[serde(default)]
    pub password: Option<String>,
    /// Role to assign; `null` or absent leaves the user without a role.
    #[schema(example = 2)]
    #[serde(default)]
    pub role_id: Option<i32>,
}

#[derive(Debug)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub role_id: Option<i32>,
}

impl UserRequest {
    pub fn validate(self, v: &mut Validator, password_required: bool) -> Option<UserInput> {
        let name = clean(self.name);
        let email = clean(self.email);
        let password = self.password.filter(|p| !p.is_empty());

        v.required("name", name.as_deref(), 255);
        v.required("email", email.as_deref(), 255);
        if let Some(email) = email.as_deref()
            && !email.validate_email()
        {
            v.fail("email", "The email field must be a valid email address.");
        }

        match password.as_deref() {
            None if password_required => v.fail("password", "The password field is required."),
            Some(p) if p.chars().count() < MIN_PASSWORD_LEN => v.fail(
                "password",
                format!("The password field must be at least {MIN_PASSWORD_LEN} characters."),
            ),
            _ => {}
        }

        Some(UserInput {
            name: name?,
            email: email?,
            password,
            role_id: self.role_id,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Ana Torres")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    pub role: Option<RoleSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(m: user::Model, role: Option<role::Model>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            role: role.map(RoleSummary::from),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A page of users plus every role, for assignment screens.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
    pub roles: Vec<RoleSummary>,
}
