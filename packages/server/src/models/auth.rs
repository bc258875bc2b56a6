use serde::{Deserialize, Serialize};

use crate::models::shared::{Validator, clean};
use crate::models::user::UserResponse;

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "superadmin@example.com")]
    #[serde(default)]
    pub email: Option<String>,
    #[schema(example = "s3cure_P@ss!")]
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    /// `(email, password)` when both are present.
    pub fn validate(self, v: &mut Validator) -> Option<(String, String)> {
        let email = clean(self.email);
        let password = self.password.filter(|p| !p.is_empty());
        v.required("email", email.as_deref(), 255);
        if password.is_none() {
            v.fail("password", "The password field is required.");
        }
        Some((email?, password?))
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token. Carries identity only.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    #[schema(example = false)]
    pub is_superadmin: bool,
    /// Keys attached to the user's role, for display. Superadmins pass every
    /// check regardless of this list.
    #[schema(example = json!(["roles.view"]))]
    pub permissions: Vec<String>,
}
