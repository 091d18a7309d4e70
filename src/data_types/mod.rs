pub mod inventory_data_types;
pub mod order_data_types;
pub mod recipe_data_types;
pub mod report_data_types;

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Authenticated operator as returned by `GET /api/auth/admin/me`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// `{ success, data }` wrapper every endpoint answers with.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Unsuccessful(
                self.message.unwrap_or_else(|| "success: false".to_string()),
            ));
        }
        self.data.ok_or(ApiError::MissingData)
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
struct AuthData {
    token: Option<String>,
    user: Option<User>,
}

// login/register put token and user either next to `success` or inside `data`
#[derive(Deserialize, Debug)]
pub struct AuthEnvelope {
    pub success: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    data: Option<AuthData>,
    #[serde(default)]
    message: Option<String>,
}

/// Credential (and the identity, when the backend sent one) from a login or registration.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub token: String,
    pub user: Option<User>,
}

impl AuthEnvelope {
    pub fn into_grant(self) -> Result<AuthGrant, ApiError> {
        if !self.success {
            return Err(ApiError::Unsuccessful(
                self.message.unwrap_or_else(|| "success: false".to_string()),
            ));
        }

        let (nested_token, nested_user) = match self.data {
            Some(data) => (data.token, data.user),
            None => (None, None),
        };

        let token = self.token.or(nested_token).ok_or(ApiError::MissingData)?;
        Ok(AuthGrant {
            token,
            user: self.user.or(nested_user),
        })
    }
}
