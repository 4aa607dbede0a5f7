use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;

/// Request body for local signup.
///
/// Fields are optional so an absent field reaches the validator instead of
/// failing JSON extraction.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub mobile: Option<String>,
}

/// Request body for signin.
#[derive(Debug, Default, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Identity asserted by the federated (Google) signin on the client.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub is_admin: bool,
    pub profile_picture: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            mobile: u.mobile,
            is_admin: u.is_admin,
            profile_picture: u.profile_picture,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Response returned after signin: the user fields plus the bearer token.
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}
