use serde::Deserialize;

/// Self-service profile update. Absent fields stay as they are.
///
/// Unknown keys (an `isAdmin` flag included) are dropped during parsing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
}
