use serde::{Deserialize, Serialize};

use crate::users::repo::User;

/// Admin profile update. Password fields are listed only so their
/// presence can be rejected with a pointer to /updateMyPassword.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub status: &'static str,
    pub results: usize,
    pub data: UsersListData,
}

#[derive(Debug, Serialize)]
pub struct UsersListData {
    pub users: Vec<User>,
}

impl UsersListResponse {
    pub fn success(users: Vec<User>) -> Self {
        Self {
            status: "success",
            results: users.len(),
            data: UsersListData { users },
        }
    }
}
