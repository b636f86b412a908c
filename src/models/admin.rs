use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

/// JWT payload carried by admin console requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminProfile {
    pub email: String,
    pub role: String,
}

impl From<AdminClaims> for AdminProfile {
    fn from(claims: AdminClaims) -> Self {
        Self {
            email: claims.email,
            role: claims.role,
        }
    }
}
