use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

/// Body returned by `/auth/login` and `/auth/register`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MeResponse {
    pub user: AuthUser,
}
