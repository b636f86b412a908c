use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::{AppError, FieldError};
use crate::handlers::extract::AppJson;
use crate::models::admin::ADMIN_ROLE;
use crate::models::{AdminClaims, AdminProfile, LoginRequest};
use crate::services::auth::{issue_token, verify_credentials};
use crate::state::AppState;

// POST /api/admin/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let mut missing = vec![];
    if email.trim().is_empty() {
        missing.push(FieldError::new("email", "is required"));
    }
    if password.is_empty() {
        missing.push(FieldError::new("password", "is required"));
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(missing));
    }

    if !verify_credentials(&email, &password, &state.config) {
        tracing::warn!(email = %email, "failed admin login");
        return Err(AppError::Unauthorized("Incorrect email or password".to_string()));
    }

    let token = issue_token(&state.config.admin_email, &state.config)?;
    tracing::info!(email = %state.config.admin_email, "admin logged in");

    let admin = AdminProfile {
        email: state.config.admin_email.clone(),
        role: ADMIN_ROLE.to_string(),
    };

    Ok(Json(json!({ "status": "success", "token": token, "data": { "admin": admin } })))
}

// GET /api/admin/me
pub async fn me(claims: AdminClaims) -> Result<Json<Value>, AppError> {
    let admin = AdminProfile::from(claims);

    Ok(Json(json!({ "status": "success", "data": { "admin": admin } })))
}
