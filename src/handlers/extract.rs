use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::models::AdminClaims;
use crate::services::auth::check_auth;
use crate::state::AppState;

/// `Json` whose rejection is rendered in the API's failure envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Admin guard. List it ahead of body and query extractors so an
/// unauthenticated request is refused before its input is parsed.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        check_auth(&parts.headers, &state.config)
    }
}
