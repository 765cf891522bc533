//! Handlers for short URL redemption.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::dto::redeem::{RedeemQuery, UnlockForm};
use crate::domain::redemption::Denial;
use crate::error::AppError;
use crate::state::AppState;

/// Password prompt page rendered when a protected link is opened without a
/// password.
#[derive(Template, WebTemplate)]
#[template(path = "password.html")]
struct PasswordPromptTemplate {
    identifier: String,
}

/// Redeems an identifier and redirects to its target URL.
///
/// # Endpoint
///
/// `GET /{identifier}` with an optional `?password=` query parameter.
///
/// # Request Flow
///
/// 1. Resolve the record (hot-set cache fast path, store fallback)
/// 2. Re-run the redemption validator regardless of where the record came from
/// 3. Dispatch the usage increment to the background worker
/// 4. Return 307 Temporary Redirect
///
/// A protected link opened without a password renders the password prompt
/// page instead of the bare 401 body, so browser users get a form to retry
/// with.
///
/// # Errors
///
/// - 404 for unknown identifiers
/// - 403 before the validity window opens
/// - 410 after it closes or once the usage cap is reached
/// - 401 for missing or wrong passwords
pub async fn redirect_handler(
    Path(identifier): Path<String>,
    Query(query): Query<RedeemQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    redeem_to_response(&state, identifier, query.password).await
}

/// Redeems a protected identifier with the password posted from the prompt
/// page.
///
/// # Endpoint
///
/// `POST /{identifier}` with a form-encoded `password` field.
pub async fn unlock_handler(
    Path(identifier): Path<String>,
    State(state): State<AppState>,
    Form(form): Form<UnlockForm>,
) -> Result<Response, AppError> {
    redeem_to_response(&state, identifier, Some(form.password)).await
}

async fn redeem_to_response(
    state: &AppState,
    identifier: String,
    password: Option<String>,
) -> Result<Response, AppError> {
    match state
        .redeem_service
        .redeem(&identifier, password.as_deref())
        .await
    {
        Ok(target_url) => Ok(Redirect::temporary(&target_url).into_response()),
        Err(AppError::Denied {
            reason: Denial::PasswordRequired,
        }) => Ok((
            StatusCode::UNAUTHORIZED,
            PasswordPromptTemplate { identifier },
        )
            .into_response()),
        Err(e) => Err(e),
    }
}
