//! Handler for the shorten endpoint.

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::resolve_client_ip;

/// Creates a shortened URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Flow
///
/// 1. Validate the request body
/// 2. Resolve the quota actor (bearer token user, else client IP)
/// 3. Consume one unit of the actor's daily quota
/// 4. Allocate the identifier and write the record
///
/// # Errors
///
/// - 400 on body validation failures
/// - 401 on a present-but-invalid bearer token
/// - 409 when the requested alias is taken
/// - 429 when the daily quota is exhausted
/// - 503 when random allocation collided on every attempt
pub async fn shorten_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let client_ip = resolve_client_ip(&headers, addr, state.behind_proxy);
    let actor = state.auth_service.actor_for_request(&headers, client_ip)?;

    state.quota_service.check_and_consume(&actor).await?;

    let created = state
        .shorten_service
        .create_short_url(payload.into_create())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            identifier: created.identifier,
            short_url: created.short_url,
        }),
    ))
}
