use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use cookie::{Cookie, SameSite};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        jwt::{IssuedToken, TokenIssuer},
        services::{login_user, register_user},
    },
    error::AppError,
    state::AppState,
};

pub const TOKEN_COOKIE: &str = "token";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let Json(payload) = payload?;
    let user = register_user(state.users.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    let tokens = TokenIssuer::from_ref(&state);
    let (user, issued) = login_user(state.users.as_ref(), &tokens, payload).await?;

    let cookie = token_cookie(&issued, state.config.cookie_secure).map_err(AppError::internal)?;
    let mut res = Json(PublicUser::from(user)).into_response();
    res.headers_mut().insert(SET_COOKIE, cookie);
    Ok(res)
}

/// `HttpOnly` cookie carrying the session token, expiring with the token itself.
fn token_cookie(
    issued: &IssuedToken,
    secure: bool,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let cookie = Cookie::build((TOKEN_COOKIE, issued.token.clone()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(issued.expires_at)
        .build();
    HeaderValue::from_str(&cookie.to_string())
}
