use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{AppJson, AuthUser},
    models::user::ProfileUpdate,
    services::auth::{self, RegisterRequest},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/profile", put(update_profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

fn credentials(email: Option<String>, password: Option<String>) -> AppResult<(String, String)> {
    match (email, password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => Ok((e, p)),
        _ => Err(AppError::validation("Email and password are required")),
    }
}

// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<RegisterBody>,
) -> AppResult<impl IntoResponse> {
    let (email, password) = credentials(body.email, body.password)?;
    let session = auth::register(
        &state.db.pool,
        &state.tokens,
        RegisterRequest {
            email,
            password,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": session.user,
            "token": session.token,
        })),
    ))
}

// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<LoginBody>,
) -> AppResult<impl IntoResponse> {
    let (email, password) = credentials(body.email, body.password)?;
    let session = auth::login(&state.db.pool, &state.tokens, &email, &password).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": session.user,
        "token": session.token,
    })))
}

// POST /api/auth/logout
async fn logout(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<impl IntoResponse> {
    auth::logout(&state.db.pool, &state.tokens, &user.token).await?;
    Ok(Json(json!({ "success": true, "message": "Logged out successfully" })))
}

// GET /api/auth/me
async fn me(user: AuthUser) -> impl IntoResponse {
    Json(json!({ "success": true, "user": user.user }))
}

// PUT /api/auth/profile
async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(update): AppJson<ProfileUpdate>,
) -> AppResult<impl IntoResponse> {
    let updated = auth::update_profile(&state.db.pool, user.id(), update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": updated,
    })))
}
