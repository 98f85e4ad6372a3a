use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::Validate;

use crate::{
    error::{ApiError, check},
    extractors::auth::AuthUser,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "display name is required"))]
    pub display_name: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub workspace_name: Option<String>,
    pub workspace_slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

fn auth_cookie(token: &str, max_age: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let cookie = format!(
        "access_token={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}"
    );
    headers.insert(header::SET_COOKIE, cookie.parse().unwrap());
    headers
}

fn user_response(user: leadflow_db::models::User) -> UserResponse {
    UserResponse {
        id: user.id.expect("user loaded from db").to_hex(),
        email: user.email,
        display_name: user.display_name,
        avatar: user.avatar,
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError> {
    check(&body)?;

    let password_hash = state.auth.hash_password(&body.password)?;

    let user = state
        .users
        .create(body.email.clone(), body.display_name.clone(), password_hash)
        .await
        .map_err(|err| match err {
            leadflow_services::dao::base::DaoError::DuplicateKey(_) => {
                ApiError::Conflict("an account with this email already exists".to_string())
            }
            other => other.into(),
        })?;

    let user_id = user.id.expect("user loaded from db");

    // Create a first workspace if requested
    if let (Some(name), Some(slug)) = (body.workspace_name, body.workspace_slug) {
        state
            .workspaces
            .create(name, slug, None, user_id)
            .await?;
    }

    let tokens = state.auth.generate_tokens(user_id, &user.email)?;
    let headers = auth_cookie(&tokens.access_token, tokens.expires_in);

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: user_response(user),
    };

    Ok((StatusCode::CREATED, headers, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let user = state
        .users
        .find_by_email(&body.email)
        .await
        .map_err(|_| ApiError::Unauthorized("invalid credentials".to_string()))?;

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or_else(|| ApiError::Unauthorized("no password set".to_string()))?;

    let valid = state.auth.verify_password(&body.password, password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let user_id = user.id.expect("user loaded from db");
    let tokens = state.auth.generate_tokens(user_id, &user.email)?;
    let headers = auth_cookie(&tokens.access_token, tokens.expires_in);

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: user_response(user),
    };

    Ok((headers, Json(response)))
}

pub async fn logout() -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let cookie = "access_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0";
    headers.insert(header::SET_COOKIE, cookie.parse().unwrap());
    Ok(headers)
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;

    let user_id = bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("invalid user id".to_string()))?;

    let user = state.users.base.find_by_id(user_id).await?;

    let tokens = state.auth.generate_tokens(user_id, &user.email)?;
    let headers = auth_cookie(&tokens.access_token, tokens.expires_in);

    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: user_response(user),
    };

    Ok((headers, Json(response)))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.base.find_by_id(auth.user_id).await?;
    Ok(Json(user_response(user)))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .users
        .update_profile(
            auth.user_id,
            body.display_name,
            body.avatar,
            body.locale,
            body.timezone,
        )
        .await?;

    let user = state.users.base.find_by_id(auth.user_id).await?;
    Ok(Json(user_response(user)))
}

/// Always answers 200 so the endpoint cannot be used to probe for accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    check(&body)?;

    if let Ok(user) = state.users.find_by_email(&body.email).await {
        let reset = state
            .users
            .create_password_reset(user.id.expect("user loaded from db"))
            .await?;

        if let Err(err) = state
            .mailer
            .send_password_reset(&user.email, &reset.token)
            .await
        {
            error!(%err, email = %user.email, "Failed to send password reset email");
        }
    }

    Ok(StatusCode::OK)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    check(&body)?;

    let password_hash = state.auth.hash_password(&body.password)?;
    state.users.reset_password(&body.token, password_hash).await?;

    Ok(StatusCode::OK)
}
