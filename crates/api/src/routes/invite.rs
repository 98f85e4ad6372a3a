use axum::{Json, extract::State, http::StatusCode};
use leadflow_db::models::{Invite, Role};
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::Validate;

use crate::{
    error::{ApiError, check},
    extractors::{auth::AuthUser, workspace::WorkspaceContext},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInviteRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub id: String,
    pub workspace_id: String,
    pub email: String,
    pub role: String,
    pub token: String,
    pub expires_at: String,
}

impl From<Invite> for InviteResponse {
    fn from(i: Invite) -> Self {
        Self {
            id: i.id.expect("invite loaded from db").to_hex(),
            workspace_id: i.workspace_id.to_hex(),
            email: i.email,
            role: i.role.as_str().to_string(),
            token: i.token,
            expires_at: i.expires_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InviteTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptInviteResponse {
    pub workspace_id: String,
    pub role: String,
}

pub async fn create(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    Json(body): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<InviteResponse>), ApiError> {
    ctx.require(Role::Admin)?;
    check(&body)?;

    // Nobody hands out a role above their own
    if body.role > ctx.role {
        return Err(ApiError::Forbidden(
            "cannot grant a role above your own".to_string(),
        ));
    }

    let invite = state
        .invites
        .create(
            ctx.workspace_id(),
            &body.email,
            body.role,
            ctx.auth.user_id,
            state.settings.invite.ttl_days,
        )
        .await?;

    let inviter = state.users.base.find_by_id(ctx.auth.user_id).await?;
    if let Err(err) = state
        .mailer
        .send_invite(
            &invite.email,
            &ctx.workspace.name,
            &inviter.display_name,
            &invite.token,
        )
        .await
    {
        error!(%err, email = %invite.email, "Failed to send invite email");
    }

    Ok((StatusCode::CREATED, Json(invite.into())))
}

pub async fn list_pending(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
) -> Result<Json<Vec<InviteResponse>>, ApiError> {
    ctx.require(Role::Admin)?;

    let invites = state.invites.list_pending(ctx.workspace_id()).await?;
    Ok(Json(invites.into_iter().map(Into::into).collect()))
}

pub async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<InviteTokenRequest>,
) -> Result<Json<AcceptInviteResponse>, ApiError> {
    let (_invite, member) = state
        .invites
        .accept(&body.token, auth.user_id, &auth.email)
        .await?;

    Ok(Json(AcceptInviteResponse {
        workspace_id: member.workspace_id.to_hex(),
        role: member.role.as_str().to_string(),
    }))
}

pub async fn decline(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<InviteTokenRequest>,
) -> Result<StatusCode, ApiError> {
    state.invites.decline(&body.token, &auth.email).await?;
    Ok(StatusCode::NO_CONTENT)
}
