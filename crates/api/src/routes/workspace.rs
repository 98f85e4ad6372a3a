use axum::{Json, extract::State, http::StatusCode};
use leadflow_db::models::{Role, Workspace};
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::Validate;

use crate::{
    error::{ApiError, check},
    extractors::{auth::AuthUser, workspace::WorkspaceContext},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkspaceRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 2, max = 48, message = "slug must be 2-48 characters"))]
    pub slug: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub color: Option<String>,
    pub owner_id: String,
    pub is_archived: bool,
}

impl From<Workspace> for WorkspaceResponse {
    fn from(w: Workspace) -> Self {
        Self {
            id: w.id.expect("workspace loaded from db").to_hex(),
            name: w.name,
            slug: w.slug,
            color: w.color,
            owner_id: w.owner_id.to_hex(),
            is_archived: w.is_archived,
        }
    }
}

fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<WorkspaceResponse>>, ApiError> {
    let workspaces = state.workspaces.find_user_workspaces(auth.user_id).await?;
    Ok(Json(workspaces.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<WorkspaceResponse>), ApiError> {
    check(&body)?;
    if !is_slug(&body.slug) {
        return Err(ApiError::Validation(
            "slug may only contain lowercase letters, digits and dashes".to_string(),
        ));
    }

    let workspace = state
        .workspaces
        .create(body.name, body.slug, body.color, auth.user_id)
        .await?;

    if let Err(err) = state
        .mailer
        .send_workspace_welcome(&auth.email, &workspace.name)
        .await
    {
        error!(%err, email = %auth.email, "Failed to send workspace welcome email");
    }

    Ok((StatusCode::CREATED, Json(workspace.into())))
}

pub async fn get(ctx: WorkspaceContext) -> Result<Json<WorkspaceResponse>, ApiError> {
    ctx.require(Role::Viewer)?;
    Ok(Json(ctx.workspace.into()))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    Json(body): Json<UpdateWorkspaceRequest>,
) -> Result<Json<WorkspaceResponse>, ApiError> {
    ctx.require(Role::Admin)?;

    let workspace_id = ctx.workspace_id();
    state
        .workspaces
        .update(workspace_id, body.name, body.color, body.is_archived)
        .await?;

    let workspace = state.workspaces.base.find_by_id(workspace_id).await?;
    Ok(Json(workspace.into()))
}
