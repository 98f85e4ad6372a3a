use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use leadflow_db::models::{Role, WorkspaceMember};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, parse_oid},
    extractors::{auth::AuthUser, workspace::{WorkspaceContext, require_role}},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: String,
}

impl From<WorkspaceMember> for MemberResponse {
    fn from(m: WorkspaceMember) -> Self {
        Self {
            id: m.id.expect("member loaded from db").to_hex(),
            workspace_id: m.workspace_id.to_hex(),
            user_id: m.user_id.to_hex(),
            role: m.role.as_str().to_string(),
            joined_at: m.joined_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Role,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    ctx.require(Role::Viewer)?;

    let members = state.workspaces.list_members(ctx.workspace_id()).await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(member_id): Path<String>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member_id = parse_oid(&member_id)?;
    let member = state.workspaces.find_member_by_id(member_id).await?;

    let caller_role = require_role(&state, member.workspace_id, &auth, Role::Admin).await?;

    // Only an owner may hand out or take away ownership
    if (body.role == Role::Owner || member.role == Role::Owner) && caller_role < Role::Owner {
        return Err(ApiError::Forbidden(
            "only an owner can change ownership".to_string(),
        ));
    }

    state.workspaces.change_role(&member, body.role).await?;

    let member = state.workspaces.find_member_by_id(member_id).await?;
    Ok(Json(member.into()))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(member_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let member_id = parse_oid(&member_id)?;
    let member = state.workspaces.find_member_by_id(member_id).await?;

    if member.user_id == auth.user_id {
        // Leaving a workspace only needs a membership of one's own
        require_role(&state, member.workspace_id, &auth, Role::Viewer).await?;
    } else {
        let caller_role =
            require_role(&state, member.workspace_id, &auth, Role::Admin).await?;
        if member.role == Role::Owner && caller_role < Role::Owner {
            return Err(ApiError::Forbidden(
                "only an owner can remove an owner".to_string(),
            ));
        }
    }

    state.workspaces.remove_member(&member).await?;
    Ok(StatusCode::NO_CONTENT)
}
