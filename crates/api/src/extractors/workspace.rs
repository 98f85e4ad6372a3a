use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use bson::oid::ObjectId;
use leadflow_db::models::{Role, Workspace};

use crate::{
    error::ApiError,
    extractors::auth::{AuthUser, FromRef},
    state::AppState,
};

/// The workspace/role gate: resolves the workspace a request addresses and
/// the caller's standing in it.
///
/// The workspace is taken from the `workspace_slug` path parameter, the
/// `workspace` query parameter or the `X-Workspace` header, in that order.
/// Distinct rejections: 400 when no workspace is named, 404 when none
/// (unarchived) matches, 403 when the caller has no role in it.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub workspace: Workspace,
    pub role: Role,
    pub auth: AuthUser,
    /// Role granted through the global platform-admin flag, not a membership.
    pub impersonated: bool,
}

impl WorkspaceContext {
    pub fn workspace_id(&self) -> ObjectId {
        self.workspace.id.expect("workspace loaded from db")
    }

    pub fn require(&self, min_role: Role) -> Result<(), ApiError> {
        if self.role >= min_role {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "requires the {} role",
                min_role.as_str()
            )))
        }
    }
}

impl<S> FromRequestParts<S> for WorkspaceContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let slug = slug_from_path(parts, state)
            .await
            .or_else(|| slug_from_query(parts))
            .or_else(|| slug_from_header(parts))
            .ok_or_else(|| ApiError::BadRequest("workspace required".to_string()))?;

        let workspace = app_state
            .workspaces
            .find_by_slug(&slug)
            .await
            .map_err(|_| ApiError::NotFound("workspace not found".to_string()))?;

        let resolved = app_state
            .workspaces
            .resolve_role(workspace.id.expect("workspace loaded from db"), auth.user_id)
            .await?
            .ok_or_else(|| {
                ApiError::Forbidden("not a member of this workspace".to_string())
            })?;

        Ok(WorkspaceContext {
            workspace,
            role: resolved.role,
            auth,
            impersonated: resolved.impersonated,
        })
    }
}

async fn slug_from_path<S: Send + Sync>(parts: &mut Parts, state: &S) -> Option<String> {
    let Path(params): Path<std::collections::HashMap<String, String>> =
        Path::from_request_parts(parts, state).await.ok()?;
    params.get("workspace_slug").cloned()
}

fn slug_from_query(parts: &Parts) -> Option<String> {
    parts.uri.query()?.split('&').find_map(|pair| {
        pair.strip_prefix("workspace=")
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    })
}

fn slug_from_header(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("x-workspace")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Role gate for routes that address an entity directly: the workspace comes
/// from the entity row instead of the request.
pub async fn require_role(
    state: &AppState,
    workspace_id: ObjectId,
    auth: &AuthUser,
    min_role: Role,
) -> Result<Role, ApiError> {
    let resolved = state
        .workspaces
        .resolve_role(workspace_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("not a member of this workspace".to_string()))?;

    if resolved.role >= min_role {
        Ok(resolved.role)
    } else {
        Err(ApiError::Forbidden(format!(
            "requires the {} role",
            min_role.as_str()
        )))
    }
}
