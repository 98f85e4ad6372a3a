use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use leadflow_db::models::{Activity, ActivityKind, Comment, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::{ApiError, check, parse_oid},
    extractors::{auth::AuthUser, workspace::require_role},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: String,
    pub lead_id: String,
    pub author_id: String,
    pub kind: String,
    pub body: String,
    pub due_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
}

impl From<Activity> for ActivityResponse {
    fn from(a: Activity) -> Self {
        Self {
            id: a.id.expect("activity loaded from db").to_hex(),
            lead_id: a.lead_id.to_hex(),
            author_id: a.author_id.to_hex(),
            kind: match a.kind {
                ActivityKind::Note => "note",
                ActivityKind::Call => "call",
                ActivityKind::Email => "email",
                ActivityKind::Whatsapp => "whatsapp",
                ActivityKind::Task => "task",
            }
            .to_string(),
            body: a.body,
            due_at: a.due_at.map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            completed_at: a
                .completed_at
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            created_at: a.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub activity_id: String,
    pub author_id: String,
    pub body: String,
    pub mentions: Vec<String>,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id.expect("comment loaded from db").to_hex(),
            activity_id: c.activity_id.to_hex(),
            author_id: c.author_id.to_hex(),
            body: c.body,
            mentions: c.mentions.iter().map(|id| id.to_hex()).collect(),
            created_at: c.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivityRequest {
    pub body: Option<String>,
    /// `true` completes a task, `false` reopens it.
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "body is required"))]
    pub body: String,
    #[serde(default)]
    pub mentions: Vec<String>,
}

/// Loads an activity by id and gates the caller at `min_role` in its workspace.
async fn load_gated(
    state: &AppState,
    auth: &AuthUser,
    activity_id: &str,
    min_role: Role,
) -> Result<Activity, ApiError> {
    let activity_id = parse_oid(activity_id)?;
    let activity = state.activities.base.find_by_id(activity_id).await?;
    require_role(state, activity.workspace_id, auth, min_role).await?;
    Ok(activity)
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(activity_id): Path<String>,
    Json(body): Json<UpdateActivityRequest>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = load_gated(&state, &auth, &activity_id, Role::Member).await?;
    let activity_id = activity.id.expect("activity loaded from db");

    state
        .activities
        .update(activity_id, body.body, body.completed)
        .await?;

    let activity = state.activities.base.find_by_id(activity_id).await?;
    Ok(Json(activity.into()))
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(activity_id): Path<String>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let activity = load_gated(&state, &auth, &activity_id, Role::Member).await?;
    check(&body)?;

    let mentions = body
        .mentions
        .iter()
        .map(|id| parse_oid(id))
        .collect::<Result<Vec<_>, _>>()?;

    let comment = state
        .activities
        .add_comment(&activity, auth.user_id, body.body, mentions)
        .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(activity_id): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let activity = load_gated(&state, &auth, &activity_id, Role::Viewer).await?;

    let comments = state
        .activities
        .find_comments(activity.id.expect("activity loaded from db"))
        .await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}
