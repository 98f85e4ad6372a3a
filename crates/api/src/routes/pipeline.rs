use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use leadflow_db::models::{Pipeline, Role, Stage};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::{ApiError, check, parse_oid},
    extractors::{auth::AuthUser, workspace::{WorkspaceContext, require_role}},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePipelineRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(min = 1, message = "at least one stage is required"))]
    pub stages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePipelineRequest {
    pub name: Option<String>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddStageRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWebhookRequest {
    pub slug: Option<String>,
    pub default_stage_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StageResponse {
    pub id: String,
    pub pipeline_id: String,
    pub name: String,
    pub color: Option<String>,
    pub position: u32,
    pub auto_move: Option<AutoMoveResponse>,
}

#[derive(Debug, Serialize)]
pub struct AutoMoveResponse {
    pub target_pipeline_id: String,
    pub target_stage_id: Option<String>,
    pub copy_activities: bool,
    pub archive_source: bool,
}

impl From<Stage> for StageResponse {
    fn from(s: Stage) -> Self {
        Self {
            id: s.id.expect("stage loaded from db").to_hex(),
            pipeline_id: s.pipeline_id.to_hex(),
            name: s.name,
            color: s.color,
            position: s.position,
            auto_move: s.auto_move.map(|a| AutoMoveResponse {
                target_pipeline_id: a.target_pipeline_id.to_hex(),
                target_stage_id: a.target_stage_id.map(|id| id.to_hex()),
                copy_activities: a.copy_activities,
                archive_source: a.archive_source,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub slug: String,
    pub position: u32,
    pub is_archived: bool,
    pub stages: Vec<StageResponse>,
}

impl PipelineResponse {
    fn new(p: Pipeline, stages: Vec<Stage>) -> Self {
        Self {
            id: p.id.expect("pipeline loaded from db").to_hex(),
            workspace_id: p.workspace_id.to_hex(),
            name: p.name,
            slug: p.slug,
            position: p.position,
            is_archived: p.is_archived,
            stages: stages.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookConfigResponse {
    pub token: String,
    pub slug: String,
    pub url: String,
    pub default_stage_id: Option<String>,
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            dash = false;
        } else if !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub async fn list(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
) -> Result<Json<Vec<PipelineResponse>>, ApiError> {
    ctx.require(Role::Viewer)?;

    let pipelines = state.pipelines.find_by_workspace(ctx.workspace_id()).await?;

    let mut response = Vec::with_capacity(pipelines.len());
    for pipeline in pipelines {
        let stages = state
            .pipelines
            .find_stages(pipeline.id.expect("pipeline loaded from db"))
            .await?;
        response.push(PipelineResponse::new(pipeline, stages));
    }

    Ok(Json(response))
}

pub async fn create(
    State(state): State<AppState>,
    ctx: WorkspaceContext,
    Json(body): Json<CreatePipelineRequest>,
) -> Result<(StatusCode, Json<PipelineResponse>), ApiError> {
    ctx.require(Role::Admin)?;
    check(&body)?;

    let slug = body.slug.unwrap_or_else(|| slugify(&body.name));
    if slug.is_empty() {
        return Err(ApiError::Validation("slug is required".to_string()));
    }

    let (pipeline, stages) = state
        .pipelines
        .create(ctx.workspace_id(), body.name, slug, body.stages)
        .await?;

    Ok((StatusCode::CREATED, Json(PipelineResponse::new(pipeline, stages))))
}

/// Loads a pipeline by id and gates the caller at `min_role` in its workspace.
async fn load_gated(
    state: &AppState,
    auth: &AuthUser,
    pipeline_id: &str,
    min_role: Role,
) -> Result<Pipeline, ApiError> {
    let pipeline_id = parse_oid(pipeline_id)?;
    let pipeline = state.pipelines.base.find_by_id(pipeline_id).await?;
    if pipeline.deleted_at.is_some() {
        return Err(ApiError::NotFound("resource not found".to_string()));
    }
    require_role(state, pipeline.workspace_id, auth, min_role).await?;
    Ok(pipeline)
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
) -> Result<Json<PipelineResponse>, ApiError> {
    let pipeline = load_gated(&state, &auth, &pipeline_id, Role::Viewer).await?;
    let stages = state
        .pipelines
        .find_stages(pipeline.id.expect("pipeline loaded from db"))
        .await?;
    Ok(Json(PipelineResponse::new(pipeline, stages)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
    Json(body): Json<UpdatePipelineRequest>,
) -> Result<Json<PipelineResponse>, ApiError> {
    let pipeline = load_gated(&state, &auth, &pipeline_id, Role::Admin).await?;
    let pipeline_id = pipeline.id.expect("pipeline loaded from db");

    state
        .pipelines
        .update(pipeline.workspace_id, pipeline_id, body.name, body.is_archived)
        .await?;

    let pipeline = state.pipelines.base.find_by_id(pipeline_id).await?;
    let stages = state.pipelines.find_stages(pipeline_id).await?;
    Ok(Json(PipelineResponse::new(pipeline, stages)))
}

pub async fn duplicate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
) -> Result<(StatusCode, Json<PipelineResponse>), ApiError> {
    let pipeline = load_gated(&state, &auth, &pipeline_id, Role::Admin).await?;

    let (copy, stages) = state.pipelines.duplicate(&pipeline).await?;
    Ok((StatusCode::CREATED, Json(PipelineResponse::new(copy, stages))))
}

pub async fn add_stage(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
    Json(body): Json<AddStageRequest>,
) -> Result<(StatusCode, Json<StageResponse>), ApiError> {
    let pipeline = load_gated(&state, &auth, &pipeline_id, Role::Admin).await?;
    check(&body)?;

    let stage = state
        .pipelines
        .add_stage(&pipeline, body.name, body.color)
        .await?;
    Ok((StatusCode::CREATED, Json(stage.into())))
}

fn webhook_config(state: &AppState, pipeline: &Pipeline) -> WebhookConfigResponse {
    WebhookConfigResponse {
        token: pipeline.webhook_token.clone(),
        slug: pipeline.webhook_slug.clone(),
        url: format!(
            "{}/api/webhooks/in/{}",
            state.settings.app.public_url, pipeline.webhook_slug
        ),
        default_stage_id: pipeline.webhook_default_stage_id.map(|id| id.to_hex()),
    }
}

pub async fn get_webhook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
) -> Result<Json<WebhookConfigResponse>, ApiError> {
    let pipeline = load_gated(&state, &auth, &pipeline_id, Role::Admin).await?;
    Ok(Json(webhook_config(&state, &pipeline)))
}

pub async fn update_webhook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
    Json(body): Json<UpdateWebhookRequest>,
) -> Result<Json<WebhookConfigResponse>, ApiError> {
    let pipeline = load_gated(&state, &auth, &pipeline_id, Role::Admin).await?;
    let pipeline_id = pipeline.id.expect("pipeline loaded from db");

    let default_stage_id = body
        .default_stage_id
        .as_deref()
        .map(parse_oid)
        .transpose()?;

    state
        .pipelines
        .update_webhook(pipeline_id, body.slug, default_stage_id)
        .await?;

    let pipeline = state.pipelines.base.find_by_id(pipeline_id).await?;
    Ok(Json(webhook_config(&state, &pipeline)))
}

/// Invalidates the current webhook token and returns the replacement.
pub async fn rotate_webhook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
) -> Result<Json<WebhookConfigResponse>, ApiError> {
    let pipeline = load_gated(&state, &auth, &pipeline_id, Role::Admin).await?;
    let pipeline_id = pipeline.id.expect("pipeline loaded from db");

    state.pipelines.rotate_webhook_token(pipeline_id).await?;

    let pipeline = state.pipelines.base.find_by_id(pipeline_id).await?;
    Ok(Json(webhook_config(&state, &pipeline)))
}
