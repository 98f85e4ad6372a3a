use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use leadflow_db::models::{ActivityKind, Lead, LeadSource, Role};
use leadflow_services::dao::base::{PaginatedResult, PaginationParams};
use leadflow_services::dao::lead::{LeadDraft, TransitionRequest};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::{ApiError, check, parse_oid},
    extractors::{auth::AuthUser, workspace::require_role},
    routes::activity::ActivityResponse,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub id: String,
    pub workspace_id: String,
    pub pipeline_id: String,
    pub stage_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub value: Option<f64>,
    pub source: String,
    pub owner_id: Option<String>,
    pub is_archived: bool,
    pub transitioned_from: Option<String>,
    pub created_at: String,
}

impl From<Lead> for LeadResponse {
    fn from(l: Lead) -> Self {
        Self {
            id: l.id.expect("lead loaded from db").to_hex(),
            workspace_id: l.workspace_id.to_hex(),
            pipeline_id: l.pipeline_id.to_hex(),
            stage_id: l.stage_id.to_hex(),
            name: l.name,
            email: l.email,
            phone: l.phone,
            company: l.company,
            value: l.value,
            source: match l.source {
                LeadSource::Manual => "manual",
                LeadSource::Webhook => "webhook",
                LeadSource::Transition => "transition",
            }
            .to_string(),
            owner_id: l.owner_id.map(|id| id.to_hex()),
            is_archived: l.is_archived,
            transitioned_from: l.transitioned_from.map(|id| id.to_hex()),
            created_at: l.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LeadListQuery {
    pub stage_id: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub value: Option<f64>,
    pub stage_id: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub value: Option<f64>,
    pub owner_id: Option<String>,
    pub stage_id: Option<String>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UpdateLeadResponse {
    pub lead: LeadResponse,
    /// Set when the stage move triggered an automatic pipeline transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_moved: Option<LeadResponse>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub pipeline_id: String,
    pub stage_id: Option<String>,
    #[serde(default)]
    pub copy_activities: bool,
    #[serde(default)]
    pub archive_source: bool,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub lead: LeadResponse,
    pub copied_activities: u64,
    pub archived_source: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivityRequest {
    pub kind: ActivityKind,
    #[validate(length(min = 1, message = "body is required"))]
    pub body: String,
    pub due_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Loads a lead by id and gates the caller at `min_role` in its workspace.
async fn load_gated(
    state: &AppState,
    auth: &AuthUser,
    lead_id: &str,
    min_role: Role,
) -> Result<Lead, ApiError> {
    let lead_id = parse_oid(lead_id)?;
    let lead = state.leads.base.find_by_id(lead_id).await?;
    require_role(state, lead.workspace_id, auth, min_role).await?;
    Ok(lead)
}

pub async fn list_by_pipeline(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<PaginatedResult<LeadResponse>>, ApiError> {
    let pipeline_id = parse_oid(&pipeline_id)?;
    let pipeline = state.pipelines.base.find_by_id(pipeline_id).await?;
    require_role(&state, pipeline.workspace_id, &auth, Role::Viewer).await?;

    let stage_id = query.stage_id.as_deref().map(parse_oid).transpose()?;
    let params = PaginationParams {
        page: query.page.unwrap_or(1).max(1),
        per_page: query.per_page.unwrap_or(25).clamp(1, 100),
    };

    let result = state
        .leads
        .find_by_pipeline(pipeline_id, stage_id, query.archived, &params)
        .await?;

    Ok(Json(PaginatedResult {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(pipeline_id): Path<String>,
    Json(body): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<LeadResponse>), ApiError> {
    let pipeline_id = parse_oid(&pipeline_id)?;
    let pipeline = state.pipelines.base.find_by_id(pipeline_id).await?;
    if pipeline.is_archived || pipeline.deleted_at.is_some() {
        return Err(ApiError::NotFound("resource not found".to_string()));
    }
    require_role(&state, pipeline.workspace_id, &auth, Role::Member).await?;
    check(&body)?;

    let stages = state.pipelines.find_stages(pipeline_id).await?;
    let explicit = body.stage_id.as_deref().map(parse_oid).transpose()?;
    let stage = explicit
        .and_then(|wanted| stages.iter().find(|s| s.id == Some(wanted)))
        .or_else(|| stages.first())
        .ok_or_else(|| ApiError::Validation("pipeline has no stages".to_string()))?;

    let owner_id = body.owner_id.as_deref().map(parse_oid).transpose()?;
    let lead = state
        .leads
        .create(
            pipeline.workspace_id,
            pipeline_id,
            stage.id.expect("stage loaded from db"),
            LeadDraft {
                name: body.name,
                email: body.email,
                phone: body.phone,
                company: body.company,
                value: body.value,
                owner_id,
            },
            LeadSource::Manual,
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(lead.into())))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<String>,
) -> Result<Json<LeadResponse>, ApiError> {
    let lead = load_gated(&state, &auth, &lead_id, Role::Viewer).await?;
    Ok(Json(lead.into()))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<String>,
    Json(body): Json<UpdateLeadRequest>,
) -> Result<Json<UpdateLeadResponse>, ApiError> {
    let lead = load_gated(&state, &auth, &lead_id, Role::Member).await?;
    let lead_id = lead.id.expect("lead loaded from db");

    let owner_id = body.owner_id.as_deref().map(parse_oid).transpose()?;
    state
        .leads
        .update_fields(
            lead.workspace_id,
            lead_id,
            LeadDraft {
                name: body.name.unwrap_or_default(),
                email: body.email,
                phone: body.phone,
                company: body.company,
                value: body.value,
                owner_id,
            },
        )
        .await?;

    if let Some(archived) = body.is_archived {
        state.leads.set_archived(lead_id, archived).await?;
    }

    // A stage move may carry the lead into a stage that auto-transitions it
    // to another pipeline; the move itself stands either way.
    let mut auto_moved = None;
    if let Some(stage_id) = body.stage_id.as_deref() {
        let stage_id = parse_oid(stage_id)?;
        let stage = state.leads.move_stage(&lead, stage_id).await?;

        if let Some(auto) = stage.auto_move {
            let source = state.leads.base.find_by_id(lead_id).await?;
            let outcome = state
                .leads
                .transition(
                    &source,
                    TransitionRequest {
                        target_pipeline_id: auto.target_pipeline_id,
                        target_stage_id: auto.target_stage_id,
                        copy_activities: auto.copy_activities,
                        archive_source: auto.archive_source,
                    },
                )
                .await?;
            auto_moved = Some(outcome.lead.into());
        }
    }

    let lead = state.leads.base.find_by_id(lead_id).await?;
    Ok(Json(UpdateLeadResponse {
        lead: lead.into(),
        auto_moved,
    }))
}

pub async fn transition(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<String>,
    Json(body): Json<TransitionBody>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
    let lead = load_gated(&state, &auth, &lead_id, Role::Member).await?;

    let target_pipeline_id = parse_oid(&body.pipeline_id)?;
    let target_stage_id = body.stage_id.as_deref().map(parse_oid).transpose()?;

    let outcome = state
        .leads
        .transition(
            &lead,
            TransitionRequest {
                target_pipeline_id,
                target_stage_id,
                copy_activities: body.copy_activities,
                archive_source: body.archive_source,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransitionResponse {
            lead: outcome.lead.into(),
            copied_activities: outcome.copied_activities,
            archived_source: outcome.archived_source,
        }),
    ))
}

pub async fn list_activities(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<String>,
) -> Result<Json<Vec<ActivityResponse>>, ApiError> {
    let lead = load_gated(&state, &auth, &lead_id, Role::Viewer).await?;

    let activities = state
        .activities
        .find_by_lead(lead.id.expect("lead loaded from db"))
        .await?;
    Ok(Json(activities.into_iter().map(Into::into).collect()))
}

pub async fn create_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<String>,
    Json(body): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityResponse>), ApiError> {
    let lead = load_gated(&state, &auth, &lead_id, Role::Member).await?;
    check(&body)?;

    let activity = state
        .activities
        .create(
            lead.workspace_id,
            lead.id.expect("lead loaded from db"),
            auth.user_id,
            body.kind,
            body.body,
            body.due_at.map(bson::DateTime::from_chrono),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(activity.into())))
}
