use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
};
use leadflow_db::models::{LeadSource, Pipeline};
use leadflow_services::dao::lead::LeadDraft;
use serde::Deserialize;

use crate::{error::{ApiError, parse_oid}, routes::lead::LeadResponse, state::AppState};

#[derive(Debug, Deserialize)]
pub struct WebhookLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub value: Option<f64>,
}

/// `POST /api/webhooks/pipelines/{pipeline_id}` — inbound lead, addressed by
/// pipeline id, authenticated by the pipeline's bearer token.
pub async fn ingest_by_id(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<WebhookLeadRequest>,
) -> Result<(StatusCode, Json<LeadResponse>), ApiError> {
    let pipeline_id = parse_oid(&pipeline_id)?;
    let pipeline = state
        .pipelines
        .base
        .find_one(bson::doc! {
            "_id": pipeline_id,
            "is_archived": false,
            "deleted_at": null,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("pipeline not found".to_string()))?;

    ingest(&state, pipeline, &headers, body).await
}

/// `POST /api/webhooks/in/{slug}` — same, addressed by the webhook slug.
pub async fn ingest_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(body): Json<WebhookLeadRequest>,
) -> Result<(StatusCode, Json<LeadResponse>), ApiError> {
    let pipeline = state
        .pipelines
        .find_by_webhook_slug(&slug)
        .await
        .map_err(|_| ApiError::NotFound("pipeline not found".to_string()))?;

    ingest(&state, pipeline, &headers, body).await
}

async fn ingest(
    state: &AppState,
    pipeline: Pipeline,
    headers: &HeaderMap,
    body: WebhookLeadRequest,
) -> Result<(StatusCode, Json<LeadResponse>), ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    if token != pipeline.webhook_token {
        return Err(ApiError::Unauthorized("invalid webhook token".to_string()));
    }

    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("name is required".to_string()))?;

    let pipeline_id = pipeline.id.expect("pipeline loaded from db");
    let stages = state.pipelines.find_stages(pipeline_id).await?;

    // Configured default stage when it still exists, else the first stage
    let stage = pipeline
        .webhook_default_stage_id
        .and_then(|wanted| stages.iter().find(|s| s.id == Some(wanted)))
        .or_else(|| stages.first())
        .ok_or_else(|| ApiError::Gone("pipeline has no stages".to_string()))?;

    let lead = state
        .leads
        .create(
            pipeline.workspace_id,
            pipeline_id,
            stage.id.expect("stage loaded from db"),
            LeadDraft {
                name,
                email: body.email,
                phone: body.phone,
                company: body.company,
                value: body.value,
                owner_id: None,
            },
            LeadSource::Webhook,
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(lead.into())))
}
