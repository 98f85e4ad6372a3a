use axum::{
    Json,
    extract::{Path, State},
};
use bson::doc;
use leadflow_db::models::{AutoMove, Role};
use serde::Deserialize;

use crate::{
    error::{ApiError, parse_oid},
    extractors::{auth::AuthUser, workspace::require_role},
    routes::pipeline::StageResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AutoMoveBody {
    pub target_pipeline_id: String,
    pub target_stage_id: Option<String>,
    #[serde(default)]
    pub copy_activities: bool,
    #[serde(default)]
    pub archive_source: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStageRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub position: Option<u32>,
    pub auto_move: Option<AutoMoveBody>,
    #[serde(default)]
    pub clear_auto_move: bool,
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(stage_id): Path<String>,
    Json(body): Json<UpdateStageRequest>,
) -> Result<Json<StageResponse>, ApiError> {
    let stage_id = parse_oid(&stage_id)?;
    let stage = state.pipelines.stages.find_by_id(stage_id).await?;

    require_role(&state, stage.workspace_id, &auth, Role::Admin).await?;

    let auto_move = if body.clear_auto_move {
        Some(None)
    } else if let Some(auto) = body.auto_move {
        let target_pipeline_id = parse_oid(&auto.target_pipeline_id)?;
        let target_stage_id = auto.target_stage_id.as_deref().map(parse_oid).transpose()?;

        // The auto-move target must be another pipeline of the same workspace
        if target_pipeline_id == stage.pipeline_id {
            return Err(ApiError::Validation(
                "auto-move cannot target the stage's own pipeline".to_string(),
            ));
        }
        let target = state
            .pipelines
            .base
            .find_one(doc! {
                "_id": target_pipeline_id,
                "workspace_id": stage.workspace_id,
                "deleted_at": null,
            })
            .await?;
        if target.is_none() {
            return Err(ApiError::Validation(
                "auto-move target pipeline not found in this workspace".to_string(),
            ));
        }

        Some(Some(AutoMove {
            target_pipeline_id,
            target_stage_id,
            copy_activities: auto.copy_activities,
            archive_source: auto.archive_source,
        }))
    } else {
        None
    };

    let stage = state
        .pipelines
        .update_stage(&stage, body.name, body.color, body.position, auto_move)
        .await?;

    Ok(Json(stage.into()))
}
