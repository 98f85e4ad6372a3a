use axum::{Json, extract::State};
use leadflow_db::models::Activity;
use serde::Serialize;
use tracing::{error, info};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
pub struct DueSweepResponse {
    pub scanned: usize,
    pub notified: usize,
    pub failed: usize,
}

/// `POST /api/cron/due` — externally triggered sweep over due, uncompleted
/// task activities. Each task's lead owner (falling back to the task author)
/// gets a reminder email; a failure on one task never blocks the rest.
pub async fn run_due_sweep(
    State(state): State<AppState>,
) -> Result<Json<DueSweepResponse>, ApiError> {
    let tasks = state.activities.find_due_tasks().await?;
    let scanned = tasks.len();

    let mut notified = 0;
    let mut failed = 0;
    for task in tasks {
        let task_id = task.id.expect("activity loaded from db");
        match notify_task(&state, &task).await {
            Ok(()) => {
                state.activities.mark_reminded(task_id).await?;
                notified += 1;
            }
            Err(err) => {
                error!(?task_id, %err, "Failed to send due-task reminder");
                failed += 1;
            }
        }
    }

    info!(scanned, notified, failed, "Due-task sweep finished");
    Ok(Json(DueSweepResponse {
        scanned,
        notified,
        failed,
    }))
}

async fn notify_task(state: &AppState, task: &Activity) -> Result<(), String> {
    let lead = state
        .leads
        .base
        .find_by_id(task.lead_id)
        .await
        .map_err(|e| e.to_string())?;

    let recipient_id = lead.owner_id.unwrap_or(task.author_id);
    let recipient = state
        .users
        .base
        .find_by_id(recipient_id)
        .await
        .map_err(|e| e.to_string())?;

    state
        .mailer
        .send_task_reminder(&recipient.email, &lead.name, &task.body)
        .await
        .map_err(|e| e.to_string())
}
