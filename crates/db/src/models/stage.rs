use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workspace_id: ObjectId,
    pub pipeline_id: ObjectId,
    pub name: String,
    pub color: Option<String>,
    /// Order within the pipeline; unique and contiguous by convention.
    #[serde(default)]
    pub position: u32,
    /// When set, a lead moved into this stage is automatically transitioned
    /// to the target pipeline.
    pub auto_move: Option<AutoMove>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoMove {
    pub target_pipeline_id: ObjectId,
    pub target_stage_id: Option<ObjectId>,
    #[serde(default)]
    pub copy_activities: bool,
    #[serde(default)]
    pub archive_source: bool,
}

impl Stage {
    pub const COLLECTION: &'static str = "stages";
}
