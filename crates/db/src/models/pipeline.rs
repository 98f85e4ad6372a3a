use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workspace_id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub position: u32,
    /// Bearer credential for the inbound webhook endpoints. Rotating writes a
    /// fresh value; the previous token is invalid from that write on.
    pub webhook_token: String,
    /// Public, human-readable webhook address (`/api/webhooks/in/{slug}`).
    pub webhook_slug: String,
    /// Where webhook-created leads land; falls back to the first stage.
    pub webhook_default_stage_id: Option<ObjectId>,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

impl Pipeline {
    pub const COLLECTION: &'static str = "pipelines";
}
