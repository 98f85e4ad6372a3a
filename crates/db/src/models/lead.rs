use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workspace_id: ObjectId,
    pub pipeline_id: ObjectId,
    pub stage_id: ObjectId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    /// Estimated deal value, in the workspace's currency.
    pub value: Option<f64>,
    #[serde(default)]
    pub source: LeadSource,
    /// Member responsible for the lead.
    pub owner_id: Option<ObjectId>,
    #[serde(default)]
    pub is_archived: bool,
    /// Source lead when this row was created by a pipeline transition.
    pub transitioned_from: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    #[default]
    Manual,
    Webhook,
    Transition,
}

impl Lead {
    pub const COLLECTION: &'static str = "leads";
}
