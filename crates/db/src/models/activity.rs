use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workspace_id: ObjectId,
    pub lead_id: ObjectId,
    pub author_id: ObjectId,
    #[serde(default)]
    pub kind: ActivityKind,
    pub body: String,
    /// Tasks only.
    pub due_at: Option<DateTime>,
    pub completed_at: Option<DateTime>,
    /// Stamped by the due-task sweep so a task is reminded at most once.
    pub reminded_at: Option<DateTime>,
    /// Original activity when this row was copied by a pipeline transition.
    pub copied_from: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    #[default]
    Note,
    Call,
    Email,
    Whatsapp,
    Task,
}

impl Activity {
    pub const COLLECTION: &'static str = "activities";
}
