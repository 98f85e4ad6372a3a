use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workspace_id: ObjectId,
    pub activity_id: ObjectId,
    pub author_id: ObjectId,
    pub body: String,
    #[serde(default)]
    pub mentions: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Comment {
    pub const COLLECTION: &'static str = "comments";
}
