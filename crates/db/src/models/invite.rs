use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::workspace_member::Role;

/// A time-boxed, email-targeted membership grant. There is no status field:
/// pending = `accepted_at` unset and `expires_at` in the future; expiry is a
/// wall-clock comparison at request time, declines delete the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workspace_id: ObjectId,
    pub email: String,
    pub token: String,
    pub role: Role,
    pub invited_by: ObjectId,
    pub expires_at: DateTime,
    pub accepted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Invite {
    pub const COLLECTION: &'static str = "invites";
}
