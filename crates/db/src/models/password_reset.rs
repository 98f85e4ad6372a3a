use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// One-shot password reset token. `used_at` is stamped when the token is
/// consumed; a stamped or expired token can never reset a password again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub token: String,
    pub expires_at: DateTime,
    pub used_at: Option<DateTime>,
    pub created_at: DateTime,
}

impl PasswordReset {
    pub const COLLECTION: &'static str = "password_resets";
}
