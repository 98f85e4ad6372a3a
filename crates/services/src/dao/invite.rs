use bson::{DateTime, doc, oid::ObjectId};
use chrono::{Duration, Utc};
use leadflow_db::models::{Invite, Role, User, WorkspaceMember};
use mongodb::Database;
use nanoid::nanoid;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct InviteDao {
    pub base: BaseDao<Invite>,
    members: BaseDao<WorkspaceMember>,
    users: BaseDao<User>,
}

impl InviteDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Invite::COLLECTION),
            members: BaseDao::new(db, WorkspaceMember::COLLECTION),
            users: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        workspace_id: ObjectId,
        email: &str,
        role: Role,
        invited_by: ObjectId,
        ttl_days: i64,
    ) -> DaoResult<Invite> {
        let email = email.to_lowercase();

        // An existing member cannot be invited again
        if let Some(user) = self
            .users
            .find_one(doc! { "email": &email, "deleted_at": null })
            .await?
        {
            let user_id = user.id.expect("user loaded from db");
            let already_member = self
                .members
                .count(doc! { "workspace_id": workspace_id, "user_id": user_id })
                .await?
                > 0;
            if already_member {
                return Err(DaoError::Conflict(
                    "user is already a member of this workspace".to_string(),
                ));
            }
        }

        // One pending invite per (workspace, email)
        let pending = self
            .base
            .count(doc! {
                "workspace_id": workspace_id,
                "email": &email,
                "accepted_at": null,
                "expires_at": { "$gt": DateTime::now() },
            })
            .await?
            > 0;
        if pending {
            return Err(DaoError::Conflict(
                "an invite for this email is already pending".to_string(),
            ));
        }

        let now = Utc::now();
        let invite = Invite {
            id: None,
            workspace_id,
            email,
            token: nanoid!(32),
            role,
            invited_by,
            expires_at: DateTime::from_chrono(now + Duration::days(ttl_days)),
            accepted_at: None,
            created_at: DateTime::from_chrono(now),
            updated_at: DateTime::from_chrono(now),
        };

        let id = self.base.insert_one(&invite).await?;
        self.base.find_by_id(id).await
    }

    /// Pending invites only: unaccepted and unexpired.
    pub async fn list_pending(&self, workspace_id: ObjectId) -> DaoResult<Vec<Invite>> {
        self.base
            .find_many(
                doc! {
                    "workspace_id": workspace_id,
                    "accepted_at": null,
                    "expires_at": { "$gt": DateTime::now() },
                },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }

    pub async fn find_by_token(&self, token: &str) -> DaoResult<Invite> {
        self.base
            .find_one(doc! { "token": token })
            .await?
            .ok_or(DaoError::NotFound)
    }

    /// Accepts an invite on behalf of the authenticated user, upgrading it to
    /// a membership. The invite email must match the caller's.
    pub async fn accept(
        &self,
        token: &str,
        user_id: ObjectId,
        user_email: &str,
    ) -> DaoResult<(Invite, WorkspaceMember)> {
        let invite = self.find_by_token(token).await?;

        if invite.accepted_at.is_some() {
            return Err(DaoError::Conflict("invite already accepted".to_string()));
        }
        if invite.expires_at <= DateTime::now() {
            return Err(DaoError::Gone("invite expired".to_string()));
        }
        if !invite.email.eq_ignore_ascii_case(user_email) {
            return Err(DaoError::Forbidden(
                "invite was issued for a different email".to_string(),
            ));
        }

        let already_member = self
            .members
            .count(doc! { "workspace_id": invite.workspace_id, "user_id": user_id })
            .await?
            > 0;
        if already_member {
            return Err(DaoError::Conflict(
                "user is already a member of this workspace".to_string(),
            ));
        }

        let now = DateTime::now();
        let member = WorkspaceMember {
            id: None,
            workspace_id: invite.workspace_id,
            user_id,
            role: invite.role,
            invited_by: Some(invite.invited_by),
            joined_at: now,
            created_at: now,
            updated_at: now,
        };
        let member_id = self.members.insert_one(&member).await?;

        self.base
            .update_by_id(
                invite.id.expect("invite loaded from db"),
                doc! { "$set": { "accepted_at": now } },
            )
            .await?;

        let member = self.members.find_by_id(member_id).await?;
        Ok((invite, member))
    }

    /// Declines a pending invite by deleting it.
    pub async fn decline(&self, token: &str, user_email: &str) -> DaoResult<()> {
        let invite = self.find_by_token(token).await?;

        if invite.accepted_at.is_some() {
            return Err(DaoError::Conflict("invite already accepted".to_string()));
        }
        if !invite.email.eq_ignore_ascii_case(user_email) {
            return Err(DaoError::Forbidden(
                "invite was issued for a different email".to_string(),
            ));
        }

        self.base
            .hard_delete(doc! { "_id": invite.id.expect("invite loaded from db") })
            .await?;
        Ok(())
    }
}
