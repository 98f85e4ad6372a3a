use bson::{DateTime, doc, oid::ObjectId};
use leadflow_db::models::{Role, User, Workspace, WorkspaceMember};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

/// The caller's resolved standing inside a workspace.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRole {
    pub role: Role,
    /// True when the role comes from the global platform-admin flag rather
    /// than a membership row.
    pub impersonated: bool,
}

pub struct WorkspaceDao {
    pub base: BaseDao<Workspace>,
    pub members: BaseDao<WorkspaceMember>,
    users: BaseDao<User>,
}

impl WorkspaceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Workspace::COLLECTION),
            members: BaseDao::new(db, WorkspaceMember::COLLECTION),
            users: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        slug: String,
        color: Option<String>,
        owner_id: ObjectId,
    ) -> DaoResult<Workspace> {
        let now = DateTime::now();
        let workspace = Workspace {
            id: None,
            name,
            slug,
            color,
            owner_id,
            is_archived: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let workspace_id = self.base.insert_one(&workspace).await?;

        // Creator becomes the first owner
        self.add_member(workspace_id, owner_id, Role::Owner, None)
            .await?;

        self.base.find_by_id(workspace_id).await
    }

    pub async fn find_by_slug(&self, slug: &str) -> DaoResult<Workspace> {
        self.base
            .find_one(doc! { "slug": slug, "is_archived": false, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_user_workspaces(&self, user_id: ObjectId) -> DaoResult<Vec<Workspace>> {
        let memberships = self
            .members
            .find_many(doc! { "user_id": user_id }, None)
            .await?;

        let workspace_ids: Vec<ObjectId> = memberships.iter().map(|m| m.workspace_id).collect();

        if workspace_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.base
            .find_many(
                doc! { "_id": { "$in": workspace_ids }, "deleted_at": null },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn update(
        &self,
        workspace_id: ObjectId,
        name: Option<String>,
        color: Option<String>,
        is_archived: Option<bool>,
    ) -> DaoResult<bool> {
        let mut set_doc = doc! {};

        if let Some(name) = name {
            set_doc.insert("name", name);
        }
        if let Some(color) = color {
            set_doc.insert("color", color);
        }
        if let Some(is_archived) = is_archived {
            set_doc.insert("is_archived", is_archived);
        }

        if set_doc.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(workspace_id, doc! { "$set": set_doc })
            .await
    }

    pub async fn add_member(
        &self,
        workspace_id: ObjectId,
        user_id: ObjectId,
        role: Role,
        invited_by: Option<ObjectId>,
    ) -> DaoResult<WorkspaceMember> {
        let now = DateTime::now();
        let member = WorkspaceMember {
            id: None,
            workspace_id,
            user_id,
            role,
            invited_by,
            joined_at: now,
            created_at: now,
            updated_at: now,
        };

        let id = self.members.insert_one(&member).await?;
        self.members.find_by_id(id).await
    }

    pub async fn membership(
        &self,
        workspace_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<WorkspaceMember>> {
        self.members
            .find_one(doc! { "workspace_id": workspace_id, "user_id": user_id })
            .await
    }

    /// Resolves the caller's role in a workspace: the membership row if one
    /// exists, otherwise an impersonated admin role for platform admins.
    pub async fn resolve_role(
        &self,
        workspace_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<ResolvedRole>> {
        if let Some(member) = self.membership(workspace_id, user_id).await? {
            return Ok(Some(ResolvedRole {
                role: member.role,
                impersonated: false,
            }));
        }

        let user = self
            .users
            .find_one(doc! { "_id": user_id, "deleted_at": null })
            .await?;
        if user.is_some_and(|u| u.is_platform_admin) {
            return Ok(Some(ResolvedRole {
                role: Role::Admin,
                impersonated: true,
            }));
        }

        Ok(None)
    }

    pub async fn list_members(&self, workspace_id: ObjectId) -> DaoResult<Vec<WorkspaceMember>> {
        self.members
            .find_many(
                doc! { "workspace_id": workspace_id },
                Some(doc! { "joined_at": 1 }),
            )
            .await
    }

    pub async fn find_member_by_id(&self, member_id: ObjectId) -> DaoResult<WorkspaceMember> {
        self.members.find_by_id(member_id).await
    }

    pub async fn count_owners(&self, workspace_id: ObjectId) -> DaoResult<u64> {
        self.members
            .count(doc! { "workspace_id": workspace_id, "role": Role::Owner.as_str() })
            .await
    }

    /// Changes a member's role. Demoting the last owner is refused.
    pub async fn change_role(
        &self,
        member: &WorkspaceMember,
        new_role: Role,
    ) -> DaoResult<bool> {
        if member.role == Role::Owner
            && new_role < Role::Owner
            && self.count_owners(member.workspace_id).await? <= 1
        {
            return Err(DaoError::Conflict(
                "workspace must keep at least one owner".to_string(),
            ));
        }

        self.members
            .update_by_id(
                member.id.expect("member loaded from db"),
                doc! { "$set": { "role": new_role.as_str() } },
            )
            .await
    }

    /// Removes a membership. Removing the last owner is refused.
    pub async fn remove_member(&self, member: &WorkspaceMember) -> DaoResult<()> {
        if member.role == Role::Owner
            && self.count_owners(member.workspace_id).await? <= 1
        {
            return Err(DaoError::Conflict(
                "workspace must keep at least one owner".to_string(),
            ));
        }

        self.members
            .hard_delete(doc! { "_id": member.id.expect("member loaded from db") })
            .await?;
        Ok(())
    }
}
