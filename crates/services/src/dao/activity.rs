use bson::{DateTime, doc, oid::ObjectId};
use leadflow_db::models::{Activity, ActivityKind, Comment};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ActivityDao {
    pub base: BaseDao<Activity>,
    pub comments: BaseDao<Comment>,
}

impl ActivityDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Activity::COLLECTION),
            comments: BaseDao::new(db, Comment::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        workspace_id: ObjectId,
        lead_id: ObjectId,
        author_id: ObjectId,
        kind: ActivityKind,
        body: String,
        due_at: Option<DateTime>,
    ) -> DaoResult<Activity> {
        if kind == ActivityKind::Task && due_at.is_none() {
            return Err(DaoError::Validation(
                "a task requires a due date".to_string(),
            ));
        }

        let now = DateTime::now();
        let activity = Activity {
            id: None,
            workspace_id,
            lead_id,
            author_id,
            kind,
            body,
            due_at,
            completed_at: None,
            reminded_at: None,
            copied_from: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&activity).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_lead(&self, lead_id: ObjectId) -> DaoResult<Vec<Activity>> {
        self.base
            .find_many(
                doc! { "lead_id": lead_id },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }

    /// Edits the body and/or flips task completion.
    pub async fn update(
        &self,
        activity_id: ObjectId,
        body: Option<String>,
        completed: Option<bool>,
    ) -> DaoResult<bool> {
        let mut set_doc = doc! {};

        if let Some(body) = body {
            set_doc.insert("body", body);
        }
        match completed {
            Some(true) => {
                set_doc.insert("completed_at", DateTime::now());
            }
            Some(false) => {
                set_doc.insert("completed_at", bson::Bson::Null);
            }
            None => {}
        }

        if set_doc.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(activity_id, doc! { "$set": set_doc })
            .await
    }

    pub async fn add_comment(
        &self,
        activity: &Activity,
        author_id: ObjectId,
        body: String,
        mentions: Vec<ObjectId>,
    ) -> DaoResult<Comment> {
        let now = DateTime::now();
        let comment = Comment {
            id: None,
            workspace_id: activity.workspace_id,
            activity_id: activity.id.expect("activity loaded from db"),
            author_id,
            body,
            mentions,
            created_at: now,
            updated_at: now,
        };

        let id = self.comments.insert_one(&comment).await?;
        self.comments.find_by_id(id).await
    }

    pub async fn find_comments(&self, activity_id: ObjectId) -> DaoResult<Vec<Comment>> {
        self.comments
            .find_many(
                doc! { "activity_id": activity_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    /// Uncompleted tasks that are due and have not been reminded yet.
    pub async fn find_due_tasks(&self) -> DaoResult<Vec<Activity>> {
        self.base
            .find_many(
                doc! {
                    "kind": "task",
                    "due_at": { "$lte": DateTime::now() },
                    "completed_at": null,
                    "reminded_at": null,
                },
                Some(doc! { "due_at": 1 }),
            )
            .await
    }

    pub async fn mark_reminded(&self, activity_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(
                activity_id,
                doc! { "$set": { "reminded_at": DateTime::now() } },
            )
            .await
    }
}
