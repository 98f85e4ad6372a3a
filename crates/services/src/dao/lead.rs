use bson::{DateTime, doc, oid::ObjectId};
use chrono::{Duration, Utc};
use leadflow_db::models::{Activity, Lead, LeadSource, Pipeline, Stage};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};

/// A transitioned lead must not duplicate an unarchived lead created in the
/// target pipeline within this window (matched on email or phone).
const DEDUP_WINDOW_DAYS: i64 = 30;
/// Activities older than this are not carried over on transition.
const ACTIVITY_COPY_WINDOW_DAYS: i64 = 30;

/// Identity fields shared by every lead-creation path.
#[derive(Debug, Clone, Default)]
pub struct LeadDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub value: Option<f64>,
    pub owner_id: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub target_pipeline_id: ObjectId,
    pub target_stage_id: Option<ObjectId>,
    pub copy_activities: bool,
    pub archive_source: bool,
}

#[derive(Debug)]
pub struct TransitionOutcome {
    pub lead: Lead,
    pub copied_activities: u64,
    pub archived_source: bool,
}

pub struct LeadDao {
    pub base: BaseDao<Lead>,
    activities: BaseDao<Activity>,
    pipelines: BaseDao<Pipeline>,
    stages: BaseDao<Stage>,
}

impl LeadDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Lead::COLLECTION),
            activities: BaseDao::new(db, Activity::COLLECTION),
            pipelines: BaseDao::new(db, Pipeline::COLLECTION),
            stages: BaseDao::new(db, Stage::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        workspace_id: ObjectId,
        pipeline_id: ObjectId,
        stage_id: ObjectId,
        draft: LeadDraft,
        source: LeadSource,
        transitioned_from: Option<ObjectId>,
    ) -> DaoResult<Lead> {
        let now = DateTime::now();
        let lead = Lead {
            id: None,
            workspace_id,
            pipeline_id,
            stage_id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            company: draft.company,
            value: draft.value,
            source,
            owner_id: draft.owner_id,
            is_archived: false,
            transitioned_from,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&lead).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_pipeline(
        &self,
        pipeline_id: ObjectId,
        stage_id: Option<ObjectId>,
        include_archived: bool,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Lead>> {
        let mut filter = doc! { "pipeline_id": pipeline_id };
        if let Some(stage_id) = stage_id {
            filter.insert("stage_id", stage_id);
        }
        if !include_archived {
            filter.insert("is_archived", false);
        }

        self.base
            .find_paginated(filter, Some(doc! { "created_at": -1 }), params)
            .await
    }

    pub async fn update_fields(
        &self,
        workspace_id: ObjectId,
        lead_id: ObjectId,
        draft: LeadDraft,
    ) -> DaoResult<bool> {
        let mut set_doc = doc! {};
        if !draft.name.is_empty() {
            set_doc.insert("name", draft.name);
        }
        if let Some(email) = draft.email {
            set_doc.insert("email", email);
        }
        if let Some(phone) = draft.phone {
            set_doc.insert("phone", phone);
        }
        if let Some(company) = draft.company {
            set_doc.insert("company", company);
        }
        if let Some(value) = draft.value {
            set_doc.insert("value", value);
        }
        if let Some(owner_id) = draft.owner_id {
            set_doc.insert("owner_id", owner_id);
        }

        if set_doc.is_empty() {
            return Ok(false);
        }

        self.base
            .update_one(
                doc! { "_id": lead_id, "workspace_id": workspace_id },
                doc! { "$set": set_doc },
            )
            .await
    }

    pub async fn set_archived(&self, lead_id: ObjectId, archived: bool) -> DaoResult<bool> {
        self.base
            .update_by_id(lead_id, doc! { "$set": { "is_archived": archived } })
            .await
    }

    /// Moves a lead to another stage of its own pipeline and returns the
    /// destination stage (whose `auto_move`, if any, the caller acts on).
    pub async fn move_stage(&self, lead: &Lead, stage_id: ObjectId) -> DaoResult<Stage> {
        let stage = self
            .stages
            .find_one(doc! { "_id": stage_id, "pipeline_id": lead.pipeline_id })
            .await?
            .ok_or_else(|| {
                DaoError::Validation("stage does not belong to the lead's pipeline".to_string())
            })?;

        self.base
            .update_by_id(
                lead.id.expect("lead loaded from db"),
                doc! { "$set": { "stage_id": stage_id } },
            )
            .await?;

        Ok(stage)
    }

    /// An unarchived lead created in the pipeline within the dedup window
    /// that matches any of the given contact fields.
    pub async fn find_recent_duplicate(
        &self,
        pipeline_id: ObjectId,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> DaoResult<Option<Lead>> {
        let mut contact = Vec::new();
        if let Some(email) = email {
            contact.push(doc! { "email": email });
        }
        if let Some(phone) = phone {
            contact.push(doc! { "phone": phone });
        }
        if contact.is_empty() {
            return Ok(None);
        }

        let since = DateTime::from_chrono(Utc::now() - Duration::days(DEDUP_WINDOW_DAYS));
        self.base
            .find_one(doc! {
                "pipeline_id": pipeline_id,
                "is_archived": false,
                "created_at": { "$gte": since },
                "$or": contact,
            })
            .await
    }

    /// Moves a lead across pipelines: a new lead is created in the target
    /// pipeline from the source's identity fields, recent activities are
    /// optionally carried over, and the source is optionally archived. The
    /// archive step is a separate write; a failure there leaves the new lead
    /// in place.
    pub async fn transition(
        &self,
        source: &Lead,
        req: TransitionRequest,
    ) -> DaoResult<TransitionOutcome> {
        let source_id = source.id.expect("lead loaded from db");

        if source.is_archived {
            return Err(DaoError::NotFound);
        }
        if source.pipeline_id == req.target_pipeline_id {
            return Err(DaoError::Validation(
                "lead is already in this pipeline".to_string(),
            ));
        }

        let target = self
            .pipelines
            .find_one(doc! {
                "_id": req.target_pipeline_id,
                "workspace_id": source.workspace_id,
                "is_archived": false,
                "deleted_at": null,
            })
            .await?
            .ok_or(DaoError::NotFound)?;
        let target_id = target.id.expect("pipeline loaded from db");

        let stages = self
            .stages
            .find_many(
                doc! { "pipeline_id": target_id },
                Some(doc! { "position": 1 }),
            )
            .await?;
        if stages.is_empty() {
            return Err(DaoError::Validation(
                "target pipeline has no stages".to_string(),
            ));
        }

        // Explicit target stage when it belongs to the pipeline, else the
        // first stage by position
        let destination = req
            .target_stage_id
            .and_then(|wanted| stages.iter().find(|s| s.id == Some(wanted)))
            .unwrap_or(&stages[0]);

        if let Some(duplicate) = self
            .find_recent_duplicate(target_id, source.email.as_deref(), source.phone.as_deref())
            .await?
        {
            return Err(DaoError::Conflict(format!(
                "duplicate lead {} in target pipeline",
                duplicate.id.expect("lead loaded from db").to_hex()
            )));
        }

        let lead = self
            .create(
                source.workspace_id,
                target_id,
                destination.id.expect("stage loaded from db"),
                LeadDraft {
                    name: source.name.clone(),
                    email: source.email.clone(),
                    phone: source.phone.clone(),
                    company: source.company.clone(),
                    value: source.value,
                    owner_id: source.owner_id,
                },
                LeadSource::Transition,
                Some(source_id),
            )
            .await?;
        let lead_id = lead.id.expect("lead loaded from db");

        let mut copied_activities = 0;
        if req.copy_activities {
            let since =
                DateTime::from_chrono(Utc::now() - Duration::days(ACTIVITY_COPY_WINDOW_DAYS));
            let recent = self
                .activities
                .find_many(
                    doc! { "lead_id": source_id, "created_at": { "$gte": since } },
                    Some(doc! { "created_at": 1 }),
                )
                .await?;

            let now = DateTime::now();
            for activity in recent {
                let copy = Activity {
                    id: None,
                    workspace_id: activity.workspace_id,
                    lead_id,
                    author_id: activity.author_id,
                    kind: activity.kind,
                    body: activity.body,
                    due_at: activity.due_at,
                    completed_at: activity.completed_at,
                    reminded_at: activity.reminded_at,
                    copied_from: activity.id,
                    created_at: now,
                    updated_at: now,
                };
                self.activities.insert_one(&copy).await?;
                copied_activities += 1;
            }
        }

        let mut archived_source = false;
        if req.archive_source {
            self.set_archived(source_id, true).await?;
            archived_source = true;
        }

        Ok(TransitionOutcome {
            lead,
            copied_activities,
            archived_source,
        })
    }
}
