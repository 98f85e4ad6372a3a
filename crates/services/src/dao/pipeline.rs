use bson::{DateTime, doc, oid::ObjectId};
use leadflow_db::models::{AutoMove, Pipeline, Stage};
use mongodb::Database;
use nanoid::nanoid;

use super::base::{BaseDao, DaoError, DaoResult};

const SLUG_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
    'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

fn new_webhook_token() -> String {
    nanoid!(40)
}

fn new_webhook_slug() -> String {
    nanoid!(10, &SLUG_ALPHABET)
}

pub struct PipelineDao {
    pub base: BaseDao<Pipeline>,
    pub stages: BaseDao<Stage>,
}

impl PipelineDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Pipeline::COLLECTION),
            stages: BaseDao::new(db, Stage::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        workspace_id: ObjectId,
        name: String,
        slug: String,
        stage_names: Vec<String>,
    ) -> DaoResult<(Pipeline, Vec<Stage>)> {
        if stage_names.is_empty() {
            return Err(DaoError::Validation(
                "pipeline requires at least one stage".to_string(),
            ));
        }

        let position = self
            .base
            .count(doc! { "workspace_id": workspace_id, "deleted_at": null })
            .await? as u32;

        let now = DateTime::now();
        let pipeline = Pipeline {
            id: None,
            workspace_id,
            name,
            slug,
            position,
            webhook_token: new_webhook_token(),
            webhook_slug: new_webhook_slug(),
            webhook_default_stage_id: None,
            is_archived: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let pipeline_id = self.base.insert_one(&pipeline).await?;

        for (i, stage_name) in stage_names.into_iter().enumerate() {
            let stage = Stage {
                id: None,
                workspace_id,
                pipeline_id,
                name: stage_name,
                color: None,
                position: i as u32,
                auto_move: None,
                created_at: now,
                updated_at: now,
            };
            self.stages.insert_one(&stage).await?;
        }

        let pipeline = self.base.find_by_id(pipeline_id).await?;
        let stages = self.find_stages(pipeline_id).await?;
        Ok((pipeline, stages))
    }

    pub async fn find_by_workspace(&self, workspace_id: ObjectId) -> DaoResult<Vec<Pipeline>> {
        self.base
            .find_many(
                doc! { "workspace_id": workspace_id, "deleted_at": null },
                Some(doc! { "position": 1 }),
            )
            .await
    }

    pub async fn find_by_webhook_slug(&self, slug: &str) -> DaoResult<Pipeline> {
        self.base
            .find_one(doc! { "webhook_slug": slug, "is_archived": false, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn update(
        &self,
        workspace_id: ObjectId,
        pipeline_id: ObjectId,
        name: Option<String>,
        is_archived: Option<bool>,
    ) -> DaoResult<bool> {
        let mut set_doc = doc! {};

        if let Some(name) = name {
            set_doc.insert("name", name);
        }
        if let Some(is_archived) = is_archived {
            set_doc.insert("is_archived", is_archived);
        }

        if set_doc.is_empty() {
            return Ok(false);
        }

        self.base
            .update_one(
                doc! { "_id": pipeline_id, "workspace_id": workspace_id },
                doc! { "$set": set_doc },
            )
            .await
    }

    /// Copies a pipeline and its stages (never its leads) under a fresh name,
    /// slug and webhook credential.
    pub async fn duplicate(&self, source: &Pipeline) -> DaoResult<(Pipeline, Vec<Stage>)> {
        let source_id = source.id.expect("pipeline loaded from db");
        let position = self
            .base
            .count(doc! { "workspace_id": source.workspace_id, "deleted_at": null })
            .await? as u32;

        let now = DateTime::now();
        let copy = Pipeline {
            id: None,
            workspace_id: source.workspace_id,
            name: format!("{} (copy)", source.name),
            slug: format!("{}-copy-{}", source.slug, nanoid!(6, &SLUG_ALPHABET)),
            position,
            webhook_token: new_webhook_token(),
            webhook_slug: new_webhook_slug(),
            webhook_default_stage_id: None,
            is_archived: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let copy_id = self.base.insert_one(&copy).await?;

        let mut default_stage_id = None;
        for stage in self.find_stages(source_id).await? {
            let copied = Stage {
                id: None,
                workspace_id: stage.workspace_id,
                pipeline_id: copy_id,
                name: stage.name,
                color: stage.color,
                position: stage.position,
                auto_move: stage.auto_move,
                created_at: now,
                updated_at: now,
            };
            let copied_id = self.stages.insert_one(&copied).await?;
            if source.webhook_default_stage_id == stage.id {
                default_stage_id = Some(copied_id);
            }
        }

        if let Some(stage_id) = default_stage_id {
            self.base
                .update_by_id(
                    copy_id,
                    doc! { "$set": { "webhook_default_stage_id": stage_id } },
                )
                .await?;
        }

        let pipeline = self.base.find_by_id(copy_id).await?;
        let stages = self.find_stages(copy_id).await?;
        Ok((pipeline, stages))
    }

    pub async fn find_stages(&self, pipeline_id: ObjectId) -> DaoResult<Vec<Stage>> {
        self.stages
            .find_many(
                doc! { "pipeline_id": pipeline_id },
                Some(doc! { "position": 1 }),
            )
            .await
    }

    pub async fn add_stage(
        &self,
        pipeline: &Pipeline,
        name: String,
        color: Option<String>,
    ) -> DaoResult<Stage> {
        let pipeline_id = pipeline.id.expect("pipeline loaded from db");
        let position = self.stages.count(doc! { "pipeline_id": pipeline_id }).await? as u32;

        let now = DateTime::now();
        let stage = Stage {
            id: None,
            workspace_id: pipeline.workspace_id,
            pipeline_id,
            name,
            color,
            position,
            auto_move: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.stages.insert_one(&stage).await?;
        self.stages.find_by_id(id).await
    }

    /// Updates a stage. A position change shifts the stages in between so
    /// positions stay contiguous.
    pub async fn update_stage(
        &self,
        stage: &Stage,
        name: Option<String>,
        color: Option<String>,
        position: Option<u32>,
        auto_move: Option<Option<AutoMove>>,
    ) -> DaoResult<Stage> {
        let stage_id = stage.id.expect("stage loaded from db");

        if let Some(new_pos) = position {
            let count = self.stages.count(doc! { "pipeline_id": stage.pipeline_id }).await? as u32;
            let new_pos = new_pos.min(count.saturating_sub(1));
            let old_pos = stage.position;

            if new_pos < old_pos {
                self.stages
                    .collection()
                    .update_many(
                        doc! {
                            "pipeline_id": stage.pipeline_id,
                            "position": { "$gte": new_pos, "$lt": old_pos },
                        },
                        doc! { "$inc": { "position": 1 } },
                    )
                    .await?;
            } else if new_pos > old_pos {
                self.stages
                    .collection()
                    .update_many(
                        doc! {
                            "pipeline_id": stage.pipeline_id,
                            "position": { "$gt": old_pos, "$lte": new_pos },
                        },
                        doc! { "$inc": { "position": -1 } },
                    )
                    .await?;
            }

            self.stages
                .update_by_id(stage_id, doc! { "$set": { "position": new_pos } })
                .await?;
        }

        let mut set_doc = doc! {};
        if let Some(name) = name {
            set_doc.insert("name", name);
        }
        if let Some(color) = color {
            set_doc.insert("color", color);
        }
        match auto_move {
            Some(Some(auto_move)) => {
                set_doc.insert("auto_move", bson::to_bson(&auto_move)?);
            }
            Some(None) => {
                set_doc.insert("auto_move", bson::Bson::Null);
            }
            None => {}
        }

        if !set_doc.is_empty() {
            self.stages
                .update_by_id(stage_id, doc! { "$set": set_doc })
                .await?;
        }

        self.stages.find_by_id(stage_id).await
    }

    /// Writes a fresh webhook token; the previous one stops working at once.
    pub async fn rotate_webhook_token(&self, pipeline_id: ObjectId) -> DaoResult<String> {
        let token = new_webhook_token();
        self.base
            .update_by_id(
                pipeline_id,
                doc! { "$set": { "webhook_token": &token } },
            )
            .await?;
        Ok(token)
    }

    pub async fn update_webhook(
        &self,
        pipeline_id: ObjectId,
        slug: Option<String>,
        default_stage_id: Option<ObjectId>,
    ) -> DaoResult<bool> {
        let mut set_doc = doc! {};

        if let Some(slug) = slug {
            set_doc.insert("webhook_slug", slug);
        }
        if let Some(stage_id) = default_stage_id {
            let belongs = self
                .stages
                .count(doc! { "_id": stage_id, "pipeline_id": pipeline_id })
                .await?
                > 0;
            if !belongs {
                return Err(DaoError::Validation(
                    "default stage does not belong to this pipeline".to_string(),
                ));
            }
            set_doc.insert("webhook_default_stage_id", stage_id);
        }

        if set_doc.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(pipeline_id, doc! { "$set": set_doc })
            .await
    }
}
