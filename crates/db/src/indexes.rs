use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![index_unique(bson::doc! { "email": 1 })],
    )
    .await?;

    // Password resets
    create_indexes(
        db,
        "password_resets",
        vec![
            index_unique(bson::doc! { "token": 1 }),
            index(bson::doc! { "user_id": 1 }),
        ],
    )
    .await?;

    // Workspaces
    create_indexes(
        db,
        "workspaces",
        vec![
            index_unique(bson::doc! { "slug": 1 }),
            index(bson::doc! { "owner_id": 1 }),
        ],
    )
    .await?;

    // Workspace Members
    create_indexes(
        db,
        "workspace_members",
        vec![
            index_unique(bson::doc! { "workspace_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1 }),
        ],
    )
    .await?;

    // Invites
    create_indexes(
        db,
        "invites",
        vec![
            index_unique(bson::doc! { "token": 1 }),
            index(bson::doc! { "workspace_id": 1, "email": 1 }),
        ],
    )
    .await?;

    // Pipelines
    create_indexes(
        db,
        "pipelines",
        vec![
            index_unique(bson::doc! { "workspace_id": 1, "slug": 1 }),
            index_unique(bson::doc! { "webhook_slug": 1 }),
            index(bson::doc! { "workspace_id": 1, "position": 1 }),
        ],
    )
    .await?;

    // Stages (position contiguity is maintained by the application; reorders
    // shift neighbors in place, so no unique index on position)
    create_indexes(
        db,
        "stages",
        vec![
            index(bson::doc! { "pipeline_id": 1, "position": 1 }),
            index(bson::doc! { "workspace_id": 1 }),
        ],
    )
    .await?;

    // Leads
    create_indexes(
        db,
        "leads",
        vec![
            index(bson::doc! { "pipeline_id": 1, "stage_id": 1, "created_at": -1 }),
            index(bson::doc! { "workspace_id": 1, "is_archived": 1 }),
            index(bson::doc! { "pipeline_id": 1, "email": 1, "created_at": -1 }),
            index(bson::doc! { "pipeline_id": 1, "phone": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Activities
    create_indexes(
        db,
        "activities",
        vec![
            index(bson::doc! { "lead_id": 1, "created_at": -1 }),
            index(bson::doc! { "kind": 1, "due_at": 1, "completed_at": 1, "reminded_at": 1 }),
        ],
    )
    .await?;

    // Comments
    create_indexes(
        db,
        "comments",
        vec![
            index(bson::doc! { "activity_id": 1, "created_at": 1 }),
            index(bson::doc! { "mentions": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
