use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn create_workspace_makes_creator_the_owner() {
    let app = TestApp::spawn().await;

    let user = app
        .register_user("ana@acme.test", "Ana", "Sup3rSecret!", None, None)
        .await;

    let resp = app
        .auth_post("/api/workspaces", &user.access_token)
        .json(&serde_json::json!({ "name": "Acme Corp", "slug": "acme" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let members: Vec<Value> = app
        .auth_get("/api/workspaces/acme/members", &user.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["role"], "owner");
    assert_eq!(members[0]["user_id"], user.id.as_str());
}

#[tokio::test]
async fn duplicate_workspace_slug_conflicts() {
    let app = TestApp::spawn().await;

    let user = app
        .register_user("ana@acme.test", "Ana", "Sup3rSecret!", Some("Acme"), Some("acme"))
        .await;

    let resp = app
        .auth_post("/api/workspaces", &user.access_token)
        .json(&serde_json::json!({ "name": "Acme Again", "slug": "acme" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn rename_requires_admin() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    // A plain member cannot rename
    let resp = app
        .auth_patch("/api/workspaces/acme", &ws.member.access_token)
        .json(&serde_json::json!({ "name": "Evil Corp" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // The owner can rename and recolor
    let resp = app
        .auth_patch("/api/workspaces/acme", &ws.owner.access_token)
        .json(&serde_json::json!({ "name": "Acme Intl", "color": "#E91E63" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["name"], "Acme Intl");
    assert_eq!(json["color"], "#E91E63");
}

#[tokio::test]
async fn pipeline_collection_requires_a_workspace() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    // No workspace named at all
    let resp = app
        .auth_get("/api/pipelines", &ws.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // A workspace that does not exist
    let resp = app
        .auth_get("/api/pipelines?workspace=nope", &ws.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Named via query parameter
    let resp = app
        .auth_get("/api/pipelines?workspace=acme", &ws.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // Named via header
    let resp = app
        .auth_get("/api/pipelines", &ws.owner.access_token)
        .header("X-Workspace", "acme")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn archived_workspace_is_not_found() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let resp = app
        .auth_patch("/api/workspaces/acme", &ws.owner.access_token)
        .json(&serde_json::json!({ "is_archived": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get("/api/pipelines?workspace=acme", &ws.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
