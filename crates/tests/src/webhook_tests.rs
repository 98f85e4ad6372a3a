use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn webhook_config(app: &TestApp, pipeline_id: &str, token: &str) -> Value {
    app.auth_get(&format!("/api/pipelines/{}/webhook", pipeline_id), token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn webhook_creates_lead_in_first_stage_by_default() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let config = webhook_config(&app, &vendas.id, &ws.owner.access_token).await;
    let token = config["token"].as_str().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/pipelines/{}", vendas.id)))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "name": "Ana", "email": "ana@cliente.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["stage_id"], vendas.stages[0].id.as_str());
    assert_eq!(lead["source"], "webhook");
}

#[tokio::test]
async fn webhook_honors_configured_default_stage() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let resp = app
        .auth_patch(
            &format!("/api/pipelines/{}/webhook", vendas.id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "default_stage_id": vendas.stages[1].id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let config = webhook_config(&app, &vendas.id, &ws.owner.access_token).await;
    let token = config["token"].as_str().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/pipelines/{}", vendas.id)))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "name": "Bruno" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["stage_id"], vendas.stages[1].id.as_str());
}

#[tokio::test]
async fn webhook_rejects_missing_or_wrong_token() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/pipelines/{}", vendas.id)))
        .json(&serde_json::json!({ "name": "Ana" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/pipelines/{}", vendas.id)))
        .header("Authorization", "Bearer not-the-token")
        .json(&serde_json::json!({ "name": "Ana" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn rotation_invalidates_the_previous_token() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let config = webhook_config(&app, &vendas.id, &ws.owner.access_token).await;
    let old_token = config["token"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/pipelines/{}/webhook/rotate", vendas.id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let rotated: Value = resp.json().await.unwrap();
    let new_token = rotated["token"].as_str().unwrap();
    assert_ne!(old_token, new_token);

    // Old token is dead
    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/pipelines/{}", vendas.id)))
        .header("Authorization", format!("Bearer {}", old_token))
        .json(&serde_json::json!({ "name": "Ana" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // New token works
    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/pipelines/{}", vendas.id)))
        .header("Authorization", format!("Bearer {}", new_token))
        .json(&serde_json::json!({ "name": "Ana" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn slug_addressed_webhook_works() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let config = webhook_config(&app, &vendas.id, &ws.owner.access_token).await;
    let token = config["token"].as_str().unwrap();
    let slug = config["slug"].as_str().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/in/{}", slug)))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "name": "Carla", "phone": "+55 11 91234-5678" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["pipeline_id"], vendas.id.as_str());
    assert_eq!(lead["phone"], "+55 11 91234-5678");
}

#[tokio::test]
async fn webhook_requires_a_name() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let config = webhook_config(&app, &vendas.id, &ws.owner.access_token).await;
    let token = config["token"].as_str().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/api/webhooks/pipelines/{}", vendas.id)))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "email": "anon@cliente.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn member_cannot_read_webhook_config() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let resp = app
        .auth_get(
            &format!("/api/pipelines/{}/webhook", vendas.id),
            &ws.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}
