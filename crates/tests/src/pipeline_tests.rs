use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn create_pipeline_orders_stages_by_position() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let pipeline = app
        .create_pipeline(
            "acme",
            &ws.owner.access_token,
            "Outbound",
            &["Prospect", "Contacted", "Won"],
        )
        .await;

    assert_eq!(pipeline.stages.len(), 3);
    assert_eq!(pipeline.stages[0].name, "Prospect");
    assert_eq!(pipeline.stages[2].name, "Won");

    let json: Value = app
        .auth_get(
            &format!("/api/pipelines/{}", pipeline.id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let positions: Vec<u64> = json["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["position"].as_u64().unwrap())
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[tokio::test]
async fn create_pipeline_without_stages_is_rejected() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let resp = app
        .auth_post("/api/pipelines?workspace=acme", &ws.owner.access_token)
        .json(&serde_json::json!({ "name": "Empty", "stages": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn member_cannot_create_pipeline() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let resp = app
        .auth_post("/api/pipelines?workspace=acme", &ws.member.access_token)
        .json(&serde_json::json!({ "name": "Shadow", "stages": ["One"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn duplicate_copies_stages_but_not_leads() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    // Put a lead into the source pipeline
    let resp = app
        .auth_post(
            &format!("/api/pipelines/{}/leads", vendas.id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "name": "Ana", "email": "ana@cliente.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_post(
            &format!("/api/pipelines/{}/duplicate", vendas.id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let copy: Value = resp.json().await.unwrap();
    let copy_id = copy["id"].as_str().unwrap();

    let stage_names: Vec<&str> = copy["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(stage_names, vec!["Novo", "Fechamento"]);

    // Leads stay behind
    let leads: Value = app
        .auth_get(
            &format!("/api/pipelines/{}/leads", copy_id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(leads["total"].as_u64(), Some(0));

    // The copy got its own webhook credential
    let src_hook: Value = app
        .auth_get(
            &format!("/api/pipelines/{}/webhook", vendas.id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let copy_hook: Value = app
        .auth_get(
            &format!("/api/pipelines/{}/webhook", copy_id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_ne!(src_hook["token"], copy_hook["token"]);
    assert_ne!(src_hook["slug"], copy_hook["slug"]);
}

#[tokio::test]
async fn added_stage_gets_the_next_position() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let resp = app
        .auth_post(
            &format!("/api/pipelines/{}/stages", vendas.id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "name": "Ganhou", "color": "#4CAF50" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let stage: Value = resp.json().await.unwrap();
    assert_eq!(stage["position"].as_u64(), Some(2));
}

#[tokio::test]
async fn stage_reorder_keeps_positions_contiguous() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let pipeline = app
        .create_pipeline("acme", &ws.owner.access_token, "Flow", &["A", "B", "C"])
        .await;

    // Move C to the front
    let resp = app
        .auth_patch(
            &format!("/api/stages/{}", pipeline.stages[2].id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "position": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = app
        .auth_get(
            &format!("/api/pipelines/{}", pipeline.id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ordered: Vec<(&str, u64)> = json["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["name"].as_str().unwrap(), s["position"].as_u64().unwrap()))
        .collect();
    assert_eq!(ordered, vec![("C", 0), ("A", 1), ("B", 2)]);
}

#[tokio::test]
async fn archived_pipeline_rejects_new_leads() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;
    let vendas = &ws.pipelines[0];

    let resp = app
        .auth_patch(
            &format!("/api/pipelines/{}", vendas.id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "is_archived": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_post(
            &format!("/api/pipelines/{}/leads", vendas.id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "name": "Too late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
