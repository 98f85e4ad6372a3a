use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn member_id_of(app: &TestApp, slug: &str, owner_token: &str, user_id: &str) -> String {
    let members: Vec<Value> = app
        .auth_get(&format!("/api/workspaces/{}/members", slug), owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    members
        .iter()
        .find(|m| m["user_id"].as_str() == Some(user_id))
        .expect("membership not found")["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn member_cannot_remove_another_membership() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let owner_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.owner.id).await;

    let resp = app
        .auth_delete(
            &format!("/api/members/{}", owner_member_id),
            &ws.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn sole_owner_cannot_be_removed() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let owner_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.owner.id).await;

    // Even the owner themselves cannot leave a workspace ownerless
    let resp = app
        .auth_delete(
            &format!("/api/members/{}", owner_member_id),
            &ws.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn sole_owner_cannot_be_demoted() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let owner_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.owner.id).await;

    let resp = app
        .auth_patch(
            &format!("/api/members/{}", owner_member_id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "role": "member" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn ownership_transfer_then_demotion_works() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let member_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.member.id).await;
    let owner_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.owner.id).await;

    // Promote the member to a second owner
    let resp = app
        .auth_patch(
            &format!("/api/members/{}", member_member_id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "role": "owner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // With two owners, the original one can now step down
    let resp = app
        .auth_patch(
            &format!("/api/members/{}", owner_member_id),
            &ws.owner.access_token,
        )
        .json(&serde_json::json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["role"], "admin");
}

#[tokio::test]
async fn admin_cannot_grant_or_revoke_ownership() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    // Bring in an admin
    let admin = app
        .register_user("admin@acme.test", "Admin", "Adm1nSecret!", None, None)
        .await;
    let token = app
        .invite_user("acme", &ws.owner.access_token, &admin.email, "admin")
        .await;
    app.accept_invite(&admin.access_token, &token).await;

    let member_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.member.id).await;
    let owner_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.owner.id).await;

    // Admin cannot promote someone to owner
    let resp = app
        .auth_patch(
            &format!("/api/members/{}", member_member_id),
            &admin.access_token,
        )
        .json(&serde_json::json!({ "role": "owner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Nor remove the owner
    let resp = app
        .auth_delete(
            &format!("/api/members/{}", owner_member_id),
            &admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn member_can_leave_on_their_own() {
    let app = TestApp::spawn().await;
    let ws = app.seed_workspace("acme").await;

    let member_member_id =
        member_id_of(&app, "acme", &ws.owner.access_token, &ws.member.id).await;

    let resp = app
        .auth_delete(
            &format!("/api/members/{}", member_member_id),
            &ws.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let members: Vec<Value> = app
        .auth_get("/api/workspaces/acme/members", &ws.owner.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
}
