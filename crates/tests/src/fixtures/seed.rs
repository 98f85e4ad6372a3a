use serde_json::Value;

use super::test_app::TestApp;

/// Result of seeding a test workspace with users and pipelines.
pub struct SeededWorkspace {
    pub workspace_id: String,
    pub slug: String,
    pub owner: SeededUser,
    pub member: SeededUser,
    pub pipelines: Vec<SeededPipeline>,
}

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SeededPipeline {
    pub id: String,
    pub name: String,
    pub stages: Vec<SeededStage>,
}

pub struct SeededStage {
    pub id: String,
    pub name: String,
}

impl TestApp {
    /// Register a user and return their auth info. Optionally creates their
    /// first workspace in the same call.
    pub async fn register_user(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
        workspace_name: Option<&str>,
        workspace_slug: Option<&str>,
    ) -> SeededUser {
        let mut body = serde_json::json!({
            "email": email,
            "display_name": display_name,
            "password": password,
        });

        if let (Some(wn), Some(ws)) = (workspace_name, workspace_slug) {
            body["workspace_name"] = serde_json::json!(wn);
            body["workspace_slug"] = serde_json::json!(ws);
        }

        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&body)
            .send()
            .await
            .expect("Register request failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse register response");
        assert_eq!(status, 201, "Register failed: {json}");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Login a user and return their auth info.
    pub async fn login_user(&self, email: &str, password: &str) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed");

        assert!(
            resp.status().is_success(),
            "Login failed: {}",
            resp.text().await.unwrap_or_default()
        );

        let json: Value = resp.json().await.expect("Failed to parse login response");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Create an authenticated request with the given token.
    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_patch(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    /// Invite an email into a workspace and return the invite token.
    pub async fn invite_user(
        &self,
        workspace_slug: &str,
        inviter_token: &str,
        email: &str,
        role: &str,
    ) -> String {
        let resp = self
            .auth_post(
                &format!("/api/workspaces/{}/invite", workspace_slug),
                inviter_token,
            )
            .json(&serde_json::json!({ "email": email, "role": role }))
            .send()
            .await
            .expect("Invite request failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse invite response");
        assert_eq!(status, 201, "Invite failed: {json}");

        json["token"].as_str().unwrap().to_string()
    }

    pub async fn accept_invite(&self, token: &str, invite_token: &str) {
        let resp = self
            .auth_post("/api/invites/accept", token)
            .json(&serde_json::json!({ "token": invite_token }))
            .send()
            .await
            .expect("Accept invite request failed");

        let status = resp.status().as_u16();
        assert_eq!(
            status,
            200,
            "Accept invite failed: {}",
            resp.text().await.unwrap_or_default()
        );
    }

    /// Create a pipeline through the API and return its parsed shape.
    pub async fn create_pipeline(
        &self,
        workspace_slug: &str,
        token: &str,
        name: &str,
        stages: &[&str],
    ) -> SeededPipeline {
        let resp = self
            .auth_post("/api/pipelines", token)
            .header("X-Workspace", workspace_slug)
            .json(&serde_json::json!({ "name": name, "stages": stages }))
            .send()
            .await
            .expect("Create pipeline failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse pipeline response");
        assert_eq!(status, 201, "Create pipeline '{name}' failed: {json}");

        parse_pipeline(&json)
    }

    /// Seed a full workspace: an owner, an invited member, and the two
    /// pipelines used across the suite ("Vendas" with Novo/Fechamento,
    /// "Pós-venda" with Onboarding).
    pub async fn seed_workspace(&self, slug: &str) -> SeededWorkspace {
        let workspace_name = format!("{} Corp", slug);

        let owner = self
            .register_user(
                &format!("owner@{}.test", slug),
                &format!("{} Owner", slug),
                "Owner123!",
                Some(&workspace_name),
                Some(slug),
            )
            .await;

        // Get workspace ID
        let resp = self
            .auth_get("/api/workspaces", &owner.access_token)
            .send()
            .await
            .expect("List workspaces failed");
        let workspaces: Vec<Value> = resp.json().await.unwrap();
        let workspace_id = workspaces
            .iter()
            .find(|w| w["slug"].as_str() == Some(slug))
            .expect("Workspace not found")["id"]
            .as_str()
            .unwrap()
            .to_string();

        // Register and invite a regular member
        let member = self
            .register_user(
                &format!("member@{}.test", slug),
                &format!("{} Member", slug),
                "Member123!",
                None,
                None,
            )
            .await;
        let invite_token = self
            .invite_user(slug, &owner.access_token, &member.email, "member")
            .await;
        self.accept_invite(&member.access_token, &invite_token).await;

        // Create pipelines
        let vendas = self
            .create_pipeline(slug, &owner.access_token, "Vendas", &["Novo", "Fechamento"])
            .await;
        let pos_venda = self
            .create_pipeline(slug, &owner.access_token, "Pós-venda", &["Onboarding"])
            .await;

        SeededWorkspace {
            workspace_id,
            slug: slug.to_string(),
            owner,
            member,
            pipelines: vec![vendas, pos_venda],
        }
    }
}

pub fn parse_pipeline(json: &Value) -> SeededPipeline {
    SeededPipeline {
        id: json["id"].as_str().unwrap().to_string(),
        name: json["name"].as_str().unwrap().to_string(),
        stages: json["stages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| SeededStage {
                id: s["id"].as_str().unwrap().to_string(),
                name: s["name"].as_str().unwrap().to_string(),
            })
            .collect(),
    }
}
