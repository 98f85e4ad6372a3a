use leadflow_api::{build_router, state::AppState};
use leadflow_config::Settings;
use leadflow_db::indexes::ensure_indexes;
use mongodb::{Client, Database, options::ClientOptions};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// A running test application with its own MongoDB database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017.
    /// Set LEADFLOW__DATABASE__URL env var to override the connection string.
    /// Each test gets a unique database name for isolation.
    pub async fn spawn() -> Self {
        let db_name = format!("leadflow_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().unwrap_or_else(|_| test_settings());
        // Allow env var override for database URL
        if let Ok(url) = std::env::var("LEADFLOW__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();
        // Keep test servers offline: no SMTP host means sends are dropped
        settings.smtp.host = String::new();

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let app_state = AppState::new(db.clone(), settings.clone());
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: leadflow_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: "http://localhost:3000".to_string(),
            cors_origins: vec![],
        },
        database: leadflow_config::DatabaseSettings {
            url: "mongodb://localhost:27017".to_string(),
            name: "leadflow_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        jwt: leadflow_config::JwtSettings {
            secret: "test-secret-key-for-jwt-signing-minimum-32-chars".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 604800,
            issuer: "leadflow".to_string(),
        },
        smtp: leadflow_config::SmtpSettings {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "Leadflow <no-reply@leadflow.local>".to_string(),
        },
        invite: leadflow_config::InviteSettings { ttl_days: 7 },
    }
}
