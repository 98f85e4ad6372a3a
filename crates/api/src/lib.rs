pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me))
        .route("/me", put(routes::auth::update_me))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    // Workspace routes (slug-addressed)
    let workspace_routes = Router::new()
        .route("/", get(routes::workspace::list).post(routes::workspace::create))
        .route(
            "/{workspace_slug}",
            get(routes::workspace::get).patch(routes::workspace::update),
        )
        .route("/{workspace_slug}/members", get(routes::member::list))
        .route("/{workspace_slug}/invite", post(routes::invite::create))
        .route("/{workspace_slug}/invites", get(routes::invite::list_pending));

    // Invite acceptance (token-addressed, email-matched)
    let invite_routes = Router::new()
        .route("/accept", post(routes::invite::accept))
        .route("/decline", post(routes::invite::decline));

    // Member routes (membership-addressed)
    let member_routes = Router::new().route(
        "/{member_id}",
        patch(routes::member::update).delete(routes::member::remove),
    );

    // Pipeline routes (workspace from query/header on the collection)
    let pipeline_routes = Router::new()
        .route("/", get(routes::pipeline::list).post(routes::pipeline::create))
        .route(
            "/{pipeline_id}",
            get(routes::pipeline::get).patch(routes::pipeline::update),
        )
        .route("/{pipeline_id}/duplicate", post(routes::pipeline::duplicate))
        .route(
            "/{pipeline_id}/webhook",
            get(routes::pipeline::get_webhook).patch(routes::pipeline::update_webhook),
        )
        .route(
            "/{pipeline_id}/webhook/rotate",
            post(routes::pipeline::rotate_webhook),
        )
        .route("/{pipeline_id}/stages", post(routes::pipeline::add_stage))
        .route(
            "/{pipeline_id}/leads",
            get(routes::lead::list_by_pipeline).post(routes::lead::create),
        );

    let stage_routes = Router::new().route("/{stage_id}", patch(routes::stage::update));

    // Lead routes
    let lead_routes = Router::new()
        .route("/{lead_id}", get(routes::lead::get).patch(routes::lead::update))
        .route("/{lead_id}/transition", post(routes::lead::transition))
        .route(
            "/{lead_id}/activities",
            get(routes::lead::list_activities).post(routes::lead::create_activity),
        );

    // Activity routes
    let activity_routes = Router::new()
        .route("/{activity_id}", patch(routes::activity::update))
        .route(
            "/{activity_id}/comments",
            get(routes::activity::list_comments).post(routes::activity::add_comment),
        );

    // Inbound webhooks (bearer token, no session)
    let webhook_routes = Router::new()
        .route("/pipelines/{pipeline_id}", post(routes::webhook::ingest_by_id))
        .route("/in/{slug}", post(routes::webhook::ingest_by_slug));

    // Externally triggered jobs
    let cron_routes = Router::new().route("/due", post(routes::cron::run_due_sweep));

    // Compose API
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/workspaces", workspace_routes)
        .nest("/invites", invite_routes)
        .nest("/members", member_routes)
        .nest("/pipelines", pipeline_routes)
        .nest("/stages", stage_routes)
        .nest("/leads", lead_routes)
        .nest("/activities", activity_routes)
        .nest("/webhooks", webhook_routes)
        .nest("/cron", cron_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
