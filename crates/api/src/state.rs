use leadflow_config::Settings;
use leadflow_services::{
    AuthService, Mailer,
    dao::{
        activity::ActivityDao, invite::InviteDao, lead::LeadDao, pipeline::PipelineDao,
        user::UserDao, workspace::WorkspaceDao,
    },
};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub mailer: Arc<Mailer>,
    pub users: Arc<UserDao>,
    pub workspaces: Arc<WorkspaceDao>,
    pub invites: Arc<InviteDao>,
    pub pipelines: Arc<PipelineDao>,
    pub leads: Arc<LeadDao>,
    pub activities: Arc<ActivityDao>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let mailer = Arc::new(Mailer::new(&settings));
        let users = Arc::new(UserDao::new(&db));
        let workspaces = Arc::new(WorkspaceDao::new(&db));
        let invites = Arc::new(InviteDao::new(&db));
        let pipelines = Arc::new(PipelineDao::new(&db));
        let leads = Arc::new(LeadDao::new(&db));
        let activities = Arc::new(ActivityDao::new(&db));

        Self {
            db,
            settings,
            auth,
            mailer,
            users,
            workspaces,
            invites,
            pipelines,
            leads,
            activities,
        }
    }
}
