pub mod activity;
pub mod comment;
pub mod invite;
pub mod lead;
pub mod password_reset;
pub mod pipeline;
pub mod stage;
pub mod user;
pub mod workspace;
pub mod workspace_member;

pub use activity::{Activity, ActivityKind};
pub use comment::Comment;
pub use invite::Invite;
pub use lead::{Lead, LeadSource};
pub use password_reset::PasswordReset;
pub use pipeline::Pipeline;
pub use stage::{AutoMove, Stage};
pub use user::User;
pub use workspace::Workspace;
pub use workspace_member::{Role, WorkspaceMember};
