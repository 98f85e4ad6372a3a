pub mod auth;
pub mod dao;
pub mod email;

pub use auth::AuthService;
pub use dao::*;
pub use email::Mailer;
