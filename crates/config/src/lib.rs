mod settings;

pub use settings::{
    AppSettings, DatabaseSettings, InviteSettings, JwtSettings, Settings, SmtpSettings,
};
