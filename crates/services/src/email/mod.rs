use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use leadflow_config::Settings;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Message build error: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Transactional email sender. With no SMTP host configured, sends are
/// logged and dropped, which also keeps the test servers offline.
pub struct Mailer {
    smtp: Option<SmtpTransport>,
    public_url: String,
}

impl Mailer {
    pub fn new(settings: &Settings) -> Self {
        let smtp = if settings.smtp.host.is_empty() {
            info!("SMTP host not configured, outbound email disabled");
            None
        } else {
            match Self::build_transport(settings) {
                Ok(smtp) => Some(smtp),
                Err(err) => {
                    tracing::error!(%err, "Failed to build SMTP transport, outbound email disabled");
                    None
                }
            }
        };

        Self {
            smtp,
            public_url: settings.app.public_url.clone(),
        }
    }

    fn build_transport(settings: &Settings) -> Result<SmtpTransport, MailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp.host)?
                .port(settings.smtp.port);

        if !settings.smtp.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.smtp.username.clone(),
                settings.smtp.password.clone(),
            ));
        }

        Ok(SmtpTransport {
            transport: builder.build(),
            from: settings.smtp.from.parse()?,
        })
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), MailError> {
        let Some(smtp) = &self.smtp else {
            debug!(to, subject, "SMTP disabled, dropping email");
            return Ok(());
        };

        let message = Message::builder()
            .from(smtp.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        smtp.transport.send(message).await?;
        debug!(to, subject, "Email sent");
        Ok(())
    }

    pub async fn send_invite(
        &self,
        to: &str,
        workspace_name: &str,
        inviter_name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let link = format!("{}/invites/{}", self.public_url, token);
        self.send(
            to,
            &format!("You have been invited to {workspace_name}"),
            format!(
                "{inviter_name} invited you to join the {workspace_name} workspace.\n\n\
                 Accept the invitation: {link}\n\n\
                 The invitation expires in a few days; after that the inviter\n\
                 has to send a new one.\n"
            ),
        )
        .await
    }

    pub async fn send_workspace_welcome(
        &self,
        to: &str,
        workspace_name: &str,
    ) -> Result<(), MailError> {
        self.send(
            to,
            &format!("{workspace_name} is ready"),
            format!(
                "Your workspace {workspace_name} has been created.\n\n\
                 Set up your first pipeline and invite your team from the\n\
                 workspace settings.\n"
            ),
        )
        .await
    }

    pub async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), MailError> {
        let link = format!("{}/reset-password/{}", self.public_url, token);
        self.send(
            to,
            "Reset your password",
            format!(
                "A password reset was requested for this address.\n\n\
                 Choose a new password: {link}\n\n\
                 If you did not request this, you can ignore this email.\n"
            ),
        )
        .await
    }

    pub async fn send_task_reminder(
        &self,
        to: &str,
        lead_name: &str,
        task_body: &str,
    ) -> Result<(), MailError> {
        self.send(
            to,
            &format!("Task due for {lead_name}"),
            format!("A task on the lead {lead_name} is due:\n\n{task_body}\n"),
        )
        .await
    }
}
