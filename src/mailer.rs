use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, message::Mailbox,
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use tracing::info;

use crate::config::MailConfig;

/// Outbound email seam. Handlers only ever see this trait, so tests can
/// swap in a fake and the dev setup can run without an SMTP server.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig, host: &str) -> anyhow::Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(cfg.smtp_port);
        if let (Some(user), Some(pass)) = (&cfg.smtp_user, &cfg.smtp_pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: cfg.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;
        self.transport.send(message).await?;
        info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

/// Used when SMTP_HOST is unset: logs the email instead of sending it.
pub struct LogMailer {
    pub from: String,
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        info!(
            from = %self.from,
            to = %to,
            subject = %subject,
            body = %html,
            "SMTP not configured, logging email instead of sending"
        );
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &cfg.smtp_host {
        Some(host) => Ok(Arc::new(SmtpMailer::new(cfg, host)?)),
        None => Ok(Arc::new(LogMailer {
            from: cfg.from.clone(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config(host: Option<&str>) -> MailConfig {
        MailConfig {
            from: "no-reply@example.com".into(),
            smtp_host: host.map(Into::into),
            smtp_port: 587,
            smtp_user: None,
            smtp_pass: None,
        }
    }

    #[tokio::test]
    async fn log_mailer_accepts_any_message() {
        let mailer = from_config(&mail_config(None)).expect("log mailer");
        mailer
            .send("someone@example.com", "Confirm Account", "<p>OTP: 1234</p>")
            .await
            .expect("log mailer never fails");
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_bad_sender_address() {
        let mut cfg = mail_config(Some("smtp.example.com"));
        cfg.from = "not an address".into();
        assert!(SmtpMailer::new(&cfg, "smtp.example.com").is_err());
    }
}
