//! Email service for inquiry notifications

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::ContactInquiry,
};

/// A plain-text message ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Outbound mail transport
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// SMTP transport built from [`EmailConfig`]
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.config.smtp_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Upstream(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };
        Ok(builder.build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Folio");
        let from = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;
        let to = Mailbox::from_str(&email.to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let mut builder = Message::builder().from(from).to(to).subject(email.subject);
        if let Some(reply_to) = &email.reply_to {
            let reply_to = Mailbox::from_str(reply_to)
                .map_err(|e| AppError::BadRequest(format!("Invalid reply-to address: {}", e)))?;
            builder = builder.reply_to(reply_to);
        }
        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport()?
            .send(message)
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    notify_to: Option<String>,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, notify_to: Option<String>) -> Self {
        Self { mailer, notify_to }
    }

    /// Tell the site owner about a new inquiry. No-op without a recipient.
    pub async fn notify_new_inquiry(&self, inquiry: &ContactInquiry) -> AppResult<()> {
        let Some(to) = &self.notify_to else {
            tracing::debug!(inquiry_id = %inquiry.id, "No notification recipient configured");
            return Ok(());
        };
        self.mailer.send(inquiry_notification(to, inquiry)).await
    }
}

fn inquiry_notification(to: &str, inquiry: &ContactInquiry) -> OutgoingEmail {
    let body = format!(
        r#"New contact form submission

Name:    {name}
Email:   {email}
Phone:   {phone}
Service: {service}

Message:
{message}

Submitted: {created_at}
Source:    {referrer}
IP:        {ip}
Inquiry:   {id}
"#,
        name = inquiry.name,
        email = inquiry.email,
        phone = inquiry.phone,
        service = inquiry.service.as_deref().unwrap_or("Not specified"),
        message = inquiry.message.as_deref().unwrap_or("(no message)"),
        created_at = inquiry.created_at.to_rfc3339(),
        referrer = inquiry.referrer,
        ip = inquiry.ip_address,
        id = inquiry.id,
    );

    OutgoingEmail {
        to: to.to_string(),
        reply_to: Some(inquiry.email.clone()),
        subject: format!("New inquiry from {}", inquiry.name),
        body,
    }
}
