//! SMTP email provider implementation using lettre

use super::provider::{EmailProvider, EmailProviderError};
use super::EmailMessage;
use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// SMTP-based email provider
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: Option<String>,
}

impl SmtpEmailProvider {
    /// Create a new SMTP provider from configuration
    pub fn from_config(config: &SmtpConfig) -> Result<Self, EmailProviderError> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let credentials = Credentials::new(username.clone(), password.clone());
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    fn build_mailbox(email: &str, name: Option<&str>) -> Result<Mailbox, EmailProviderError> {
        let raw = match name {
            Some(name) => format!("{} <{}>", name, email),
            None => email.to_string(),
        };

        raw.parse()
            .map_err(|e| EmailProviderError::InvalidMessage(format!("Invalid address: {}", e)))
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailProviderError> {
        let from = Self::build_mailbox(&self.from_email, self.from_name.as_deref())?;
        let to = Self::build_mailbox(&message.to.email, message.to.name.as_deref())?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject);

        // Multipart when a text alternative exists
        let email = if let Some(text_body) = &message.text_body {
            builder
                .multipart(
                    MultiPart::alternative()
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_PLAIN)
                                .body(text_body.clone()),
                        )
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_HTML)
                                .body(message.html_body.clone()),
                        ),
                )
                .map_err(|e| EmailProviderError::SendFailed(e.to_string()))?
        } else {
            builder
                .header(ContentType::TEXT_HTML)
                .body(message.html_body.clone())
                .map_err(|e| EmailProviderError::SendFailed(e.to_string()))?
        };

        match self.transport.send(email).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("connection") || error_msg.contains("timeout") {
                    Err(EmailProviderError::ConnectionError(error_msg))
                } else {
                    Err(EmailProviderError::SendFailed(error_msg))
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}
