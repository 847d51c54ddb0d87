//! Notification fan-out (push + email)
//!
//! Delivery is best-effort everywhere: a failed send is logged and never
//! blocks the state transition that triggered it.

use crate::domain::ClientRelationship;
use crate::email::{EmailAddress, EmailMessage, EmailProvider, EmailTemplate, TemplateEngine};
use crate::push::{PushMessage, PushProvider};
use std::sync::Arc;

const APP_NAME: &str = "Tidyhome";

/// Composite dispatcher over the configured providers
pub struct NotificationService {
    email: Option<Arc<dyn EmailProvider>>,
    push: Option<Arc<dyn PushProvider>>,
    /// Base URL for links embedded in emails
    app_base_url: String,
}

impl NotificationService {
    pub fn new(
        email: Option<Arc<dyn EmailProvider>>,
        push: Option<Arc<dyn PushProvider>>,
        app_base_url: String,
    ) -> Self {
        Self {
            email,
            push,
            app_base_url,
        }
    }

    /// Deliver a push message; returns whether delivery was handed to the
    /// provider successfully
    pub async fn push_to_user(&self, message: PushMessage) -> bool {
        let Some(push) = &self.push else {
            tracing::debug!("Push not configured; dropping notification");
            return false;
        };

        match push.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send push notification: {}", e);
                false
            }
        }
    }

    /// Deliver an email; returns whether delivery was handed to the
    /// provider successfully
    pub async fn email_to(&self, message: EmailMessage) -> bool {
        let Some(email) = &self.email else {
            tracing::debug!("Email not configured; dropping message");
            return false;
        };

        match email.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send email: {}", e);
                false
            }
        }
    }

    /// The signup link embedded in invitation emails
    pub fn invite_link(&self, token: &str) -> String {
        format!(
            "{}/invite/{}",
            self.app_base_url.trim_end_matches('/'),
            token
        )
    }

    /// Send the invitation email for a freshly created invitation
    pub async fn send_invitation_email(
        &self,
        invite: &ClientRelationship,
        cleaner_name: &str,
    ) -> bool {
        let rendered = self
            .invite_template_engine(invite, cleaner_name)
            .render_template(EmailTemplate::Invitation);

        self.email_to(EmailMessage::from_rendered(
            EmailAddress::with_name(&invite.invited_email, &invite.invited_name),
            rendered,
        ))
        .await
    }

    /// Send the reminder email for a still-pending invitation
    pub async fn send_invitation_reminder(
        &self,
        invite: &ClientRelationship,
        cleaner_name: &str,
    ) -> bool {
        let rendered = self
            .invite_template_engine(invite, cleaner_name)
            .render_template(EmailTemplate::InvitationReminder);

        self.email_to(EmailMessage::from_rendered(
            EmailAddress::with_name(&invite.invited_email, &invite.invited_name),
            rendered,
        ))
        .await
    }

    fn invite_template_engine(
        &self,
        invite: &ClientRelationship,
        cleaner_name: &str,
    ) -> TemplateEngine {
        let mut engine = TemplateEngine::new();
        engine
            .set("invited_name", &invite.invited_name)
            .set("cleaner_name", cleaner_name)
            .set("invite_link", self.invite_link(&invite.invite_token))
            .set("year", chrono::Utc::now().format("%Y").to_string())
            .set("app_name", APP_NAME);
        engine
    }
}
