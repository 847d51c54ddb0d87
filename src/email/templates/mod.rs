//! Email template system
//!
//! Provides simple variable substitution for email templates.
//! Variables are specified using {{variable_name}} syntax.

use std::collections::HashMap;

/// Available email templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Cleaner invites a client to the platform
    Invitation,
    /// Reminder for a pending invitation
    InvitationReminder,
}

impl EmailTemplate {
    /// Get the subject line for this template
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Invitation => "{{cleaner_name}} invited you to book cleanings on {{app_name}}",
            Self::InvitationReminder => {
                "Reminder: {{cleaner_name}} is waiting for you on {{app_name}}"
            }
        }
    }

    /// Get the HTML body template
    pub fn html_body(&self) -> &'static str {
        match self {
            Self::Invitation => INVITATION_TEMPLATE,
            Self::InvitationReminder => INVITATION_REMINDER_TEMPLATE,
        }
    }

    /// Get the plain text body template
    pub fn text_body(&self) -> &'static str {
        match self {
            Self::Invitation => INVITATION_TEMPLATE_TEXT,
            Self::InvitationReminder => INVITATION_REMINDER_TEMPLATE_TEXT,
        }
    }
}

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Render a template string, replacing {{variable}} with values
    pub fn render(&self, template: &str) -> String {
        let mut result = template.to_string();

        for (key, value) in &self.variables {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }

        result
    }

    /// Render a complete email template
    pub fn render_template(&self, template: EmailTemplate) -> RenderedEmail {
        RenderedEmail {
            subject: self.render(template.subject()),
            html_body: self.render(template.html_body()),
            text_body: self.render(template.text_body()),
        }
    }
}

/// Rendered email with all variables substituted
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

// ============================================================================
// Email Templates
// ============================================================================

const INVITATION_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Invitation</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; }
        .header h1 { color: #0d9488; margin: 0; font-size: 24px; }
        .content { margin-bottom: 30px; }
        .button { display: inline-block; background-color: #0d9488; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .button:hover { background-color: #0f766e; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #0d9488; word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>You're Invited!</h1>
        </div>
        <div class="content">
            <p>Hi {{invited_name}},</p>
            <p><strong>{{cleaner_name}}</strong> cleans your home and would like to manage
            bookings and payments with you through <strong>{{app_name}}</strong>.</p>
            <p>Click the button below to accept the invitation and create your account:</p>
            <p style="text-align: center; margin: 30px 0;">
                <a href="{{invite_link}}" class="button">Accept Invitation</a>
            </p>
            <p style="font-size: 14px; color: #666;">
                Or copy and paste this link into your browser:<br>
                <a href="{{invite_link}}" class="link">{{invite_link}}</a>
            </p>
        </div>
        <div class="footer">
            <p>If you didn't expect this invitation, you can safely ignore this email.</p>
            <p>&copy; {{year}} {{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const INVITATION_TEMPLATE_TEXT: &str = r#"You're Invited!

Hi {{invited_name}},

{{cleaner_name}} cleans your home and would like to manage bookings and
payments with you through {{app_name}}.

Click the link below to accept the invitation and create your account:

{{invite_link}}

If you didn't expect this invitation, you can safely ignore this email.

(c) {{year}} {{app_name}}"#;

const INVITATION_REMINDER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Invitation Reminder</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; }
        .header h1 { color: #0d9488; margin: 0; font-size: 24px; }
        .content { margin-bottom: 30px; }
        .button { display: inline-block; background-color: #0d9488; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #0d9488; word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Still Interested?</h1>
        </div>
        <div class="content">
            <p>Hi {{invited_name}},</p>
            <p>Just a reminder that <strong>{{cleaner_name}}</strong> invited you to manage
            your cleanings through <strong>{{app_name}}</strong>. Your invitation is still
            waiting:</p>
            <p style="text-align: center; margin: 30px 0;">
                <a href="{{invite_link}}" class="button">Accept Invitation</a>
            </p>
            <p style="font-size: 14px; color: #666;">
                Or copy and paste this link into your browser:<br>
                <a href="{{invite_link}}" class="link">{{invite_link}}</a>
            </p>
        </div>
        <div class="footer">
            <p>If you didn't expect this invitation, you can safely ignore this email.</p>
            <p>&copy; {{year}} {{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const INVITATION_REMINDER_TEMPLATE_TEXT: &str = r#"Still Interested?

Hi {{invited_name}},

Just a reminder that {{cleaner_name}} invited you to manage your cleanings
through {{app_name}}. Your invitation is still waiting:

{{invite_link}}

If you didn't expect this invitation, you can safely ignore this email.

(c) {{year}} {{app_name}}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_variables() {
        let mut engine = TemplateEngine::new();
        engine.set("name", "Jane");

        assert_eq!(engine.render("Hello {{name}}!"), "Hello Jane!");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let engine = TemplateEngine::new();
        assert_eq!(engine.render("Hello {{name}}!"), "Hello {{name}}!");
    }

    #[test]
    fn test_render_invitation_template() {
        let mut engine = TemplateEngine::new();
        engine
            .set("invited_name", "Jane")
            .set("cleaner_name", "Maria Lopez")
            .set("invite_link", "https://app.tidyhome.example/invite/abc")
            .set("year", "2026")
            .set("app_name", "Tidyhome");

        let rendered = engine.render_template(EmailTemplate::Invitation);
        assert!(rendered.subject.contains("Maria Lopez"));
        assert!(rendered.html_body.contains("https://app.tidyhome.example/invite/abc"));
        assert!(rendered.text_body.contains("Maria Lopez"));
        assert!(!rendered.html_body.contains("{{"));
    }

    #[test]
    fn test_render_reminder_template() {
        let mut engine = TemplateEngine::new();
        engine
            .set("invited_name", "Jane")
            .set("cleaner_name", "Maria")
            .set("invite_link", "https://example.com/i/t")
            .set("year", "2026")
            .set("app_name", "Tidyhome");

        let rendered = engine.render_template(EmailTemplate::InvitationReminder);
        assert!(rendered.subject.starts_with("Reminder:"));
        assert!(rendered.text_body.contains("still waiting"));
    }
}
