use askama::Template;

use super::{MailJob, MailKind};

#[derive(Template)]
#[template(path = "email_confirmation.html")]
struct ConfirmationTemplate<'a> {
    username: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "password_reset.html")]
struct PasswordResetTemplate<'a> {
    username: &'a str,
    link: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub fn render(job: &MailJob) -> Result<RenderedEmail, askama::Error> {
    let (subject, html) = match job.kind {
        MailKind::EmailConfirmation => (
            "Confirm your email",
            ConfirmationTemplate {
                username: &job.username,
                link: &job.link,
            }
            .render()?,
        ),
        MailKind::PasswordReset => (
            "Reset your password",
            PasswordResetTemplate {
                username: &job.username,
                link: &job.link,
            }
            .render()?,
        ),
    };

    Ok(RenderedEmail {
        to: job.to.clone(),
        subject: subject.to_string(),
        html,
    })
}
