//! Email service for job summaries and announcements

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Report the outcome of a bulk generation job
    pub async fn send_job_summary(&self, to: &str, job: &str, created: usize, skipped: usize) -> AppResult<()> {
        let subject = format!("Library catalog: {} finished", job);
        self.send_email(to, &subject, &summary_body(job, created, skipped))
            .await
    }

    /// Plain notification to a single recipient
    pub async fn send_notification(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        self.send_email(to, subject, body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Library Catalog");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body(body)),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        mailer_builder
            .build()
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::debug!("Sent \"{}\" to {}", subject, to);
        Ok(())
    }
}

fn summary_body(job: &str, created: usize, skipped: usize) -> String {
    format!(
        "The {} job has finished.\n\nCreated: {}\nSkipped: {}\n",
        job, created, skipped
    )
}

fn html_body(body: &str) -> String {
    let escaped = body
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', "<br>");
    format!("<html><body><pre>{}</pre></body></html>", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let body = summary_body("create_random_genres", 4, 1);
        assert!(body.contains("create_random_genres"));
        assert!(body.contains("Created: 4"));
        assert!(body.contains("Skipped: 1"));
    }

    #[test]
    fn test_html_body_escapes_markup() {
        assert_eq!(
            html_body("a < b\nc"),
            "<html><body><pre>a &lt; b<br>c</pre></body></html>"
        );
    }
}
