// https://docs.sendgrid.com/api-reference/mail-send/mail-send

pub mod models;

use reqwest::{header, Client, StatusCode};

use crate::models::{Address, Content, MailSendRequest, Personalization};

const DEFAULT_API_BASE: &str = "https://api.sendgrid.com";

#[derive(Debug, thiserror::Error)]
pub enum SendGridError {
    #[error("Request to SendGrid failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SendGrid returned an error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct SendGridOptions {
    pub api_key: String,
    pub from_email: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SendGridService {
    options: SendGridOptions,
    api_base: String,
    client: Client,
}

impl SendGridService {
    pub fn new(options: SendGridOptions) -> Self {
        Self {
            options,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different API host (sandbox or local stub).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the v3 mail-send payload for a single HTML message.
    pub fn build_request(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> MailSendRequest {
        MailSendRequest {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: recipient.to_string(),
                    name: None,
                }],
            }],
            from: Address {
                email: self.options.from_email.clone(),
                name: self.options.from_name.clone(),
            },
            subject: subject.to_string(),
            content: vec![Content {
                content_type: "text/html".to_string(),
                value: html_body.to_string(),
            }],
        }
    }

    pub async fn send_mail(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), SendGridError> {
        let url = format!("{}/v3/mail/send", self.api_base);
        let payload = self.build_request(recipient, subject, html_body);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.options.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendGridError::Api { status, body });
        }

        Ok(())
    }
}
