use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::templates::RenderedEmail;
use crate::config::{MailConfig, MailTransportKind};

#[async_trait]
pub trait EmailTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, email: &RenderedEmail) -> Result<()>;
}

pub fn build_transport(cfg: &MailConfig) -> Result<Arc<dyn EmailTransport>> {
    match cfg.transport {
        MailTransportKind::Log => Ok(Arc::new(LogTransport)),
        MailTransportKind::Http => {
            let endpoint = cfg
                .endpoint
                .clone()
                .context("mail.endpoint is required for the http transport")?;
            Ok(Arc::new(HttpTransport::new(
                endpoint,
                cfg.api_key.clone(),
                cfg.from_address.clone(),
            )))
        }
    }
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &RenderedEmail) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "email dispatched to log transport"
        );
        Ok(())
    }
}

/// Posts each message as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpTransport {
    pub fn new(endpoint: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, email: &RenderedEmail) -> Result<()> {
        let body = OutgoingMessage {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = self.api_key.as_deref() {
            request = request.bearer_auth(api_key);
        }

        request
            .send()
            .await
            .context("mail relay request failed")?
            .error_for_status()
            .context("mail relay rejected message")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::build_transport;
    use crate::config::{MailConfig, MailTransportKind};

    #[test]
    fn defaults_to_log_transport() {
        let transport = build_transport(&MailConfig::default()).expect("transport should build");
        assert_eq!(transport.name(), "log");
    }

    #[test]
    fn http_transport_requires_endpoint() {
        let cfg = MailConfig {
            transport: MailTransportKind::Http,
            ..MailConfig::default()
        };
        assert!(build_transport(&cfg).is_err());

        let cfg = MailConfig {
            transport: MailTransportKind::Http,
            endpoint: Some("http://127.0.0.1:9/send".to_string()),
            ..MailConfig::default()
        };
        let transport = build_transport(&cfg).expect("transport should build");
        assert_eq!(transport.name(), "http");
    }
}
