//! Fire-and-forget email delivery.
//!
//! Request handlers push a [`MailJob`] onto a bounded queue and move on. A single
//! background worker renders the job with askama and hands it to the configured
//! [`EmailTransport`]. Failures are logged and never reach the caller.

mod templates;
mod transport;

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

pub use templates::{RenderedEmail, render};
pub use transport::{EmailTransport, HttpTransport, LogTransport, build_transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    EmailConfirmation,
    PasswordReset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailJob {
    pub kind: MailKind,
    pub to: String,
    pub username: String,
    pub link: String,
}

#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<MailJob>,
}

impl MailQueue {
    /// Starts the delivery worker on the current tokio runtime.
    pub fn spawn(transport: Arc<dyn EmailTransport>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(rx, transport));
        Self { tx }
    }

    /// Queues `job` without waiting. Returns `false` when the job was dropped.
    pub fn enqueue(&self, job: MailJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                tracing::warn!(to = %job.to, kind = ?job.kind, "mail queue full, dropping email");
                false
            }
            Err(TrySendError::Closed(job)) => {
                tracing::error!(to = %job.to, kind = ?job.kind, "mail worker stopped, dropping email");
                false
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<MailJob>, transport: Arc<dyn EmailTransport>) {
    tracing::info!(transport = transport.name(), "mail worker started");
    while let Some(job) = rx.recv().await {
        let email = match render(&job) {
            Ok(email) => email,
            Err(err) => {
                tracing::error!(kind = ?job.kind, error = %err, "failed to render email");
                continue;
            }
        };

        match transport.send(&email).await {
            Ok(()) => tracing::debug!(to = %email.to, kind = ?job.kind, "email sent"),
            Err(err) => tracing::warn!(to = %email.to, error = ?err, "email delivery failed"),
        }
    }
    tracing::info!("mail worker stopped");
}
