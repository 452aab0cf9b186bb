use anyhow::{Result, bail};

use super::{AppConfig, MailTransportKind};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.general.public_url.trim().is_empty() {
        errors.push("general.public_url must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if cfg.auth.jwt_secret.trim().is_empty() {
        errors.push("auth.jwt_secret must not be empty".to_string());
    }

    for (name, ttl) in [
        ("auth.access_ttl_secs", cfg.auth.access_ttl_secs),
        ("auth.refresh_ttl_secs", cfg.auth.refresh_ttl_secs),
        ("auth.confirmation_ttl_secs", cfg.auth.confirmation_ttl_secs),
        ("auth.reset_ttl_secs", cfg.auth.reset_ttl_secs),
    ] {
        if ttl <= 0 {
            errors.push(format!("{name} must be > 0"));
        }
    }

    if cfg.mail.transport == MailTransportKind::Http
        && cfg
            .mail
            .endpoint
            .as_deref()
            .is_none_or(|endpoint| endpoint.trim().is_empty())
    {
        errors.push("mail.endpoint is required when mail.transport is http".to_string());
    }

    if cfg.mail.queue_capacity == 0 {
        errors.push("mail.queue_capacity must be > 0".to_string());
    }

    let limits = &cfg.rate_limit;
    if limits.enabled {
        if limits.read_requests == 0 || limits.write_requests == 0 {
            errors.push("rate_limit request counts must be > 0".to_string());
        }
        if limits.read_window_secs == 0 || limits.write_window_secs == 0 {
            errors.push("rate_limit windows must be > 0".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
