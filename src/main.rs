use std::net::SocketAddr;

use anyhow::Context;
use tower_http::trace::TraceLayer;

use contacts_server::{
    auth::TokenService,
    config::AppConfig,
    db::connection,
    logging::{init_fallback_tracing, init_tracing},
    mail::{MailQueue, build_transport},
    routes::app,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        init_fallback_tracing();
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("failed to load config")?;
    init_tracing(&cfg.logging);

    let db_cfg = cfg
        .database
        .as_ref()
        .context("database config is required (set APP_DATABASE__URL)")?;
    let db = connection::connect(db_cfg).await?;

    let tokens = TokenService::from_config(&cfg.auth)?;
    let transport = build_transport(&cfg.mail)?;
    let mailer = MailQueue::spawn(transport, cfg.mail.queue_capacity);

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;

    let state = AppState::new(cfg, db, tokens, mailer);
    let app = app(state).layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
