use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use loandesk_web::api::{GraphQlLoanSource, RestPaymentGateway};
use loandesk_web::config::{Args, Config};
use loandesk_web::{load_templates, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("loandesk_web=info,tower_http=info")),
        )
        .init();

    let config = Config::from(Args::parse());

    let tera = load_templates(config.templates.as_deref())?;

    let state = Arc::new(AppState::new(
        tera,
        Arc::new(GraphQlLoanSource::new(config.graphql_url.clone())),
        Arc::new(RestPaymentGateway::new(config.payments_url.clone())),
        config.currency.clone(),
    ));

    tracing::info!("loans from {}", config.graphql_url);
    tracing::info!("payments to {}", config.payments_url);
    println!("Listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
