//! Web UI for loandesk.
//!
//! Serves a single page listing loans with their payments and an add-payment
//! form. The page is rendered server-side with tera and updated in place with
//! htmx fragments; loan data and new payments go to the backend through the
//! ureq clients in [`api`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod handlers;
pub mod models;

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tera::Tera;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use handlers::AppState;

/// Load the page templates from `dir`, or from the crate's own `templates/`.
pub fn load_templates(dir: Option<&Path>) -> tera::Result<Tera> {
    let glob = match dir {
        Some(dir) => format!("{}/**/*", dir.display()),
        None => concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*").to_string(),
    };
    let mut tera = Tera::new(&glob)?;
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/partials/loans", get(handlers::loans_partial))
        .route("/partials/loans/refetch", post(handlers::refetch_loans))
        .route("/partials/payment-form", get(handlers::payment_form_partial))
        .route("/payments/loan", post(handlers::select_loan))
        .route("/payments/date", post(handlers::set_payment_date))
        .route("/payments", post(handlers::submit_payment))
        .nest_service(
            "/assets",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
