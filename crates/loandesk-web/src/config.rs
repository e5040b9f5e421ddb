//! Command-line configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use loandesk_core::currency::{DEFAULT_CURRENCY, DEFAULT_LOCALE};
use loandesk_core::CurrencyFormat;

/// GraphQL endpoint of the loans backend.
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:2024/graphql/v1";
/// REST endpoint that records payments.
pub const DEFAULT_PAYMENTS_URL: &str = "http://localhost:2024/api/v1/payments";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// GraphQL endpoint serving the `loans` query
    #[arg(long, default_value = DEFAULT_GRAPHQL_URL)]
    pub graphql_url: String,

    /// Endpoint that accepts new payments
    #[arg(long, default_value = DEFAULT_PAYMENTS_URL)]
    pub payments_url: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5173)]
    pub port: u16,

    /// Locale used to format amounts
    #[arg(long, default_value = DEFAULT_LOCALE)]
    pub locale: String,

    /// Currency amounts are shown in
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    /// Directory with page templates (defaults to the bundled ones)
    #[arg(long)]
    pub templates: Option<PathBuf>,
}

/// Resolved settings the server runs with.
#[derive(Debug, Clone)]
pub struct Config {
    /// GraphQL endpoint.
    pub graphql_url: String,
    /// Payments endpoint.
    pub payments_url: String,
    /// Address to bind.
    pub addr: SocketAddr,
    /// How amounts are formatted.
    pub currency: CurrencyFormat,
    /// Template directory override.
    pub templates: Option<PathBuf>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            graphql_url: args.graphql_url,
            payments_url: args.payments_url,
            addr: SocketAddr::from(([127, 0, 0, 1], args.port)),
            currency: CurrencyFormat::new(args.locale, args.currency),
            templates: args.templates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_backend() {
        let config = Config::from(Args::parse_from(["loandesk-web"]));
        assert_eq!(config.graphql_url, DEFAULT_GRAPHQL_URL);
        assert_eq!(config.payments_url, DEFAULT_PAYMENTS_URL);
        assert_eq!(config.addr.port(), 5173);
        assert_eq!(config.currency, CurrencyFormat::default());
        assert!(config.templates.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from(Args::parse_from([
            "loandesk-web",
            "--port",
            "8080",
            "--locale",
            "en-US",
            "--currency",
            "USD",
            "--payments-url",
            "http://backend/api/v1/payments",
        ]));
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.currency, CurrencyFormat::new("en-US", "USD"));
        assert_eq!(config.payments_url, "http://backend/api/v1/payments");
    }
}
