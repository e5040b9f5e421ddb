//! HTTP clients for the loans backend.
//!
//! Both clients are blocking (ureq); handlers run them on the blocking pool.
//! Non-2xx statuses are returned as responses, not errors, because both
//! endpoints put meaningful bodies on failures.

use loandesk_core::{
    decode_loans_response, GatewayResponse, GraphQlRequest, LoanSource, LoansResponse,
    PaymentGateway, PaymentRequest, TransportError,
};
use ureq::http::Response;
use ureq::{Agent, Body};

fn agent() -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

fn read_response(mut response: Response<Body>) -> Result<(u16, String), TransportError> {
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| TransportError::Decode(format!("failed to read response body: {e}")))?;
    Ok((status, body))
}

/// Runs `GetLoans` against a GraphQL endpoint.
pub struct GraphQlLoanSource {
    endpoint: String,
    agent: Agent,
}

impl GraphQlLoanSource {
    /// Create a source for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: agent(),
        }
    }
}

impl LoanSource for GraphQlLoanSource {
    fn fetch_loans(&self) -> Result<LoansResponse, TransportError> {
        tracing::debug!("POST {} (GetLoans)", self.endpoint);
        let response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .send_json(GraphQlRequest::get_loans())
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let (status, body) = read_response(response)?;
        tracing::debug!("GetLoans answered {status} ({} bytes)", body.len());
        decode_loans_response(status, &body)
    }
}

/// Posts payments to the REST endpoint.
pub struct RestPaymentGateway {
    endpoint: String,
    agent: Agent,
}

impl RestPaymentGateway {
    /// Create a gateway for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: agent(),
        }
    }
}

impl PaymentGateway for RestPaymentGateway {
    fn add_payment(&self, request: &PaymentRequest) -> Result<GatewayResponse, TransportError> {
        tracing::debug!("POST {} {:?}", self.endpoint, request);
        let response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .send_json(request)
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let (status, body) = read_response(response)?;
        Ok(GatewayResponse::new(status, body))
    }
}
