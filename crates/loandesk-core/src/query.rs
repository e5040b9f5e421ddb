//! The `GetLoans` read query.
//!
//! Results are consumed with error policy "all": a response may carry partial
//! data and errors at the same time, and both are kept so the page can render
//! the loans it did get next to the error banner.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TransportError;
use crate::loan::Loan;

/// GraphQL document for the loan list, with each loan's payments.
pub const GET_LOANS_QUERY: &str = "query GetLoans {
  loans {
    id
    name
    principal
    interestRate
    dueDate
    status
    loanPayments {
      id
      loanId
      paymentAmount
      paymentDate
      status
    }
  }
}";

/// Operation name sent alongside [`GET_LOANS_QUERY`].
pub const GET_LOANS_OPERATION: &str = "GetLoans";

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    /// The document.
    pub query: &'static str,
    /// Operation to execute within the document.
    pub operation_name: &'static str,
}

impl GraphQlRequest {
    /// The `GetLoans` request. It takes no variables.
    #[must_use]
    pub const fn get_loans() -> Self {
        Self {
            query: GET_LOANS_QUERY,
            operation_name: GET_LOANS_OPERATION,
        }
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphQlError {
    /// Human-readable message.
    pub message: String,
}

/// The `data` member of a `GetLoans` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LoansData {
    /// Loans, with entries nulled out by resolver errors dropped.
    #[serde(default, deserialize_with = "skip_null_entries")]
    pub loans: Option<Vec<Loan>>,
}

fn skip_null_entries<'de, D>(deserializer: D) -> Result<Option<Vec<Loan>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<Option<Loan>>> = Option::deserialize(deserializer)?;
    Ok(entries.map(|list| list.into_iter().flatten().collect()))
}

/// A decoded `GetLoans` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LoansResponse {
    /// Data, possibly partial.
    #[serde(default)]
    pub data: Option<LoansData>,
    /// Errors reported next to (or instead of) the data.
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl LoansResponse {
    /// A response carrying only data.
    #[must_use]
    pub fn with_loans(loans: Vec<Loan>) -> Self {
        Self {
            data: Some(LoansData { loans: Some(loans) }),
            errors: Vec::new(),
        }
    }

    /// The loans, if the response carried any data for them.
    #[must_use]
    pub fn loans(&self) -> Option<&[Loan]> {
        self.data.as_ref()?.loans.as_deref()
    }

    /// All error messages joined one per line, or `None` without errors.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Decode a raw HTTP response to the `GetLoans` request.
///
/// Any JSON body carrying `data` or `errors` is accepted whatever the status
/// code, since GraphQL servers report resolver failures that way. A failed
/// status without such a body is a [`TransportError::Status`].
pub fn decode_loans_response(status: u16, body: &str) -> Result<LoansResponse, TransportError> {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<LoansResponse>(body) {
        Ok(response) if success || response.data.is_some() || !response.errors.is_empty() => {
            Ok(response)
        }
        Ok(_) => Err(TransportError::Status(status)),
        Err(e) if success => Err(TransportError::Decode(e.to_string())),
        Err(_) => Err(TransportError::Status(status)),
    }
}

/// Anything that can run the `GetLoans` query.
pub trait LoanSource: Send + Sync {
    /// Issue the query and wait for its response.
    fn fetch_loans(&self) -> Result<LoansResponse, TransportError>;
}

/// Client-side state of the read query: what the loan list renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    loading: bool,
    started: bool,
    data: Option<Vec<Loan>>,
    error: Option<String>,
}

impl QueryState {
    /// A query that has not been issued yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the query has been issued once.
    #[must_use]
    pub const fn needs_initial_fetch(&self) -> bool {
        !self.started
    }

    /// Whether a request is in flight, or the query has never been issued.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading || !self.started
    }

    /// Loans from the most recent data, if any has arrived.
    #[must_use]
    pub fn data(&self) -> Option<&[Loan]> {
        self.data.as_deref()
    }

    /// Loans to offer in the payment form; empty until data arrives.
    #[must_use]
    pub fn loans(&self) -> &[Loan] {
        self.data.as_deref().unwrap_or_default()
    }

    /// The error banner text, if the last request failed in any way.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark a request as in flight. Previous data stays visible.
    pub fn begin(&mut self) {
        self.started = true;
        self.loading = true;
    }

    /// Apply the outcome of a request.
    ///
    /// Data in the response replaces the previous data; a response without
    /// data, or a transport failure, keeps it. The error is replaced by the
    /// response's errors, so a clean response clears the banner.
    pub fn finish(&mut self, result: Result<LoansResponse, TransportError>) {
        self.started = true;
        self.loading = false;
        match result {
            Ok(response) => {
                self.error = response.error_message();
                if let Some(loans) = response.data.and_then(|d| d.loans) {
                    self.data = Some(loans);
                }
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Issue the query against `source` and apply the result.
    pub fn run(&mut self, source: &dyn LoanSource) {
        self.begin();
        self.finish(source.fetch_loans());
    }
}
