//! The add-payment form.
//!
//! [`PaymentForm`] owns the field values and the submission state. A
//! submission is split in two so callers can release the form while the
//! request is in flight:
//!
//! 1. [`PaymentForm::begin_submit`] enters the submitting state and returns
//!    the request payload.
//! 2. [`PaymentForm::complete_submit`] takes whatever the gateway returned
//!    and always leaves the submitting state.
//!
//! [`PaymentForm::submit`] runs both steps against a [`PaymentGateway`].

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{FormError, TransportError};
use crate::loan::Loan;

/// How long the success message stays up.
pub const SUCCESS_DISMISS_AFTER: Duration = Duration::from_secs(2);

/// General error when the backend rejects a payment without saying why.
pub const FALLBACK_SUBMIT_ERROR: &str = "Failed to add payment";
/// General error when a failure carries no message at all.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Field names as the payments endpoint reports them in field errors.
pub mod fields {
    /// The loan selector.
    pub const LOAN_ID: &str = "loan_id";
    /// The derived payment amount.
    pub const PAYMENT_AMOUNT: &str = "payment_amount";
    /// The payment date.
    pub const PAYMENT_DATE: &str = "payment_date";
}

/// Raw field values, exactly as the inputs hold them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddPaymentFormData {
    /// Selected loan id; empty means nothing selected.
    pub loan_id: String,
    /// Installment derived from the selected loan, two decimal places.
    pub payment_amount: String,
    /// Payment date as entered (`YYYY-MM-DD`).
    pub payment_date: String,
}

/// Body of `POST /api/v1/payments`.
///
/// Ids and amounts are parsed the way the browser's `parseInt` does, so an
/// amount of `"875.50"` is sent as `875`. Anything unparseable is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    /// Loan to pay.
    pub loan_id: Option<i64>,
    /// Amount, truncated to whole units.
    pub payment_amount: Option<i64>,
    /// Payment date; `null` when left empty.
    pub payment_date: Option<String>,
}

impl PaymentRequest {
    /// Build the payload from raw field values.
    #[must_use]
    pub fn from_form(data: &AddPaymentFormData) -> Self {
        Self {
            loan_id: parse_int_prefix(&data.loan_id),
            payment_amount: parse_int_prefix(&data.payment_amount),
            payment_date: Some(data.payment_date.clone()).filter(|d| !d.is_empty()),
        }
    }
}

/// Parse the leading integer of `input`: optional whitespace, an optional
/// sign, then decimal digits up to the first non-digit. Returns `None` when
/// no digit leads or the value does not fit in an `i64`.
///
/// ```
/// use loandesk_core::parse_int_prefix;
///
/// assert_eq!(parse_int_prefix("875.99"), Some(875));
/// assert_eq!(parse_int_prefix("  -12abc"), Some(-12));
/// assert_eq!(parse_int_prefix(""), None);
/// ```
#[must_use]
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// What the payments endpoint sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl GatewayResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can deliver a payment to the backend.
pub trait PaymentGateway: Send + Sync {
    /// Send the payment and wait for the response.
    fn add_payment(&self, request: &PaymentRequest) -> Result<GatewayResponse, TransportError>;
}

/// Where the form is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    /// Editable, nothing to report.
    Idle,
    /// A request is in flight; inputs and the submit control are disabled.
    Submitting,
    /// The last submission succeeded and the message is still showing.
    Success,
    /// The last submission failed, generally or per field.
    Error,
}

/// How a finished submission turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Payment recorded. Pass `dismiss_token` to
    /// [`PaymentForm::dismiss_success`] after [`SUCCESS_DISMISS_AFTER`].
    Added {
        /// Identifies this success for the delayed dismissal.
        dismiss_token: u64,
    },
    /// The backend rejected specific fields.
    FieldErrors,
    /// The submission failed with a general message.
    Failed(String),
}

/// Field values plus submission state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentForm {
    data: AddPaymentFormData,
    submitting: bool,
    submit_error: Option<String>,
    submit_success: bool,
    field_errors: BTreeMap<String, String>,
    success_token: u64,
}

impl PaymentForm {
    /// An empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current field values.
    #[must_use]
    pub const fn data(&self) -> &AddPaymentFormData {
        &self.data
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The general error shown next to the submit control.
    #[must_use]
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Whether the success message is showing.
    #[must_use]
    pub const fn submit_success(&self) -> bool {
        self.submit_success
    }

    /// Field-level errors keyed by the backend's field names.
    #[must_use]
    pub const fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Error message for one field.
    #[must_use]
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FormPhase {
        if self.submitting {
            FormPhase::Submitting
        } else if self.submit_success {
            FormPhase::Success
        } else if self.submit_error.is_some() || !self.field_errors.is_empty() {
            FormPhase::Error
        } else {
            FormPhase::Idle
        }
    }

    /// Change the selected loan and recompute the amount.
    pub fn select_loan(&mut self, loan_id: &str, loans: &[Loan]) {
        self.data.loan_id = loan_id.to_string();
        self.field_errors.remove(fields::LOAN_ID);
        self.recompute_amount(loans);
    }

    /// Recompute the amount after the list of loans changed.
    pub fn sync_loans(&mut self, loans: &[Loan]) {
        self.recompute_amount(loans);
    }

    /// Change the payment date.
    pub fn set_payment_date(&mut self, date: &str) {
        self.data.payment_date = date.to_string();
        self.field_errors.remove(fields::PAYMENT_DATE);
    }

    fn recompute_amount(&mut self, loans: &[Loan]) {
        if self.data.loan_id.is_empty() {
            self.data.payment_amount.clear();
            return;
        }
        let Ok(id) = self.data.loan_id.trim().parse::<i64>() else {
            return;
        };
        if let Some(loan) = loans.iter().find(|l| l.id == id) {
            if let Ok(simple) = loan.simple_loan() {
                self.data.payment_amount = simple.installment_fixed(2);
            }
        }
    }

    /// Enter the submitting state and build the payload.
    ///
    /// Refuses while a previous submission is still in flight.
    pub fn begin_submit(&mut self) -> Result<PaymentRequest, FormError> {
        if self.submitting {
            return Err(FormError::AlreadySubmitting);
        }
        self.submitting = true;
        self.submit_error = None;
        self.submit_success = false;
        Ok(PaymentRequest::from_form(&self.data))
    }

    /// Apply the gateway's answer and leave the submitting state.
    ///
    /// On success the fields are reset and `on_payment_added` runs once.
    pub fn complete_submit(
        &mut self,
        result: Result<GatewayResponse, TransportError>,
        on_payment_added: impl FnOnce(),
    ) -> Result<SubmitOutcome, FormError> {
        if !self.submitting {
            return Err(FormError::NotSubmitting);
        }
        self.submitting = false;

        let outcome = match result {
            Ok(response) => self.apply_response(&response),
            Err(e) => self.fail(e.to_string()),
        };
        if matches!(outcome, SubmitOutcome::Added { .. }) {
            on_payment_added();
        }
        Ok(outcome)
    }

    /// Run a whole submission against `gateway`.
    pub fn submit(
        &mut self,
        gateway: &dyn PaymentGateway,
        on_payment_added: impl FnOnce(),
    ) -> Result<SubmitOutcome, FormError> {
        let request = self.begin_submit()?;
        let result = gateway.add_payment(&request);
        self.complete_submit(result, on_payment_added)
    }

    /// Start over with empty fields and no messages.
    ///
    /// Outstanding dismiss tokens stay stale, so a timer from before the
    /// reset cannot hide a later success.
    pub fn reset(&mut self) {
        *self = Self {
            success_token: self.success_token,
            ..Self::default()
        };
    }

    /// Hide the success message, unless a newer submission has happened
    /// since `token` was handed out.
    pub fn dismiss_success(&mut self, token: u64) {
        if token == self.success_token && !self.submitting {
            self.submit_success = false;
        }
    }

    fn apply_response(&mut self, response: &GatewayResponse) -> SubmitOutcome {
        // The body is read before the status is looked at, so a success
        // with an unreadable body is still a failure.
        let body: Value = match serde_json::from_str(&response.body) {
            Ok(v) => v,
            Err(e) => return self.fail(e.to_string()),
        };

        if !response.is_success() {
            return match body.get("error") {
                Some(Value::Object(map)) => {
                    self.field_errors = map
                        .iter()
                        .map(|(field, messages)| (field.clone(), join_messages(messages)))
                        .collect();
                    SubmitOutcome::FieldErrors
                }
                Some(Value::Array(items)) => {
                    self.field_errors = items
                        .iter()
                        .enumerate()
                        .map(|(i, messages)| (i.to_string(), join_messages(messages)))
                        .collect();
                    SubmitOutcome::FieldErrors
                }
                Some(error) if is_truthy(error) => self.fail(scalar_text(error)),
                _ => self.fail(FALLBACK_SUBMIT_ERROR.to_string()),
            };
        }

        self.submit_success = true;
        self.success_token += 1;
        self.data = AddPaymentFormData::default();
        SubmitOutcome::Added {
            dismiss_token: self.success_token,
        }
    }

    fn fail(&mut self, message: String) -> SubmitOutcome {
        let message = if message.is_empty() {
            UNEXPECTED_ERROR.to_string()
        } else {
            message
        };
        self.submit_error = Some(message.clone());
        SubmitOutcome::Failed(message)
    }
}

fn join_messages(messages: &Value) -> String {
    match messages {
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
