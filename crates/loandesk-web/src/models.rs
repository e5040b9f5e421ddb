//! Request payloads and template view models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use loandesk_core::form::fields;
use loandesk_core::{FormPhase, Loan, PaymentForm};

/// Form payload when the loan selector changes.
#[derive(Deserialize, Debug)]
pub struct SelectLoanRequest {
    /// Selected loan id; empty when the placeholder option is picked.
    #[serde(default)]
    pub loan_id: String,
}

/// Form payload when the payment date changes.
#[derive(Deserialize, Debug)]
pub struct PaymentDateRequest {
    /// Date as entered (`YYYY-MM-DD`).
    #[serde(default)]
    pub payment_date: String,
}

/// An entry in the loan selector.
#[derive(Serialize, Debug)]
pub struct LoanOption {
    /// Option value.
    pub id: String,
    /// Option text, e.g. `Tom's Loan - 10000 (5%)`.
    pub label: String,
    /// Whether this loan is the current selection.
    pub selected: bool,
}

/// Everything the payment form template needs.
#[derive(Serialize, Debug)]
pub struct PaymentFormView {
    /// Selected loan id.
    pub loan_id: String,
    /// Derived amount.
    pub payment_amount: String,
    /// Entered date.
    pub payment_date: String,
    /// Submit cycle phase.
    pub phase: FormPhase,
    /// Inputs and the submit control are disabled.
    pub submitting: bool,
    /// General error next to the submit control.
    pub submit_error: Option<String>,
    /// Success message is showing.
    pub submit_success: bool,
    /// Error under the loan selector.
    pub loan_id_error: Option<String>,
    /// Error under the amount input.
    pub payment_amount_error: Option<String>,
    /// Error under the date input.
    pub payment_date_error: Option<String>,
    /// Field errors for fields the form has no input for.
    pub other_errors: BTreeMap<String, String>,
    /// Loan selector entries.
    pub options: Vec<LoanOption>,
}

impl PaymentFormView {
    /// Project the form against the loans it can select from.
    pub fn new(form: &PaymentForm, loans: &[Loan]) -> Self {
        let data = form.data();
        let field_error = |name: &str| form.field_error(name).map(str::to_string);
        let other_errors = form
            .field_errors()
            .iter()
            .filter(|(name, _)| {
                ![fields::LOAN_ID, fields::PAYMENT_AMOUNT, fields::PAYMENT_DATE]
                    .contains(&name.as_str())
            })
            .map(|(name, message)| (name.clone(), message.clone()))
            .collect();

        Self {
            loan_id: data.loan_id.clone(),
            payment_amount: data.payment_amount.clone(),
            payment_date: data.payment_date.clone(),
            phase: form.phase(),
            submitting: form.is_submitting(),
            submit_error: form.submit_error().map(str::to_string),
            submit_success: form.submit_success(),
            loan_id_error: field_error(fields::LOAN_ID),
            payment_amount_error: field_error(fields::PAYMENT_AMOUNT),
            payment_date_error: field_error(fields::PAYMENT_DATE),
            other_errors,
            options: loans
                .iter()
                .map(|loan| LoanOption {
                    id: loan.id.to_string(),
                    label: format!(
                        "{} - {} ({}%)",
                        loan.name,
                        loan.principal.normalize(),
                        loan.interest_rate.normalize()
                    ),
                    selected: loan.id.to_string() == data.loan_id,
                })
                .collect(),
        }
    }
}
