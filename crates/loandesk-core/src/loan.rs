//! Loans and payments as returned by the `GetLoans` query.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calc::SimpleLoan;
use crate::error::CalcError;
use crate::status::{payment_status, PaymentStatus};

/// A loan owned by the backend. The client only ever holds a read-only
/// snapshot from the latest query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Unique loan id.
    pub id: i64,
    /// Borrower or loan name.
    pub name: String,
    /// Amount lent.
    pub principal: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Due date as sent by the backend (`YYYY-MM-DD`).
    pub due_date: String,
    /// Loan-level status, when the backend provides one.
    #[serde(default)]
    pub status: Option<String>,
    /// Payments recorded against this loan, in backend order.
    #[serde(default)]
    pub loan_payments: Vec<LoanPayment>,
}

/// A payment recorded against a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayment {
    /// Payment id, unique within its loan.
    pub id: i64,
    /// Id of the owning loan.
    pub loan_id: i64,
    /// Amount paid. Absent means the backend has not recorded one.
    #[serde(default)]
    pub payment_amount: Option<Decimal>,
    /// Date paid (`YYYY-MM-DD`).
    #[serde(default)]
    pub payment_date: Option<String>,
    /// Status label, when the backend provides one.
    #[serde(default)]
    pub status: Option<String>,
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

impl Loan {
    /// Interest, total and monthly installment over the default twelve-month term.
    pub fn simple_loan(&self) -> Result<SimpleLoan, CalcError> {
        SimpleLoan::for_default_term(self.principal, self.interest_rate)
    }

    /// The due date, if it parses as a calendar date.
    #[must_use]
    pub fn due(&self) -> Option<NaiveDate> {
        parse_date(&self.due_date)
    }

    /// Whether any payment has been recorded.
    #[must_use]
    pub fn has_payments(&self) -> bool {
        !self.loan_payments.is_empty()
    }

    /// Date of the first payment, if any.
    #[must_use]
    pub fn first_payment_date(&self) -> Option<&str> {
        self.loan_payments
            .first()
            .and_then(|p| p.payment_date.as_deref())
    }
}

impl LoanPayment {
    /// The payment date, if present and parseable.
    #[must_use]
    pub fn paid_on(&self) -> Option<NaiveDate> {
        self.payment_date.as_deref().and_then(parse_date)
    }

    /// The status label to display for this payment.
    ///
    /// Uses the backend's label when it sent one. Otherwise the status is
    /// derived from the loan's due date and this payment's date, and falls
    /// back to `Unpaid` when the due date is unusable.
    #[must_use]
    pub fn display_status(&self, loan: &Loan) -> String {
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            return status.to_string();
        }
        loan.due()
            .map_or(PaymentStatus::Unpaid, |due| payment_status(due, self.paid_on()))
            .label()
            .to_string()
    }
}
