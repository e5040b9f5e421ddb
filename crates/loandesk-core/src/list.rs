//! The loan list as the page shows it.
//!
//! [`LoanListView`] is a plain, serializable projection of a [`QueryState`]:
//! every display string is computed here so templates only lay it out.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calc::SimpleLoan;
use crate::currency::CurrencyFormat;
use crate::loan::{Loan, LoanPayment};
use crate::query::QueryState;
use crate::status::{status_color, PaymentStatus};

/// Shown wherever a date or amount is missing.
pub const NOT_AVAILABLE: &str = "N/A";

/// A coloured status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    /// Text on the badge.
    pub label: String,
    /// Background colour.
    pub color: &'static str,
}

impl StatusBadge {
    /// Badge for a status label; unknown labels are grey.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let color = status_color(&label);
        Self { label, color }
    }

    /// The badge shown on a loan that has no payments at all.
    #[must_use]
    pub fn unpaid() -> Self {
        Self::new(PaymentStatus::Unpaid.label())
    }
}

/// One payment line on a loan card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRow {
    /// Payment id.
    pub id: i64,
    /// Payment date, or `N/A`.
    pub date: String,
    /// Formatted amount paid, or the formatted installment estimate.
    pub amount: String,
    /// True when `amount` is the computed installment, not a recorded payment.
    pub estimated: bool,
    /// Status badge.
    pub status: StatusBadge,
}

/// Interest, installment and total over the default term, formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanSummary {
    /// Interest over the term.
    pub interest: String,
    /// Monthly installment.
    pub installment: String,
    /// Principal plus interest.
    pub total: String,
}

impl LoanSummary {
    /// Format a calculated loan.
    #[must_use]
    pub fn new(loan: &SimpleLoan, fmt: &CurrencyFormat) -> Self {
        Self {
            interest: fmt.format(loan.interest),
            installment: fmt.format(loan.installment),
            total: fmt.format(loan.total),
        }
    }
}

/// One card per loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanCard {
    /// Loan id.
    pub id: i64,
    /// Loan name.
    pub name: String,
    /// Formatted principal.
    pub principal: String,
    /// Interest rate with a percent sign, e.g. `5%`.
    pub interest_rate: String,
    /// Due date as sent by the backend.
    pub due_date: String,
    /// Date of the first payment, or `N/A`.
    pub payment_date: String,
    /// Calculator figures; absent if the arithmetic overflowed.
    pub summary: Option<LoanSummary>,
    /// Payment lines, empty when `unpaid_badge` is set.
    pub payments: Vec<PaymentRow>,
    /// Set exactly when the loan has no payments.
    pub unpaid_badge: Option<StatusBadge>,
}

impl LoanCard {
    /// Build the card for a loan.
    #[must_use]
    pub fn new(loan: &Loan, fmt: &CurrencyFormat) -> Self {
        let simple = loan.simple_loan().ok();
        let payments: Vec<PaymentRow> = loan
            .loan_payments
            .iter()
            .map(|p| payment_row(loan, p, simple.as_ref(), fmt))
            .collect();
        let unpaid_badge = payments.is_empty().then(StatusBadge::unpaid);

        Self {
            id: loan.id,
            name: loan.name.clone(),
            principal: fmt.format(loan.principal),
            interest_rate: format_rate(loan.interest_rate),
            due_date: loan.due_date.clone(),
            payment_date: loan
                .first_payment_date()
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            summary: simple.as_ref().map(|s| LoanSummary::new(s, fmt)),
            payments,
            unpaid_badge,
        }
    }
}

fn payment_row(
    loan: &Loan,
    payment: &LoanPayment,
    simple: Option<&SimpleLoan>,
    fmt: &CurrencyFormat,
) -> PaymentRow {
    let (amount, estimated) = match payment.payment_amount {
        Some(paid) => (fmt.format(paid), false),
        None => (
            simple.map_or_else(|| NOT_AVAILABLE.to_string(), |s| fmt.format(s.installment)),
            true,
        ),
    };
    PaymentRow {
        id: payment.id,
        date: payment
            .payment_date
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        amount,
        estimated,
        status: StatusBadge::new(payment.display_status(loan)),
    }
}

fn format_rate(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}

/// Everything the loan list renders.
///
/// `loading`, `error` and the cards are independent: partial data is shown
/// together with the error banner, and previous data stays up during a
/// refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanListView {
    /// A request is in flight.
    pub loading: bool,
    /// Error banner text.
    pub error: Option<String>,
    /// Data arrived and holds no loans.
    pub empty: bool,
    /// One card per loan.
    pub cards: Vec<LoanCard>,
}

impl LoanListView {
    /// Project a query state.
    #[must_use]
    pub fn build(state: &QueryState, fmt: &CurrencyFormat) -> Self {
        Self::from_parts(state.is_loading(), state.data(), state.error(), fmt)
    }

    /// Project loose query results.
    #[must_use]
    pub fn from_parts(
        loading: bool,
        data: Option<&[Loan]>,
        error: Option<&str>,
        fmt: &CurrencyFormat,
    ) -> Self {
        let loans = data.unwrap_or_default();
        Self {
            loading,
            error: error.map(str::to_string),
            empty: data.is_some_and(<[Loan]>::is_empty),
            cards: loans.iter().map(|l| LoanCard::new(l, fmt)).collect(),
        }
    }
}
