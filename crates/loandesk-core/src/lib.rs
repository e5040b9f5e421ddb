//! Core types for loandesk
//!
//! This crate holds everything the loan client does that is not I/O:
//!
//! - [`calculate_simple_loan`] - simple-interest installment arithmetic
//! - [`format_currency`] / [`CurrencyFormat`] - locale-aware money display
//! - [`PaymentStatus`] / [`status_color`] - payment status and badge colours
//! - [`Loan`] / [`LoanPayment`] - the read model returned by the backend
//! - [`QueryState`] / [`LoanSource`] - the `GetLoans` query and its state
//! - [`LoanListView`] - the rendered projection of the loan list
//! - [`PaymentForm`] / [`PaymentGateway`] - the add-payment form state machine
//!
//! # Example
//!
//! ```
//! use loandesk_core::{calculate_simple_loan, format_currency, status_color};
//! use rust_decimal_macros::dec;
//!
//! let loan = calculate_simple_loan(dec!(10000), dec!(5), 12).unwrap();
//! assert_eq!(loan.installment, dec!(875));
//! assert_eq!(loan.installment_fixed(2), "875.00");
//!
//! assert_eq!(format_currency(dec!(875), "en-KE", "KES"), "Ksh\u{a0}875.00");
//! assert_eq!(status_color("On Time"), "green");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod calc;
pub mod currency;
pub mod error;
pub mod form;
pub mod list;
pub mod loan;
pub mod query;
pub mod status;

pub use calc::{calculate_simple_loan, SimpleLoan, DEFAULT_TERM_MONTHS};
pub use currency::{format_currency, CurrencyFormat};
pub use error::{CalcError, FormError, TransportError};
pub use form::{
    parse_int_prefix, AddPaymentFormData, FormPhase, GatewayResponse, PaymentForm,
    PaymentGateway, PaymentRequest, SubmitOutcome, SUCCESS_DISMISS_AFTER,
};
pub use list::{LoanCard, LoanListView, LoanSummary, PaymentRow, StatusBadge};
pub use loan::{Loan, LoanPayment};
pub use query::{
    decode_loans_response, GraphQlError, GraphQlRequest, LoanSource, LoansData, LoansResponse,
    QueryState, GET_LOANS_QUERY,
};
pub use status::{payment_status, status_color, PaymentStatus};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
