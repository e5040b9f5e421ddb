//! Error types shared across the core.

use thiserror::Error;

/// Errors from the installment arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CalcError {
    /// The loan term was zero months, so there is nothing to divide the total by.
    #[error("loan term must be at least one month")]
    ZeroTerm,

    /// An intermediate value did not fit in a decimal.
    #[error("loan amount overflowed decimal range")]
    Overflow,
}

/// Errors talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a response (connection refused, DNS, I/O).
    #[error("{0}")]
    Request(String),

    /// The backend answered with a non-success status and no usable body.
    #[error("Response not successful: Received status code {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("{0}")]
    Decode(String),
}

/// Errors driving the payment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    /// A submission is already in flight.
    #[error("a payment is already being submitted")]
    AlreadySubmitting,

    /// `complete_submit` was called without a matching `begin_submit`.
    #[error("no payment submission is in flight")]
    NotSubmitting,
}
