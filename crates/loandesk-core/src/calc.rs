//! Simple-interest installment arithmetic.
//!
//! Loans in the backend carry only a principal, an interest rate and a due
//! date. The client assumes a fixed twelve-month repayment term so it can show
//! a monthly installment for every loan. Interest is simple (never
//! compounded) and the rate is read as an annual percentage, so over twelve
//! months the interest is exactly `principal * rate / 100`.
//!
//! This is an approximation for display, not an amortization schedule.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::CalcError;

/// Repayment term assumed for every loan, in months.
pub const DEFAULT_TERM_MONTHS: u32 = 12;

/// Interest, total and per-month installment of a simple-interest loan.
///
/// # Examples
///
/// ```
/// use loandesk_core::SimpleLoan;
/// use rust_decimal_macros::dec;
///
/// let loan = SimpleLoan::for_default_term(dec!(10000), dec!(5)).unwrap();
/// assert_eq!(loan.interest, dec!(500));
/// assert_eq!(loan.total, dec!(10500));
/// assert_eq!(loan.installment, dec!(875));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimpleLoan {
    /// Interest accrued over the term.
    pub interest: Decimal,
    /// Principal plus interest.
    pub total: Decimal,
    /// Total divided evenly over the term.
    pub installment: Decimal,
}

impl SimpleLoan {
    /// Calculate over [`DEFAULT_TERM_MONTHS`].
    pub fn for_default_term(principal: Decimal, rate: Decimal) -> Result<Self, CalcError> {
        calculate_simple_loan(principal, rate, DEFAULT_TERM_MONTHS)
    }

    /// The installment rounded half away from zero and printed with exactly
    /// `dp` decimal places, e.g. `"875.00"`.
    #[must_use]
    pub fn installment_fixed(&self, dp: u32) -> String {
        let rounded = self
            .installment
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.*}", dp as usize, rounded)
    }
}

/// Calculate simple interest on `principal` at `rate` percent over `months`.
///
/// - `interest = principal * rate * months / (100 * 12)`
/// - `total = principal + interest`
/// - `installment = total / months`
///
/// Negative or zero principals and rates are not rejected. A zero-month term
/// is an error because the installment would be undefined.
pub fn calculate_simple_loan(
    principal: Decimal,
    rate: Decimal,
    months: u32,
) -> Result<SimpleLoan, CalcError> {
    if months == 0 {
        return Err(CalcError::ZeroTerm);
    }
    let months = Decimal::from(months);
    let interest = principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(months))
        .and_then(|v| v.checked_div(Decimal::from(100 * DEFAULT_TERM_MONTHS)))
        .ok_or(CalcError::Overflow)?;
    let total = principal
        .checked_add(interest)
        .ok_or(CalcError::Overflow)?;
    let installment = total.checked_div(months).ok_or(CalcError::Overflow)?;

    Ok(SimpleLoan {
        interest,
        total,
        installment,
    })
}
