//! Payment status and the badge colours that go with it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Colour used for any status the client does not recognise.
pub const FALLBACK_COLOR: &str = "grey";

/// Payments made up to this many days after the due date are on time.
const ON_TIME_GRACE_DAYS: i64 = 5;
/// Payments made up to this many days after the due date are late, not defaulted.
const LATE_LIMIT_DAYS: i64 = 30;

/// The closed set of statuses the backend reports for loans and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Paid within the grace period.
    #[serde(rename = "On Time")]
    OnTime,
    /// Paid after the grace period but within the late window.
    Late,
    /// Paid after the late window.
    Defaulted,
    /// No payment recorded.
    Unpaid,
}

impl PaymentStatus {
    /// The label shown on the badge, as the backend spells it.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OnTime => "On Time",
            Self::Late => "Late",
            Self::Defaulted => "Defaulted",
            Self::Unpaid => "Unpaid",
        }
    }

    /// The badge colour.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::OnTime => "green",
            Self::Late => "orange",
            Self::Defaulted => "red",
            Self::Unpaid => FALLBACK_COLOR,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a label is not one of the known statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "On Time" => Ok(Self::OnTime),
            "Late" => Ok(Self::Late),
            "Defaulted" => Ok(Self::Defaulted),
            "Unpaid" => Ok(Self::Unpaid),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Badge colour for a status label. Never fails: anything unrecognised,
/// including the empty string, is grey.
///
/// ```
/// use loandesk_core::status_color;
///
/// assert_eq!(status_color("On Time"), "green");
/// assert_eq!(status_color("Late"), "orange");
/// assert_eq!(status_color("Defaulted"), "red");
/// assert_eq!(status_color(""), "grey");
/// ```
#[must_use]
pub fn status_color(status: &str) -> &'static str {
    status
        .parse::<PaymentStatus>()
        .map_or(FALLBACK_COLOR, |s| s.color())
}

/// Classify a payment by how many days after the due date it was made.
///
/// No payment date means unpaid. Early payments count as on time.
#[must_use]
pub fn payment_status(due_date: NaiveDate, payment_date: Option<NaiveDate>) -> PaymentStatus {
    let Some(paid) = payment_date else {
        return PaymentStatus::Unpaid;
    };
    let days_late = (paid - due_date).num_days();
    if days_late <= ON_TIME_GRACE_DAYS {
        PaymentStatus::OnTime
    } else if days_late <= LATE_LIMIT_DAYS {
        PaymentStatus::Late
    } else {
        PaymentStatus::Defaulted
    }
}
