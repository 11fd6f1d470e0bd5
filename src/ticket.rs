//! The ticket value object and the expiry buffer policy.
//!
//! A [`Ticket`] carries its lifetime already buffer-adjusted: the coordinator
//! subtracts a safety margin from the lifetime the issuer reports, so the
//! cache treats a ticket as expired slightly before the issuer actually
//! invalidates it. The margin absorbs clock and network skew.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TicketError;

/// Upper bound on a sane ticket lifetime: one Gregorian year in seconds.
const MAX_EXPIRES_IN: i64 = 31_556_952;

/// A cached ticket with its buffer-adjusted lifetime.
///
/// The empty ticket (`value == ""`) is the sentinel for "nothing usable
/// cached". It is stored after every failed refresh so stale data is never
/// served once a ticket is known bad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// The opaque ticket string handed out to callers.
    pub value: String,

    /// Remaining lifetime in seconds, already buffer-adjusted.
    pub expires_in: i64,

    /// When this ticket was stored.
    pub issued_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a ticket issued now.
    pub fn new(value: impl Into<String>, expires_in: i64) -> Self {
        Self {
            value: value.into(),
            expires_in,
            issued_at: Utc::now(),
        }
    }

    /// The "nothing cached" sentinel.
    pub fn empty() -> Self {
        Self::new(String::new(), 0)
    }

    /// Whether this is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Absolute deadline derived from the buffered lifetime.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.expires_in)
    }
}

/// Apply the expiry buffer to a raw issuer-reported lifetime.
///
/// Evaluated on the raw value, first match wins:
///
/// | raw seconds      | result        |
/// |------------------|---------------|
/// | > 31_556_952     | fatal         |
/// | > 3600           | raw - 600     |
/// | > 1800           | raw - 300     |
/// | > 300            | raw - 60      |
/// | > 60             | raw - 10      |
/// | otherwise        | fatal         |
///
/// Out-of-range lifetimes are fatal for the attempt, not for the process.
pub fn buffered_expiry(raw: i64) -> Result<i64, TicketError> {
    match raw {
        n if n > MAX_EXPIRES_IN => Err(TicketError::ExpiresInTooLarge(n)),
        n if n > 3600 => Ok(n - 600),
        n if n > 1800 => Ok(n - 300),
        n if n > 300 => Ok(n - 60),
        n if n > 60 => Ok(n - 10),
        n => Err(TicketError::ExpiresInTooSmall(n)),
    }
}
