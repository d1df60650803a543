//! SubscriptionRecord - the local ledger entry for one Stripe subscription.
//!
//! Records are keyed by `stripe_subscription_id`, which is unique across the
//! ledger. They are created once, then only their status and billing period
//! change. Retirement sets the status to `canceled`; nothing deletes them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::SubscriptionStatus;
use crate::domain::foundation::{Timestamp, ValidationError};

/// Price recorded when a snapshot carries no price item.
pub const UNKNOWN_PRICE_ID: &str = "unknown";

/// Current billing period bounds. Either side may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl BillingPeriod {
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Self { start, end }
    }

    /// Builds a period from Stripe's unix-second fields.
    pub fn from_unix(start: Option<i64>, end: Option<i64>) -> Self {
        Self {
            start: start.and_then(Timestamp::from_unix_secs),
            end: end.and_then(Timestamp::from_unix_secs),
        }
    }
}

/// A persisted subscription ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_price_id: String,
    pub status: SubscriptionStatus,
    pub current_period: BillingPeriod,
    pub cancel_at_period_end: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionRecord {
    /// Materializes a validated new record at the given instant.
    pub fn from_new(new: &NewSubscriptionRecord, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id.clone(),
            stripe_customer_id: new.stripe_customer_id.clone(),
            stripe_subscription_id: new.stripe_subscription_id.clone(),
            stripe_price_id: new.stripe_price_id.clone(),
            status: new.status,
            current_period: new.current_period,
            cancel_at_period_end: new.cancel_at_period_end,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an in-place mutation and bumps `updated_at`.
    pub fn apply(&mut self, patch: &SubscriptionPatch, now: Timestamp) {
        self.status = patch.status;
        if let Some(period) = patch.period {
            self.current_period = period;
        }
        self.updated_at = now;
    }
}

/// Validated input for creating a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscriptionRecord {
    pub user_id: String,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_price_id: String,
    pub status: SubscriptionStatus,
    pub current_period: BillingPeriod,
    pub cancel_at_period_end: bool,
}

impl NewSubscriptionRecord {
    /// Creates a new record input with default status and no period.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` when any identifier is blank.
    pub fn new(
        user_id: impl Into<String>,
        stripe_customer_id: impl Into<String>,
        stripe_subscription_id: impl Into<String>,
        stripe_price_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            user_id: user_id.into(),
            stripe_customer_id: stripe_customer_id.into(),
            stripe_subscription_id: stripe_subscription_id.into(),
            stripe_price_id: stripe_price_id.into(),
            status: SubscriptionStatus::default(),
            current_period: BillingPeriod::default(),
            cancel_at_period_end: false,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_period(mut self, period: BillingPeriod) -> Self {
        self.current_period = period;
        self
    }

    pub fn with_cancel_at_period_end(mut self, cancel_at_period_end: bool) -> Self {
        self.cancel_at_period_end = cancel_at_period_end;
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("user_id", &self.user_id),
            ("stripe_customer_id", &self.stripe_customer_id),
            ("stripe_subscription_id", &self.stripe_subscription_id),
            ("stripe_price_id", &self.stripe_price_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::empty_field(field));
            }
        }
        Ok(())
    }
}

/// In-place mutation of an existing record.
///
/// `period: None` leaves the stored period untouched; `Some` overwrites both
/// bounds, including clearing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub status: SubscriptionStatus,
    pub period: Option<BillingPeriod>,
}

impl SubscriptionPatch {
    pub fn status_only(status: SubscriptionStatus) -> Self {
        Self {
            status,
            period: None,
        }
    }

    pub fn status_and_period(status: SubscriptionStatus, period: BillingPeriod) -> Self {
        Self {
            status,
            period: Some(period),
        }
    }
}
