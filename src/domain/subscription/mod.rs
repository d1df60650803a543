//! Subscription ledger domain module.
//!
//! # Module Structure
//!
//! - `record` - SubscriptionRecord and its create/patch inputs
//! - `status` - SubscriptionStatus as Stripe reports it

mod record;
mod status;

pub use record::{
    BillingPeriod, NewSubscriptionRecord, SubscriptionPatch, SubscriptionRecord, UNKNOWN_PRICE_ID,
};
pub use status::SubscriptionStatus;
