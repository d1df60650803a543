//! Subscription repository port (write side).
//!
//! Persists the local subscription ledger. Records are addressed by their
//! Stripe subscription ID, which the store keeps unique.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::{NewSubscriptionRecord, SubscriptionPatch, SubscriptionRecord};

/// Repository port for ledger persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// - `DuplicateKey` if a record with the same Stripe subscription ID exists;
    ///   the existing record is left untouched
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, record: &NewSubscriptionRecord)
        -> Result<SubscriptionRecord, DomainError>;

    /// Create the record, or refresh it if the Stripe subscription ID is known.
    ///
    /// An existing record keeps its identity, owner, customer and price; only
    /// status and period fields are rewritten.
    async fn upsert(&self, record: &NewSubscriptionRecord)
        -> Result<SubscriptionRecord, DomainError>;

    /// Apply a patch to the record with this Stripe subscription ID.
    ///
    /// Returns `None` when no such record exists. Never creates one.
    async fn update_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
        patch: &SubscriptionPatch,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Find a record by its Stripe subscription ID.
    async fn find_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
