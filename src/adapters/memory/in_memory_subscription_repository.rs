//! In-Memory Subscription Repository
//!
//! Keeps the ledger in a map keyed by Stripe subscription ID, with the same
//! uniqueness and upsert rules as the PostgreSQL adapter. Used by tests and
//! by local runs without a configured database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::subscription::{NewSubscriptionRecord, SubscriptionPatch, SubscriptionRecord};
use crate::ports::SubscriptionRepository;

/// In-memory ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    records: Arc<RwLock<HashMap<String, SubscriptionRecord>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All records, in no particular order
    pub async fn all(&self) -> Vec<SubscriptionRecord> {
        self.records.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert(
        &self,
        record: &NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.stripe_subscription_id) {
            return Err(DomainError::duplicate_key(
                "stripe_subscription_id",
                record.stripe_subscription_id.clone(),
            ));
        }
        let stored = SubscriptionRecord::from_new(record, Timestamp::now());
        records.insert(record.stripe_subscription_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn upsert(
        &self,
        record: &NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, DomainError> {
        let now = Timestamp::now();
        let mut records = self.records.write().await;
        let stored = match records.get_mut(&record.stripe_subscription_id) {
            Some(existing) => {
                existing.apply(
                    &SubscriptionPatch::status_and_period(record.status, record.current_period),
                    now,
                );
                existing.clone()
            }
            None => {
                let created = SubscriptionRecord::from_new(record, now);
                records.insert(record.stripe_subscription_id.clone(), created.clone());
                created
            }
        };
        Ok(stored)
    }

    async fn update_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
        patch: &SubscriptionPatch,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(stripe_subscription_id).map(|existing| {
            existing.apply(patch, Timestamp::now());
            existing.clone()
        }))
    }

    async fn find_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.records.read().await.get(stripe_subscription_id).cloned())
    }
}
