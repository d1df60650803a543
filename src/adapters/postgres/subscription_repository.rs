//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Persists the subscription ledger in the `subscriptions` table. Uniqueness
//! of `stripe_subscription_id` is enforced by the
//! `subscriptions_stripe_subscription_id_key` constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::{
    BillingPeriod, NewSubscriptionRecord, SubscriptionPatch, SubscriptionRecord,
};
use crate::ports::SubscriptionRepository;

const UNIQUE_SUBSCRIPTION_CONSTRAINT: &str = "subscriptions_stripe_subscription_id_key";

const RETURNING_COLUMNS: &str = "id, user_id, stripe_customer_id, stripe_subscription_id, \
     stripe_price_id, status, current_period_start, current_period_end, \
     cancel_at_period_end, created_at, updated_at";

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new PostgresSubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    stripe_customer_id: String,
    stripe_subscription_id: String,
    stripe_price_id: String,
    status: String,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value in database: {}", e),
            )
        })?;

        Ok(SubscriptionRecord {
            id: row.id,
            user_id: row.user_id,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_price_id: row.stripe_price_id,
            status,
            current_period: BillingPeriod::new(
                row.current_period_start.map(Timestamp::from_datetime),
                row.current_period_end.map(Timestamp::from_datetime),
            ),
            cancel_at_period_end: row.cancel_at_period_end,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn bound(ts: Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

fn database_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {} subscription: {}", action, e),
    )
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert(
        &self,
        record: &NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, DomainError> {
        let now = Utc::now();

        let row: SubscriptionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscriptions (
                id, user_id, stripe_customer_id, stripe_subscription_id, stripe_price_id,
                status, current_period_start, current_period_end, cancel_at_period_end,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&record.user_id)
        .bind(&record.stripe_customer_id)
        .bind(&record.stripe_subscription_id)
        .bind(&record.stripe_price_id)
        .bind(record.status.as_str())
        .bind(bound(record.current_period.start))
        .bind(bound(record.current_period.end))
        .bind(record.cancel_at_period_end)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(UNIQUE_SUBSCRIPTION_CONSTRAINT) {
                    return DomainError::duplicate_key(
                        "stripe_subscription_id",
                        record.stripe_subscription_id.clone(),
                    );
                }
            }
            database_error("insert", e)
        })?;

        SubscriptionRecord::try_from(row)
    }

    async fn upsert(
        &self,
        record: &NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, DomainError> {
        let now = Utc::now();

        let row: SubscriptionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscriptions (
                id, user_id, stripe_customer_id, stripe_subscription_id, stripe_price_id,
                status, current_period_start, current_period_end, cancel_at_period_end,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT (stripe_subscription_id) DO UPDATE SET
                status = EXCLUDED.status,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&record.user_id)
        .bind(&record.stripe_customer_id)
        .bind(&record.stripe_subscription_id)
        .bind(&record.stripe_price_id)
        .bind(record.status.as_str())
        .bind(bound(record.current_period.start))
        .bind(bound(record.current_period.end))
        .bind(record.cancel_at_period_end)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("upsert", e))?;

        SubscriptionRecord::try_from(row)
    }

    async fn update_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
        patch: &SubscriptionPatch,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let period = patch.period.unwrap_or_default();

        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE subscriptions SET
                status = $2,
                current_period_start = CASE WHEN $3 THEN $4 ELSE current_period_start END,
                current_period_end = CASE WHEN $3 THEN $5 ELSE current_period_end END,
                updated_at = $6
            WHERE stripe_subscription_id = $1
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(stripe_subscription_id)
        .bind(patch.status.as_str())
        .bind(patch.period.is_some())
        .bind(bound(period.start))
        .bind(bound(period.end))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("update", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn find_by_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE stripe_subscription_id = $1
            "#,
            RETURNING_COLUMNS
        ))
        .bind(stripe_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::SubscriptionStatus;

    fn row(status: &str) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: "user_1".to_string(),
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: "sub_1".to_string(),
            stripe_price_id: "price_1".to_string(),
            status: status.to_string(),
            current_period_start: Some(now),
            current_period_end: None,
            cancel_at_period_end: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = SubscriptionRecord::try_from(row("past_due")).unwrap();

        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert!(record.current_period.start.is_some());
        assert!(record.current_period.end.is_none());
        assert!(record.cancel_at_period_end);
    }

    #[test]
    fn row_with_unknown_status_is_a_database_error() {
        let err = SubscriptionRecord::try_from(row("cancelled")).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
