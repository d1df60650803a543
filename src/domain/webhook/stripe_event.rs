//! Stripe webhook event types.
//!
//! Defines the structures for parsing Stripe webhook payloads.
//! Only fields relevant to our processing are captured; everything else in
//! Stripe's schema is ignored so new API versions keep deserializing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::subscription::{BillingPeriod, SubscriptionStatus, UNKNOWN_PRICE_ID};

/// Metadata key holding the local user identity.
pub const USER_ID_METADATA_KEY: &str = "userId";

/// Stripe webhook event envelope (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    #[serde(default)]
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Attempts to deserialize the data object as `T`.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> WebhookEventType {
        WebhookEventType::parse(&self.event_type)
    }
}

/// Stripe event types the relay acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventType {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    /// Any other type; acknowledged and logged only.
    Unknown,
}

impl WebhookEventType {
    /// Parse event type from string.
    pub fn parse(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// A Stripe reference that is either a bare ID or an expanded object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object(ExpandedObject),
}

/// The part of an expanded object we need.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExpandedObject {
    pub id: String,
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object(obj) => &obj.id,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Snapshots
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer owning this subscription.
    #[serde(default)]
    pub customer: Option<Expandable>,

    pub status: SubscriptionStatus,

    /// Current period start (Unix timestamp).
    #[serde(default)]
    pub current_period_start: Option<i64>,

    /// Current period end (Unix timestamp).
    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    #[serde(default)]
    pub items: StripeSubscriptionItems,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// List wrapper for subscription items.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

/// Single subscription item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    #[serde(default)]
    pub price: Option<StripePrice>,
}

/// Stripe Price object (embedded in subscription items).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePrice {
    pub id: String,
}

impl StripeSubscription {
    /// The local user this subscription belongs to, if tagged.
    ///
    /// An empty value counts as untagged.
    pub fn user_id(&self) -> Option<&str> {
        user_id_from(&self.metadata)
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(Expandable::id)
    }

    /// Price of the first item, or `"unknown"`.
    pub fn price_id(&self) -> &str {
        self.items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.as_str())
            .unwrap_or(UNKNOWN_PRICE_ID)
    }

    pub fn billing_period(&self) -> BillingPeriod {
        BillingPeriod::from_unix(self.current_period_start, self.current_period_end)
    }
}

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    #[serde(default)]
    pub id: String,

    /// `payment`, `setup` or `subscription`.
    #[serde(default)]
    pub mode: Option<String>,

    /// Subscription created by this checkout, if any.
    #[serde(default)]
    pub subscription: Option<Expandable>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeCheckoutSession {
    /// Subscription ID when this was a subscription-mode checkout.
    pub fn subscription_id(&self) -> Option<&str> {
        if self.mode.as_deref() != Some("subscription") {
            return None;
        }
        self.subscription.as_ref().map(Expandable::id)
    }
}

/// Stripe Invoice object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoice {
    /// Unique invoice identifier (in_...).
    #[serde(default)]
    pub id: String,

    /// Subscription billed by this invoice (API versions before 2025-03).
    #[serde(default)]
    pub subscription: Option<Expandable>,

    /// Billing parent (API versions from 2025-03).
    #[serde(default)]
    pub parent: Option<StripeInvoiceParent>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<StripeInvoiceSubscriptionDetails>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoiceSubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<Expandable>,
}

impl StripeInvoice {
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_ref()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|p| p.subscription_details.as_ref())
                    .and_then(|d| d.subscription.as_ref())
            })
            .map(Expandable::id)
    }
}

fn user_id_from(metadata: &HashMap<String, String>) -> Option<&str> {
    metadata
        .get(USER_ID_METADATA_KEY)
        .map(String::as_str)
        .filter(|id| !id.is_empty())
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_envelope() {
        let event: StripeEvent = serde_json::from_value(json!({
            "type": "unknown.event.type",
            "data": { "object": {} }
        }))
        .unwrap();

        assert_eq!(event.parsed_type(), WebhookEventType::Unknown);
        assert!(event.id.is_empty());
        assert!(event.api_version.is_none());
    }

    #[test]
    fn event_type_roundtrips_for_known_types() {
        let known = [
            WebhookEventType::CheckoutSessionCompleted,
            WebhookEventType::SubscriptionCreated,
            WebhookEventType::SubscriptionUpdated,
            WebhookEventType::SubscriptionDeleted,
            WebhookEventType::InvoicePaymentSucceeded,
            WebhookEventType::InvoicePaymentFailed,
        ];
        for ty in known {
            assert_eq!(WebhookEventType::parse(ty.as_str()), ty);
        }
    }

    #[test]
    fn invoice_paid_is_not_payment_succeeded() {
        assert_eq!(WebhookEventType::parse("invoice.paid"), WebhookEventType::Unknown);
    }

    #[test]
    fn subscription_snapshot_extracts_fields() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_test123",
            "metadata": { "userId": "507f1f77bcf86cd799439011" },
            "customer": "cus_test123",
            "items": { "data": [{ "price": { "id": "price_test123" } }] },
            "status": "active",
            "current_period_start": 1234567890,
            "current_period_end": 1234567999,
            "cancel_at_period_end": true
        }))
        .unwrap();

        assert_eq!(sub.user_id(), Some("507f1f77bcf86cd799439011"));
        assert_eq!(sub.customer_id(), Some("cus_test123"));
        assert_eq!(sub.price_id(), "price_test123");
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.cancel_at_period_end);
        let period = sub.billing_period();
        assert_eq!(period.start.map(|t| t.as_unix_secs()), Some(1234567890));
        assert_eq!(period.end.map(|t| t.as_unix_secs()), Some(1234567999));
    }

    #[test]
    fn subscription_snapshot_tolerates_missing_optional_fields() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "past_due",
            "current_period_start": null
        }))
        .unwrap();

        assert_eq!(sub.user_id(), None);
        assert_eq!(sub.customer_id(), None);
        assert_eq!(sub.price_id(), UNKNOWN_PRICE_ID);
        assert_eq!(sub.billing_period(), BillingPeriod::default());
    }

    #[test]
    fn empty_user_id_counts_as_missing() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "active",
            "metadata": { "userId": "" }
        }))
        .unwrap();

        assert_eq!(sub.user_id(), None);
    }

    #[test]
    fn expanded_customer_object_yields_id() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "active",
            "customer": { "id": "cus_expanded", "object": "customer", "email": "a@b.c" }
        }))
        .unwrap();

        assert_eq!(sub.customer_id(), Some("cus_expanded"));
    }

    #[test]
    fn unknown_status_fails_to_decode() {
        let result: Result<StripeSubscription, _> = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "exploded"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn checkout_subscription_id_requires_subscription_mode() {
        let payment: StripeCheckoutSession = serde_json::from_value(json!({
            "id": "cs_1",
            "mode": "payment",
            "subscription": "sub_1"
        }))
        .unwrap();
        assert_eq!(payment.subscription_id(), None);

        let subscription: StripeCheckoutSession = serde_json::from_value(json!({
            "id": "cs_2",
            "mode": "subscription",
            "subscription": "sub_2"
        }))
        .unwrap();
        assert_eq!(subscription.subscription_id(), Some("sub_2"));
    }

    #[test]
    fn invoice_subscription_from_legacy_field_or_parent() {
        let legacy: StripeInvoice = serde_json::from_value(json!({
            "id": "in_1",
            "subscription": "sub_legacy"
        }))
        .unwrap();
        assert_eq!(legacy.subscription_id(), Some("sub_legacy"));

        let current: StripeInvoice = serde_json::from_value(json!({
            "id": "in_2",
            "parent": {
                "type": "subscription_details",
                "subscription_details": { "subscription": "sub_parent" }
            }
        }))
        .unwrap();
        assert_eq!(current.subscription_id(), Some("sub_parent"));

        let none: StripeInvoice = serde_json::from_value(json!({ "id": "in_3" })).unwrap();
        assert_eq!(none.subscription_id(), None);
    }

    #[test]
    fn deserialize_object_decodes_snapshot() {
        let event = StripeEventBuilder::new()
            .id("evt_9")
            .event_type("customer.subscription.deleted")
            .object(json!({ "id": "sub_9", "status": "canceled" }))
            .build();

        let sub: StripeSubscription = event.deserialize_object().unwrap();
        assert_eq!(sub.id, "sub_9");
        assert_eq!(event.id, "evt_9");
        assert_eq!(event.parsed_type(), WebhookEventType::SubscriptionDeleted);
    }
}
