//! HandleWebhookHandler - Command handler for Stripe subscription webhooks.
//!
//! Authenticates a delivery, then mirrors the subscription change onto the
//! remote user record (premium flag) and the local ledger. The two side
//! effects are independent: each failure is logged and collected in the
//! returned `WebhookOutcome`, and neither changes the acknowledgement.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::subscription::{NewSubscriptionRecord, SubscriptionPatch, SubscriptionStatus};
use crate::domain::webhook::{
    StripeCheckoutSession, StripeEvent, StripeInvoice, StripeSubscription, WebhookError,
    WebhookEventType,
};
use crate::ports::{PaymentProvider, SubscriptionRepository, UserService};

/// Command to handle a webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleWebhookCommand {
    /// Raw request body, byte-for-byte as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value, if the request carried one.
    pub signature: Option<String>,
}

/// What the dispatcher did with an authenticated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    /// Premium granted and ledger entry created or refreshed.
    SubscriptionActivated { subscription_id: String, user_id: String },
    /// Premium set from the new status and ledger status/period synced.
    SubscriptionUpdated {
        subscription_id: String,
        user_id: String,
        is_premium: bool,
    },
    /// Premium revoked and ledger entry marked canceled.
    SubscriptionCanceled { subscription_id: String, user_id: String },
    /// A renewal invoice was paid.
    PaymentSucceeded { subscription_id: String, user_id: String },
    /// A renewal invoice failed.
    PaymentFailed { subscription_id: String, user_id: String },
    /// The subscription carries no `userId` metadata.
    SkippedNoUser { subscription_id: String },
    /// The event references no subscription (e.g. a one-off checkout).
    SkippedNoSubscription,
    /// The referenced subscription could not be fetched.
    SubscriptionUnavailable { subscription_id: String },
    /// Event type the relay does not act on.
    Ignored,
}

/// Side effect a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    SubscriptionLookup,
    PremiumUpdate,
    LedgerWrite,
}

/// A captured side-effect failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    pub effect: SideEffect,
    pub message: String,
}

/// Result of processing one authenticated event.
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    pub event_id: String,
    pub event_type: String,
    pub action: WebhookAction,
    pub failures: Vec<SideEffectFailure>,
}

impl WebhookOutcome {
    fn new(event: &StripeEvent) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            action: WebhookAction::Ignored,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, effect: SideEffect, message: impl Into<String>) {
        self.failures.push(SideEffectFailure {
            effect,
            message: message.into(),
        });
    }

    /// True when every side effect that was attempted succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Handler for Stripe subscription webhooks.
pub struct HandleWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    user_service: Arc<dyn UserService>,
    repository: Arc<dyn SubscriptionRepository>,
    webhook_secret: Option<SecretString>,
}

impl HandleWebhookHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        user_service: Arc<dyn UserService>,
        repository: Arc<dyn SubscriptionRepository>,
        webhook_secret: Option<SecretString>,
    ) -> Self {
        Self {
            payment_provider,
            user_service,
            repository,
            webhook_secret,
        }
    }

    /// Authenticate and dispatch one delivery.
    ///
    /// # Errors
    ///
    /// - `SecretNotConfigured` when no signing secret is set
    /// - `Verification` when the signature or envelope is rejected
    /// - `MalformedSnapshot` when a recognised event's object cannot be decoded
    pub async fn handle(&self, cmd: HandleWebhookCommand) -> Result<WebhookOutcome, WebhookError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::SecretNotConfigured)?;

        let signature = cmd.signature.as_deref().unwrap_or_default();
        let event = self
            .payment_provider
            .verify_and_parse(&cmd.payload, signature, secret)
            .await
            .map_err(|e| WebhookError::Verification(e.to_string()))?;

        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Stripe webhook verified"
        );

        let mut outcome = WebhookOutcome::new(&event);
        match event.parsed_type() {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: StripeCheckoutSession = decode(&event)?;
                self.handle_checkout_completed(&session, &mut outcome).await;
            }
            WebhookEventType::SubscriptionCreated => {
                let subscription: StripeSubscription = decode(&event)?;
                self.activate(&subscription, &mut outcome).await;
            }
            WebhookEventType::SubscriptionUpdated => {
                let subscription: StripeSubscription = decode(&event)?;
                self.handle_subscription_updated(&subscription, &mut outcome)
                    .await;
            }
            WebhookEventType::SubscriptionDeleted => {
                let subscription: StripeSubscription = decode(&event)?;
                self.handle_subscription_deleted(&subscription, &mut outcome)
                    .await;
            }
            WebhookEventType::InvoicePaymentSucceeded => {
                let invoice: StripeInvoice = decode(&event)?;
                self.handle_invoice(&invoice, true, &mut outcome).await;
            }
            WebhookEventType::InvoicePaymentFailed => {
                let invoice: StripeInvoice = decode(&event)?;
                self.handle_invoice(&invoice, false, &mut outcome).await;
            }
            WebhookEventType::Unknown => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Unhandled event type"
                );
            }
        }

        Ok(outcome)
    }

    async fn handle_checkout_completed(
        &self,
        session: &StripeCheckoutSession,
        outcome: &mut WebhookOutcome,
    ) {
        let Some(subscription_id) = session.subscription_id() else {
            outcome.action = WebhookAction::SkippedNoSubscription;
            return;
        };
        if let Some(subscription) = self.fetch_subscription(subscription_id, outcome).await {
            self.activate(&subscription, outcome).await;
        }
    }

    /// Grant premium and create or refresh the ledger entry.
    async fn activate(&self, subscription: &StripeSubscription, outcome: &mut WebhookOutcome) {
        let Some(user_id) = subscription.user_id() else {
            outcome.action = WebhookAction::SkippedNoUser {
                subscription_id: subscription.id.clone(),
            };
            return;
        };

        self.set_premium(user_id, true, &subscription.id, outcome).await;

        let record = NewSubscriptionRecord::new(
            user_id,
            subscription.customer_id().unwrap_or_default(),
            subscription.id.as_str(),
            subscription.price_id(),
        )
        .map(|r| {
            r.with_status(subscription.status)
                .with_period(subscription.billing_period())
                .with_cancel_at_period_end(subscription.cancel_at_period_end)
        });

        match record {
            Ok(record) => {
                if let Err(e) = self.repository.upsert(&record).await {
                    self.ledger_failed(&subscription.id, e.to_string(), outcome);
                }
            }
            Err(e) => self.ledger_failed(&subscription.id, e.to_string(), outcome),
        }

        outcome.action = WebhookAction::SubscriptionActivated {
            subscription_id: subscription.id.clone(),
            user_id: user_id.to_string(),
        };
    }

    async fn handle_subscription_updated(
        &self,
        subscription: &StripeSubscription,
        outcome: &mut WebhookOutcome,
    ) {
        let Some(user_id) = subscription.user_id() else {
            outcome.action = WebhookAction::SkippedNoUser {
                subscription_id: subscription.id.clone(),
            };
            return;
        };

        let is_premium = subscription.status.grants_premium();
        self.set_premium(user_id, is_premium, &subscription.id, outcome)
            .await;
        self.patch_ledger(
            &subscription.id,
            SubscriptionPatch::status_and_period(
                subscription.status,
                subscription.billing_period(),
            ),
            outcome,
        )
        .await;

        outcome.action = WebhookAction::SubscriptionUpdated {
            subscription_id: subscription.id.clone(),
            user_id: user_id.to_string(),
            is_premium,
        };
    }

    async fn handle_subscription_deleted(
        &self,
        subscription: &StripeSubscription,
        outcome: &mut WebhookOutcome,
    ) {
        let Some(user_id) = subscription.user_id() else {
            outcome.action = WebhookAction::SkippedNoUser {
                subscription_id: subscription.id.clone(),
            };
            return;
        };

        self.set_premium(user_id, false, &subscription.id, outcome)
            .await;
        self.patch_ledger(
            &subscription.id,
            SubscriptionPatch::status_only(SubscriptionStatus::Canceled),
            outcome,
        )
        .await;

        outcome.action = WebhookAction::SubscriptionCanceled {
            subscription_id: subscription.id.clone(),
            user_id: user_id.to_string(),
        };
    }

    /// Renewal outcome: `paid` grants premium and marks the entry active,
    /// otherwise premium is revoked and the entry goes past due.
    async fn handle_invoice(&self, invoice: &StripeInvoice, paid: bool, outcome: &mut WebhookOutcome) {
        let Some(subscription_id) = invoice.subscription_id() else {
            outcome.action = WebhookAction::SkippedNoSubscription;
            return;
        };
        let Some(subscription) = self.fetch_subscription(subscription_id, outcome).await else {
            return;
        };
        let Some(user_id) = subscription.user_id() else {
            outcome.action = WebhookAction::SkippedNoUser {
                subscription_id: subscription.id.clone(),
            };
            return;
        };

        let status = if paid {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::PastDue
        };
        self.set_premium(user_id, paid, &subscription.id, outcome).await;
        self.patch_ledger(&subscription.id, SubscriptionPatch::status_only(status), outcome)
            .await;

        let subscription_id = subscription.id.clone();
        let user_id = user_id.to_string();
        outcome.action = if paid {
            WebhookAction::PaymentSucceeded {
                subscription_id,
                user_id,
            }
        } else {
            WebhookAction::PaymentFailed {
                subscription_id,
                user_id,
            }
        };
    }

    async fn fetch_subscription(
        &self,
        subscription_id: &str,
        outcome: &mut WebhookOutcome,
    ) -> Option<StripeSubscription> {
        match self
            .payment_provider
            .retrieve_subscription(subscription_id)
            .await
        {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::error!(
                    event_id = %outcome.event_id,
                    subscription_id,
                    code = %e.code,
                    retryable = e.retryable,
                    error = %e,
                    "Failed to retrieve subscription"
                );
                outcome.fail(SideEffect::SubscriptionLookup, e.to_string());
                outcome.action = WebhookAction::SubscriptionUnavailable {
                    subscription_id: subscription_id.to_string(),
                };
                None
            }
        }
    }

    async fn set_premium(
        &self,
        user_id: &str,
        is_premium: bool,
        subscription_id: &str,
        outcome: &mut WebhookOutcome,
    ) {
        if let Err(e) = self.user_service.set_premium(user_id, is_premium).await {
            tracing::error!(
                event_id = %outcome.event_id,
                subscription_id,
                user_id,
                is_premium,
                error = %e,
                "Failed to update premium status"
            );
            outcome.fail(SideEffect::PremiumUpdate, e.to_string());
        }
    }

    async fn patch_ledger(
        &self,
        subscription_id: &str,
        patch: SubscriptionPatch,
        outcome: &mut WebhookOutcome,
    ) {
        match self
            .repository
            .update_by_subscription_id(subscription_id, &patch)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(
                    event_id = %outcome.event_id,
                    subscription_id,
                    status = %patch.status,
                    "No ledger entry for subscription"
                );
            }
            Err(e) => self.ledger_failed(subscription_id, e.to_string(), outcome),
        }
    }

    fn ledger_failed(&self, subscription_id: &str, message: String, outcome: &mut WebhookOutcome) {
        tracing::error!(
            event_id = %outcome.event_id,
            subscription_id,
            error = %message,
            "Failed to write subscription ledger"
        );
        outcome.fail(SideEffect::LedgerWrite, message);
    }
}

fn decode<T: serde::de::DeserializeOwned>(event: &StripeEvent) -> Result<T, WebhookError> {
    event.deserialize_object().map_err(|e| {
        tracing::error!(
            event_id = %event.id,
            event_type = %event.event_type,
            error = %e,
            "Error processing webhook"
        );
        WebhookError::malformed_snapshot(event.event_type.clone(), e)
    })
}
