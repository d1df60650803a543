//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (timestamps, errors)
//! - `subscription` - Subscription status and the local ledger record
//! - `webhook` - Stripe event envelope, snapshots and signature verification

pub mod foundation;
pub mod subscription;
pub mod webhook;
