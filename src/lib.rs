//! Subscription Relay - Stripe webhook receiver
//!
//! Authenticates Stripe webhook deliveries, keeps the user service's premium
//! flag in sync with subscription state, and records every subscription in a
//! local ledger.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
