//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe integration, including:
//! - Webhook signature verification and event decoding
//! - creator_pro checkout and billing portal sessions
//! - Connect accounts for creators
//! - Refunds
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute window)
//! - All secrets are handled via `secrecy::SecretString`

mod mock_payment_provider;
mod stripe_adapter;
mod webhook_types;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider, MOCK_WEBHOOK_SECRET};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
pub use webhook_types::{
    Expandable, StripeAccount, StripeCharge, StripeCheckoutSession, StripeInvoice,
    StripeSubscription, StripeWebhookEvent,
};
