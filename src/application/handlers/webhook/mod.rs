//! Webhook handlers.
//!
//! The reconciler is the only path that creates purchases or changes a
//! member's billing state.

mod reconcile_webhook;

pub use reconcile_webhook::{
    ReconcileWebhookCommand, ReconcileWebhookHandler, ReconcileWebhookResult, WebhookAction,
};
