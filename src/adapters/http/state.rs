//! Shared application state for the HTTP layer.
//!
//! Cloned per request; every dependency is an `Arc<dyn Port>` built once
//! at startup. Application handlers are created on demand from it.

use std::sync::Arc;
use std::time::Duration;

use crate::application::handlers::connect::{
    CreateConnectedAccountHandler, GetConnectedAccountHandler, OnboardingUrls,
    RefreshConnectedAccountHandler,
};
use crate::application::handlers::maintenance::{
    BackfillAccessGrantsHandler, MembershipReportHandler, PruneWebhookEventsHandler,
    RefundPurchaseHandler, ResyncMembershipHandler,
};
use crate::application::handlers::media::PresignUploadHandler;
use crate::application::handlers::membership::{
    CheckAndConsumeHandler, CreateBillingPortalHandler, CreateSubscriptionCheckoutHandler,
    EnsureMembershipHandler, SubscriptionCheckoutSettings,
};
use crate::application::handlers::purchase::{
    CheckAccessHandler, GetPurchaseHandler, ListPurchasesHandler,
};
use crate::application::handlers::webhook::ReconcileWebhookHandler;
use crate::domain::membership::FreeTierLimits;
use crate::ports::{
    ConnectedAccountStore, EntitlementStore, MediaStorage, MembershipStore, PaymentProvider,
    WebhookEventRepository,
};

/// Settings the HTTP handlers need beyond the ports.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub free_tier_limits: FreeTierLimits,
    pub checkout: SubscriptionCheckoutSettings,
    pub onboarding: OnboardingUrls,
    pub upload_url_ttl: Duration,
    pub allowed_upload_types: Vec<String>,
    /// Upper bound on processing one webhook delivery.
    pub webhook_timeout: Duration,
}

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct AppState {
    pub memberships: Arc<dyn MembershipStore>,
    pub entitlements: Arc<dyn EntitlementStore>,
    pub accounts: Arc<dyn ConnectedAccountStore>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub media_storage: Arc<dyn MediaStorage>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    // ── membership ──────────────────────────────────────────────────────────

    pub fn ensure_membership_handler(&self) -> EnsureMembershipHandler {
        EnsureMembershipHandler::new(self.memberships.clone())
    }

    pub fn check_and_consume_handler(&self) -> CheckAndConsumeHandler {
        CheckAndConsumeHandler::new(self.memberships.clone(), self.settings.free_tier_limits)
    }

    pub fn subscription_checkout_handler(&self) -> CreateSubscriptionCheckoutHandler {
        CreateSubscriptionCheckoutHandler::new(
            self.memberships.clone(),
            self.payment_provider.clone(),
            self.settings.checkout.clone(),
        )
    }

    pub fn billing_portal_handler(&self) -> CreateBillingPortalHandler {
        CreateBillingPortalHandler::new(
            self.memberships.clone(),
            self.payment_provider.clone(),
            self.settings.checkout.portal_return_url.clone(),
        )
    }

    // ── purchases ───────────────────────────────────────────────────────────

    pub fn list_purchases_handler(&self) -> ListPurchasesHandler {
        ListPurchasesHandler::new(self.entitlements.clone())
    }

    pub fn get_purchase_handler(&self) -> GetPurchaseHandler {
        GetPurchaseHandler::new(self.entitlements.clone())
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.entitlements.clone())
    }

    // ── webhook ─────────────────────────────────────────────────────────────

    pub fn webhook_handler(&self) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(
            self.payment_provider.clone(),
            self.webhook_events.clone(),
            self.memberships.clone(),
            self.entitlements.clone(),
            self.accounts.clone(),
            self.settings.webhook_timeout,
        )
    }

    // ── connect ─────────────────────────────────────────────────────────────

    pub fn create_connected_account_handler(&self) -> CreateConnectedAccountHandler {
        CreateConnectedAccountHandler::new(
            self.accounts.clone(),
            self.payment_provider.clone(),
            self.settings.onboarding.clone(),
        )
    }

    pub fn refresh_connected_account_handler(&self) -> RefreshConnectedAccountHandler {
        RefreshConnectedAccountHandler::new(self.accounts.clone(), self.payment_provider.clone())
    }

    pub fn get_connected_account_handler(&self) -> GetConnectedAccountHandler {
        GetConnectedAccountHandler::new(self.accounts.clone())
    }

    // ── media ───────────────────────────────────────────────────────────────

    pub fn presign_upload_handler(&self) -> PresignUploadHandler {
        PresignUploadHandler::new(
            self.media_storage.clone(),
            self.settings.upload_url_ttl,
            self.settings.allowed_upload_types.clone(),
        )
    }

    // ── admin ───────────────────────────────────────────────────────────────

    pub fn resync_membership_handler(&self) -> ResyncMembershipHandler {
        ResyncMembershipHandler::new(self.memberships.clone(), self.payment_provider.clone())
    }

    pub fn backfill_access_grants_handler(&self) -> BackfillAccessGrantsHandler {
        BackfillAccessGrantsHandler::new(self.entitlements.clone())
    }

    pub fn membership_report_handler(&self) -> MembershipReportHandler {
        MembershipReportHandler::new(self.memberships.clone(), self.entitlements.clone())
    }

    pub fn prune_webhook_events_handler(&self) -> PruneWebhookEventsHandler {
        PruneWebhookEventsHandler::new(self.webhook_events.clone())
    }

    pub fn refund_purchase_handler(&self) -> RefundPurchaseHandler {
        RefundPurchaseHandler::new(self.entitlements.clone(), self.payment_provider.clone())
    }
}
