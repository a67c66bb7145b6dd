//! Connected account handlers for creators.
//!
//! The local row is a cache of Stripe Connect state. It is written when
//! the account is created, on explicit refresh, and by `account.updated`
//! webhooks.

use std::sync::Arc;

use crate::domain::foundation::{CreatorId, DomainError, Timestamp};
use crate::domain::purchase::ConnectedAccount;
use crate::ports::{ConnectedAccountStore, PaymentProvider};

/// Onboarding return targets.
#[derive(Debug, Clone)]
pub struct OnboardingUrls {
    /// Stripe sends the creator here if the link expires.
    pub refresh_url: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct CreateConnectedAccountCommand {
    pub creator_id: CreatorId,
    pub email: Option<String>,
}

/// Account plus the hosted onboarding link to continue setup.
#[derive(Debug, Clone)]
pub struct CreateConnectedAccountResult {
    pub account: ConnectedAccount,
    pub onboarding_url: String,
}

/// Handler that creates (or resumes) Connect onboarding.
///
/// A creator who already has an account gets a fresh onboarding link for
/// it instead of a second account.
pub struct CreateConnectedAccountHandler {
    store: Arc<dyn ConnectedAccountStore>,
    payment_provider: Arc<dyn PaymentProvider>,
    urls: OnboardingUrls,
}

impl CreateConnectedAccountHandler {
    pub fn new(
        store: Arc<dyn ConnectedAccountStore>,
        payment_provider: Arc<dyn PaymentProvider>,
        urls: OnboardingUrls,
    ) -> Self {
        Self {
            store,
            payment_provider,
            urls,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateConnectedAccountCommand,
    ) -> Result<CreateConnectedAccountResult, DomainError> {
        let account = match self.store.find(&cmd.creator_id).await? {
            Some(existing) => existing,
            None => {
                let snapshot = self
                    .payment_provider
                    .create_connected_account(&cmd.creator_id, cmd.email.as_deref())
                    .await?;
                let account =
                    ConnectedAccount::from_snapshot(cmd.creator_id.clone(), &snapshot, Timestamp::now());
                self.store.upsert(&account).await?;
                tracing::info!(
                    creator_id = %cmd.creator_id,
                    account_id = %account.account_id,
                    "Created connected account"
                );
                account
            }
        };

        let onboarding_url = self
            .payment_provider
            .create_account_link(&account.account_id, &self.urls.refresh_url, &self.urls.return_url)
            .await?;

        Ok(CreateConnectedAccountResult {
            account,
            onboarding_url,
        })
    }
}

/// Handler that re-reads the account from Stripe.
pub struct RefreshConnectedAccountHandler {
    store: Arc<dyn ConnectedAccountStore>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl RefreshConnectedAccountHandler {
    pub fn new(store: Arc<dyn ConnectedAccountStore>, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            store,
            payment_provider,
        }
    }

    pub async fn handle(&self, creator_id: &CreatorId) -> Result<ConnectedAccount, DomainError> {
        let cached = self
            .store
            .find(creator_id)
            .await?
            .ok_or_else(|| DomainError::not_found("connected account", creator_id))?;

        let snapshot = self
            .payment_provider
            .retrieve_account(&cached.account_id)
            .await?
            .ok_or_else(|| DomainError::not_found("stripe account", &cached.account_id))?;

        let refreshed = ConnectedAccount::from_snapshot(creator_id.clone(), &snapshot, Timestamp::now());
        self.store.upsert(&refreshed).await?;
        Ok(refreshed)
    }
}

/// Handler for reading the cached account.
pub struct GetConnectedAccountHandler {
    store: Arc<dyn ConnectedAccountStore>,
}

impl GetConnectedAccountHandler {
    pub fn new(store: Arc<dyn ConnectedAccountStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, creator_id: &CreatorId) -> Result<Option<ConnectedAccount>, DomainError> {
        self.store.find(creator_id).await
    }
}
