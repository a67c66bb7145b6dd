//! Creator Vault - membership, purchases and Stripe reconciliation
//!
//! Backend for a creator content platform: free vs. creator_pro
//! memberships with usage quotas, one-time bundle purchases recorded from
//! Stripe webhooks, creator Connect onboarding and presigned media uploads.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
