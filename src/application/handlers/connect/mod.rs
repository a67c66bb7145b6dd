//! Connected account handlers for creators.

mod connected_account;

pub use connected_account::{
    CreateConnectedAccountCommand, CreateConnectedAccountHandler, CreateConnectedAccountResult,
    GetConnectedAccountHandler, OnboardingUrls, RefreshConnectedAccountHandler,
};
