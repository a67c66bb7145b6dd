//! Payment module - provider events, webhook authentication and
//! reconciliation state.

mod errors;
mod event;
mod processing;
mod signature;

pub use errors::WebhookError;
pub use event::{
    AccountSnapshot, ChargeRefunded, CheckoutCompleted, CheckoutMode, InvoicePaymentFailed,
    PaymentEvent, SubscriptionSnapshot, VerifiedEvent,
};
pub use processing::ProcessingState;
pub use signature::{
    signature_header, SignatureHeader, WebhookVerifier, MAX_CLOCK_SKEW_SECS, MAX_EVENT_AGE_SECS,
};
