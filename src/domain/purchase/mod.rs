//! Purchase module - purchase records, access grants and creator accounts.

mod connected_account;
mod grant;
mod record;
mod status;

pub use connected_account::ConnectedAccount;
pub use grant::PurchaseGrant;
pub use record::{AccessGrant, PurchaseRecord};
pub use status::PurchaseStatus;
