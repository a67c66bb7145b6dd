//! Purchase handlers.
//!
//! ## Commands
//! - Record a verified purchase and its access grant (webhook only)
//!
//! ## Queries
//! - Check bundle access
//! - List and fetch the caller's purchases

mod check_access;
mod get_purchases;
mod grant_access;

pub use check_access::{CheckAccessHandler, CheckAccessQuery, CheckAccessResult};
pub use get_purchases::{GetPurchaseHandler, GetPurchaseQuery, ListPurchasesHandler, ListPurchasesQuery};
pub use grant_access::{GrantAccessHandler, GrantAccessResult};
