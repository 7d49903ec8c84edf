//! Service layer
//!
//! Services hold business rules and talk to storage only through the traits
//! in [`crate::repositories`].

pub mod login;
pub mod marketplace;
pub mod throttle;
pub mod user;
pub mod verifier;

pub use login::LoginService;
pub use marketplace::MarketplaceService;
pub use throttle::{AttemptRecord, AttemptThrottle, ThrottleConfig};
pub use user::UserService;
pub use verifier::{ClientInfo, CredentialVerifier, LoginVerdict};
