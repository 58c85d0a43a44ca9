//! # Auth Module
//!
//! Acquires and persists the delegated credentials used for uploads.
//!
//! The first run is interactive: the consent URL is printed, the user grants
//! access in a browser, and the redirect lands on a local listener. Later
//! runs reuse the persisted token and refresh it silently while the refresh
//! token remains valid.

pub mod flow;
pub mod secret;
pub mod token;

pub use flow::Authenticator;
pub use secret::ClientSecret;
pub use token::{StoredToken, TokenStore};
