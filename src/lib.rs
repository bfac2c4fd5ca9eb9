//! kiroswitch: account manager for the Kiro IDE cloud-auth subsystem.
//!
//! Lists, switches, refreshes, and deletes locally stored OAuth token
//! records; mints new ones through the device-authorization flow or by
//! importing an SSO session; queries usage quotas; and composes the
//! fingerprint-spoof script used during automated registration.
//!
//! # Quick start
//!
//! ```no_run
//! use kiroswitch::token::{TokenService, TokenStore};
//!
//! # async fn example() {
//! let store = TokenStore::new("/home/user/.kiroswitch/tokens");
//! let service = TokenService::new(store, "/home/user/.config/kiro/auth.json");
//! for token in service.list() {
//!     println!("{}", token.record.account_name);
//! }
//! # }
//! ```

pub mod browser;
pub mod build_info;
pub mod config;
pub mod kiro;
pub mod mail;
pub mod oauth;
pub mod quota;
pub mod register;
pub mod spoof;
pub mod sso;
pub mod token;
