//! Groupgate - subscription-gated Telegram group access.
//!
//! Grants and revokes membership in one controlled group based on per-user,
//! time-bounded entitlements: a verified payment notification activates an
//! entitlement and issues a single-use invite, while a background
//! reconciliation loop continuously kicks members whose entitlement has
//! lapsed.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
