//! HTTP adapters.

pub mod payment;
