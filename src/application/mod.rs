//! Application layer: command handlers and the reconciliation loop.

pub mod handlers;
pub mod reconciler;
