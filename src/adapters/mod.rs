//! Adapters - implementations of the ports against real infrastructure,
//! plus in-memory doubles for tests.

pub mod http;
pub mod memory;
pub mod postgres;
pub mod telegram;
