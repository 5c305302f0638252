//! Domain layer: pure types and logic with no I/O.

pub mod foundation;
pub mod subscription;
