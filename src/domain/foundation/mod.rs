//! Foundation value objects shared across the domain.

mod ids;
mod timestamp;

pub use ids::{ChatId, UserId};
pub use timestamp::Timestamp;
