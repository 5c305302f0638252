//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! domain and the outside world. Adapters implement these ports.
//!
//! - `UserStore` - durable keyed storage for user records
//! - `GroupDirectory` - the controlled group's live membership/admin API
//! - `InviteNotifier` - best-effort invite delivery to users

mod group_directory;
mod notifier;
mod user_store;

pub use group_directory::{DirectoryError, GroupDirectory, InviteLink, MemberStatus};
pub use notifier::{InviteNotifier, NotifyError};
pub use user_store::{StoreError, UserStore};
