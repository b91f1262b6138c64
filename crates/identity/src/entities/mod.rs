//! Domain entities and value objects.

pub mod events;
pub mod permission;
pub mod role;
pub mod session;
pub mod user;
pub mod values;

pub use events::DomainEvent;
pub use permission::Permission;
pub use role::Role;
pub use session::{Session, SessionStatus};
pub use user::{User, UserStatus, UserToken, BAN_WINDOW_MINUTES, MAX_FAILED_ATTEMPTS};
pub use values::{Device, IpAddress, Media};
