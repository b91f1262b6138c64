//! Token, password, normalization, and file-storage utilities.

pub mod jwt;
pub mod normalize;
pub mod password;
pub mod storage;

pub use jwt::{Claims, TokenIssuer, ValidatedToken};
pub use storage::AvatarStorage;
