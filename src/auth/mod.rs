/// Authentication module
///
/// Handles JWT issuing/verification and password hashing.

mod claims;
mod jwt;
mod password;

pub use claims::{Claims, TokenKind};
pub use jwt::{TokenPair, TokenService};
pub use password::{
    hash_password, verify_dummy_password, verify_password, HASH_COST, MAX_PASSWORD_BYTES,
};
