//! `naslet-auth` — credential utilities.
//!
//! Password hashing, access-token issuance and bearer-token identity
//! extraction. This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod identity;
pub mod password;
pub mod token;

pub use claims::{ClaimsError, TokenClaims, validate_claims};
pub use identity::Identity;
pub use password::{PasswordError, get_password_hash, verify_password};
pub use token::{TokenCodec, TokenError, extract_bearer};
