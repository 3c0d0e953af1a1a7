//! Session token and password primitives.
//!
//! Tokens are HS256 JWTs carrying the user id; passwords are Argon2id hashes.
//! Neither module touches the database.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::Claims;
pub use token::{IssuedToken, TokenCodec, TokenRejection, VerifiedToken};
