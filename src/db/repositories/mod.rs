pub mod revoked_token;
pub mod todo;
pub mod user;
