pub mod prelude;

pub mod revoked_tokens;
pub mod todos;
pub mod users;
