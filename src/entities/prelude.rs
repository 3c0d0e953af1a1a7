pub use super::revoked_tokens::Entity as RevokedTokens;
pub use super::todos::Entity as Todos;
pub use super::users::Entity as Users;
