pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, SessionToken, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod todo_service;
pub mod todo_service_impl;
pub use todo_service::{TodoError, TodoService};
pub use todo_service_impl::SeaOrmTodoService;

pub mod validation;
