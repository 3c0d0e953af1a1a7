use uuid::Uuid;

use super::ApiError;

pub fn parse_todo_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::validation(format!("Invalid todo ID: {raw}")))
}
