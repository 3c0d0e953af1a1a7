//! Field rules shared by the auth and todo services. Length limits match
//! the column sizes used for users and todos.

pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 100;

pub fn validate_username(username: &str) -> Result<&str, String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err("Username is required".to_string());
    }
    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username must be {MAX_USERNAME_LEN} characters or less"
        ));
    }
    Ok(trimmed)
}

/// Trims and lowercases, so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(format!("Email must be {MAX_EMAIL_LEN} characters or less"));
    }

    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        });
    if !valid || email.chars().any(char::is_whitespace) {
        return Err("Email address is invalid".to_string());
    }

    Ok(email)
}

pub fn validate_password(password: &str) -> Result<&str, String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    Ok(password)
}

pub fn validate_title(title: &str) -> Result<&str, String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title is required".to_string());
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(format!("Title must be {MAX_TITLE_LEN} characters or less"));
    }
    Ok(trimmed)
}
