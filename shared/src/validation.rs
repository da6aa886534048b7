//! Input validation functions
//!
//! Registration input rules. Login input is deliberately not validated so
//! that malformed and unknown usernames fail the same way.

/// Maximum username length, matching the `users.username` column
pub const USERNAME_MAX_LEN: usize = 50;

/// Validate username format
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(format!(
            "Username must be at most {} characters",
            USERNAME_MAX_LEN
        ));
    }
    if username.chars().any(char::is_whitespace) {
        return Err("Username cannot contain whitespace".to_string());
    }
    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.len() > 128 {
        return Err("Password too long".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice")]
    #[case("bob_42")]
    #[case("j.doe-1")]
    fn test_valid_usernames(#[case] username: &str) {
        assert!(validate_username(username).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("has space")]
    #[case("tab\tname")]
    fn test_invalid_usernames(#[case] username: &str) {
        assert!(validate_username(username).is_err());
    }

    #[test]
    fn test_username_length_limit() {
        assert!(validate_username(&"a".repeat(USERNAME_MAX_LEN)).is_ok());
        assert!(validate_username(&"a".repeat(USERNAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_password_length_limits() {
        assert!(validate_password("").is_err());
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }
}
