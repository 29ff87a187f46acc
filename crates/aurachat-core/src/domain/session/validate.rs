//! Client-side credential validation
//!
//! Mirrors the backend's registration rules so obviously malformed input
//! fails before any network call, with the same messages the API would
//! produce.

/// Validate login form fields
pub(crate) fn validate_login(username: &str, password: &str) -> Result<(), String> {
    if username.trim().is_empty() || password.is_empty() {
        return Err("Username and password are required".to_string());
    }
    Ok(())
}

/// Validate registration form fields
pub(crate) fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), String> {
    if username.is_empty() {
        return Err("username is required".to_string());
    }
    if email.is_empty() {
        return Err("email is required".to_string());
    }
    if password.is_empty() {
        return Err("password is required".to_string());
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }
    if username.len() < 3 || username.len() > 20 {
        return Err("Username must be between 3 and 20 characters".to_string());
    }

    if !is_plausible_email(email) {
        return Err("Invalid email format".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    Ok(())
}

/// Minimal shape check: one `@` with a dotted domain after it
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login_requires_both_fields() {
        assert!(validate_login("alice", "secret1").is_ok());
        assert!(validate_login("", "secret1").is_err());
        assert!(validate_login("alice", "").is_err());
        assert!(validate_login("   ", "secret1").is_err());
    }

    #[test]
    fn test_registration_username_rules() {
        assert!(validate_registration("alice_01", "a@example.com", "secret1").is_ok());
        assert_eq!(
            validate_registration("al", "a@example.com", "secret1").unwrap_err(),
            "Username must be between 3 and 20 characters"
        );
        assert_eq!(
            validate_registration("a".repeat(21).as_str(), "a@example.com", "secret1").unwrap_err(),
            "Username must be between 3 and 20 characters"
        );
        assert_eq!(
            validate_registration("bad name!", "a@example.com", "secret1").unwrap_err(),
            "Username can only contain letters, numbers, and underscores"
        );
    }

    #[test]
    fn test_registration_email_rules() {
        assert!(validate_registration("alice", "alice@mail.example.com", "secret1").is_ok());
        assert_eq!(
            validate_registration("alice", "not-an-email", "secret1").unwrap_err(),
            "Invalid email format"
        );
        assert_eq!(
            validate_registration("alice", "a@nodot", "secret1").unwrap_err(),
            "Invalid email format"
        );
        assert_eq!(
            validate_registration("alice", "@example.com", "secret1").unwrap_err(),
            "Invalid email format"
        );
    }

    #[test]
    fn test_registration_password_rules() {
        assert_eq!(
            validate_registration("alice", "a@example.com", "short").unwrap_err(),
            "Password must be at least 6 characters long"
        );
        assert!(validate_registration("alice", "a@example.com", "longer").is_ok());
    }

    #[test]
    fn test_registration_missing_fields() {
        assert_eq!(
            validate_registration("", "a@example.com", "secret1").unwrap_err(),
            "username is required"
        );
        assert_eq!(
            validate_registration("alice", "", "secret1").unwrap_err(),
            "email is required"
        );
        assert_eq!(
            validate_registration("alice", "a@example.com", "").unwrap_err(),
            "password is required"
        );
    }
}
