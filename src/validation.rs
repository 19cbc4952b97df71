use validator::ValidateEmail;

use crate::error::{ApiError, AuthErrorKind, Result};
use crate::token::TokenIssuer;

/// Maximum accepted email length.
pub const MAX_EMAIL_LENGTH: usize = 100;

/// Accepted text body size in characters, inclusive.
pub const MIN_TEXT_LENGTH: usize = 1;
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Validates the identity email supplied on token issuance.
    pub fn validate_email(email: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::Validation("email must not be empty".to_string()));
        }
        if email.chars().count() > MAX_EMAIL_LENGTH {
            return Err(ApiError::Validation(format!(
                "email must be at most {} characters",
                MAX_EMAIL_LENGTH
            )));
        }
        if !email.validate_email() {
            return Err(ApiError::Validation(
                "email is not a valid address".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates the text body submitted for justification.
    pub fn validate_text(text: &str) -> Result<()> {
        let length = text.chars().count();
        if length < MIN_TEXT_LENGTH {
            return Err(ApiError::Validation("text must not be empty".to_string()));
        }
        if length > MAX_TEXT_LENGTH {
            return Err(ApiError::Validation(format!(
                "text must be at most {} characters",
                MAX_TEXT_LENGTH
            )));
        }
        Ok(())
    }

    /// Validates a bearer token's shape; existence is the registry's job.
    pub fn validate_token_format(token: &str) -> Result<()> {
        if !TokenIssuer::validate_format(token) {
            return Err(ApiError::Auth(AuthErrorKind::Malformed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(RequestValidator::validate_email("a@b.com").is_ok());
        assert!(RequestValidator::validate_email("user.name+tag@example.co.uk").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert!(RequestValidator::validate_email("").is_err());
        assert!(RequestValidator::validate_email("   ").is_err());
        assert!(RequestValidator::validate_email("not-an-email").is_err());
        assert!(RequestValidator::validate_email("missing@tld@double.com").is_err());
    }

    #[test]
    fn test_email_length_cap() {
        let local = "a".repeat(MAX_EMAIL_LENGTH);
        let too_long = format!("{local}@example.com");
        assert!(RequestValidator::validate_email(&too_long).is_err());
    }

    #[test]
    fn test_text_bounds() {
        assert!(RequestValidator::validate_text("x").is_ok());
        assert!(RequestValidator::validate_text("").is_err());
        assert!(RequestValidator::validate_text(&"x".repeat(MAX_TEXT_LENGTH)).is_ok());
        assert!(RequestValidator::validate_text(&"x".repeat(MAX_TEXT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_token_format() {
        assert!(RequestValidator::validate_token_format(&"A".repeat(64)).is_ok());
        assert!(matches!(
            RequestValidator::validate_token_format("nope"),
            Err(ApiError::Auth(AuthErrorKind::Malformed))
        ));
    }
}
