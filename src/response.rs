use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaDetails>,
}

/// Quota context attached to 402 responses so clients can back off.
#[derive(Debug, Serialize)]
pub struct QuotaDetails {
    pub current_usage: u64,
    pub limit: u64,
    pub reset_at: u64,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
            quota: None,
        }
    }

    pub fn from_api_error(err: &ApiError) -> Self {
        match err {
            ApiError::Validation(msg) => Self::new("validation_error", msg, 400),
            ApiError::Auth(kind) => Self::new("auth_error", &kind.to_string(), 401),
            ApiError::QuotaExceeded {
                current_usage,
                limit,
                reset_at,
            } => {
                let mut resp = Self::new(
                    "quota_exceeded",
                    "Daily word quota exceeded for this token",
                    402,
                );
                resp.quota = Some(QuotaDetails {
                    current_usage: *current_usage,
                    limit: *limit,
                    reset_at: *reset_at,
                });
                resp
            }
            ApiError::Internal(_) => Self::new("internal_error", "Internal server error", 500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorKind;

    #[test]
    fn test_quota_details_serialized() {
        let err = ApiError::QuotaExceeded {
            current_usage: 79_999,
            limit: 80_000,
            reset_at: 1_700_000_000,
        };
        let json = serde_json::to_string(&ErrorResponse::from_api_error(&err)).unwrap();
        assert!(json.contains("quota_exceeded"));
        assert!(json.contains("79999"));
        assert!(json.contains("1700000000"));
    }

    #[test]
    fn test_quota_field_omitted_for_other_errors() {
        let err = ApiError::Auth(AuthErrorKind::Expired);
        let json = serde_json::to_string(&ErrorResponse::from_api_error(&err)).unwrap();
        assert!(!json.contains("quota"));
        assert!(json.contains("token expired"));
    }
}
