//! API key validation for the state-changing endpoints.
//!
//! The expected key is resolved once at startup. When no key is configured the endpoints are open.

/// Header carrying the caller's key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing x-api-key header")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

/// Validates the provided API key against the configured one.
///
/// Returns `Ok(())` if no key is configured or the keys match.
pub fn validate_api_key(provided: Option<&str>, expected: Option<&str>) -> Result<(), AuthError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match provided {
        None => Err(AuthError::Missing),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AuthError::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_when_no_key_configured() {
        assert_eq!(validate_api_key(None, None), Ok(()));
        assert_eq!(validate_api_key(Some("anything"), None), Ok(()));
    }

    #[test]
    fn configured_key_must_match() {
        assert_eq!(validate_api_key(None, Some("k")), Err(AuthError::Missing));
        assert_eq!(validate_api_key(Some("x"), Some("k")), Err(AuthError::Invalid));
        assert_eq!(validate_api_key(Some("k"), Some("k")), Ok(()));
    }
}
