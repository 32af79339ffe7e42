//! Bearer-token handling for the `Authorization` header.

/// Scheme prefix used by every authenticated request.
pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    #[error("Authorization header must use the Bearer scheme.")]
    InvalidScheme,
    #[error("Invalid token.")]
    InvalidToken,
}

/// Formats the `Authorization` header value for `token`.
pub fn bearer_header_value(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Extracts the token from an `Authorization` header value.
///
/// The scheme name is matched case-insensitively; surrounding whitespace around the
/// token is ignored.
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` when no header was sent,
/// `AuthError::InvalidScheme` for non-Bearer schemes and `AuthError::InvalidToken`
/// when the token part is empty.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?.trim();
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::InvalidScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidScheme);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_round_trips_through_parse() {
        let header = bearer_header_value("abc123");
        assert_eq!(header, "Bearer abc123");
        assert_eq!(parse_bearer(Some(&header)), Ok("abc123"));
    }

    #[test]
    fn test_parse_bearer_accepts_lowercase_scheme() {
        assert_eq!(parse_bearer(Some("bearer  tok ")), Ok("tok"));
    }

    #[test]
    fn test_parse_bearer_rejects_missing_and_foreign_schemes() {
        assert_eq!(parse_bearer(None), Err(AuthError::MissingCredentials));
        assert_eq!(
            parse_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidScheme)
        );
        assert_eq!(parse_bearer(Some("Token")), Err(AuthError::InvalidScheme));
        assert_eq!(parse_bearer(Some("Bearer   ")), Err(AuthError::InvalidScheme));
    }
}
