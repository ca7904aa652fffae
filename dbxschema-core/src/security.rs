//! Access token container with automatic memory zeroing.
//!
//! The personal access token parsed out of the DSN is the only secret this
//! tool handles. It lives in a `Zeroizing` buffer and never shows up in
//! `Debug` output.

use zeroize::Zeroizing;

/// Personal access token used as the bearer credential for the warehouse.
///
/// # Example
///
/// ```rust
/// use dbxschema_core::security::AccessToken;
///
/// let token = AccessToken::new("dapi-secret".to_string());
/// assert_eq!(format!("{:?}", token), "AccessToken(****)");
/// assert_eq!(token.expose(), "dapi-secret");
/// ```
#[derive(Clone)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wraps a token; the buffer is zeroed when the value is dropped.
    pub fn new(token: String) -> Self {
        Self(Zeroizing::new(token))
    }

    /// Returns the raw token for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the token is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Builds the bearer header value, also held in zeroizing memory.
    pub fn bearer(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("Bearer {}", self.expose()))
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_shows_token() {
        let token = AccessToken::new("dapi0123456789".to_string());
        let debug = format!("{:?}", token);
        assert!(!debug.contains("dapi0123456789"));
    }

    #[test]
    fn test_bearer_value() {
        let token = AccessToken::new("abc".to_string());
        assert_eq!(token.bearer().as_str(), "Bearer abc");
    }

    #[test]
    fn test_blank_token() {
        assert!(AccessToken::new("  ".to_string()).is_blank());
        assert!(!AccessToken::new("x".to_string()).is_blank());
    }
}
