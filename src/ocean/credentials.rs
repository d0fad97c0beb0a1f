use crate::ocean::error::OceanError;
use std::fmt;

pub const USER_VAR: &str = "COPERNICUS_USER";
pub const PASSWORD_VAR: &str = "COPERNICUS_PASS";
pub const SERVICE_URL_VAR: &str = "COPERNICUS_URL";

/// Login for the oceanographic data service.
#[derive(Clone, PartialEq, Eq)]
pub struct OceanCredentials {
    pub username: String,
    pub password: String,
}

impl OceanCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `COPERNICUS_USER` and `COPERNICUS_PASS` from the process environment.
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, OceanError> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Reads the credentials through `source`, treating empty values as unset.
    pub fn from_source<F>(source: F) -> Result<Self, OceanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            source(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(OceanError::MissingCredential(name))
        };
        Ok(Self {
            username: read(USER_VAR)?,
            password: read(PASSWORD_VAR)?,
        })
    }
}

impl fmt::Debug for OceanCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OceanCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Reads the service base URL from `COPERNICUS_URL`.
pub fn service_url_from_env() -> Result<String, OceanError> {
    std::env::var(SERVICE_URL_VAR)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .ok_or(OceanError::MissingServiceUrl(SERVICE_URL_VAR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_reads_both_variables() {
        let credentials =
            OceanCredentials::from_source(source(&[(USER_VAR, "gcruz"), (PASSWORD_VAR, "s3cret")]))
                .unwrap();
        assert_eq!(credentials, OceanCredentials::new("gcruz", "s3cret"));
        assert!(!format!("{:?}", credentials).contains("s3cret"));
    }

    #[test]
    fn test_missing_password_is_reported() {
        let err = OceanCredentials::from_source(source(&[(USER_VAR, "gcruz")])).unwrap_err();
        assert!(matches!(err, OceanError::MissingCredential(PASSWORD_VAR)));
    }

    #[test]
    fn test_blank_user_counts_as_missing() {
        let err =
            OceanCredentials::from_source(source(&[(USER_VAR, "  "), (PASSWORD_VAR, "x")]))
                .unwrap_err();
        assert!(matches!(err, OceanError::MissingCredential(USER_VAR)));
    }
}
