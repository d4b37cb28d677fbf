//! Request authentication.
//!
//! An [`AuthStrategy`] pairs an [`ApiAuthMethod`] with where the credential
//! comes from: an inline secret, or a list of environment variables tried in
//! order (the first non-empty one wins).

use std::fmt;

use reqwest::header::{HeaderName, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::Deserialize;

use crate::error::AuthError;

/// How a credential is attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiAuthMethod {
    /// `Authorization: Bearer <credential>`.
    BearerToken,
    /// The credential in the named header.
    ApiKey(String),
    /// The credential in the named query parameter.
    QueryParam(String),
    /// HTTP basic auth with the given user name; the credential is the password.
    Basic(String),
    /// No authentication.
    None,
}

/// Authentication settings for an API or endpoint.
///
/// ## Examples
///
/// ```rust
/// use contour::{ApiAuthMethod, AuthStrategy};
///
/// let auth = AuthStrategy::from_env(ApiAuthMethod::BearerToken, ["MY_SERVICE_TOKEN", "MY_TOKEN"]);
/// assert_eq!(auth.env_vars(), ["MY_SERVICE_TOKEN", "MY_TOKEN"]);
///
/// let inline = AuthStrategy::with_secret(ApiAuthMethod::ApiKey("x-api-key".into()), "s3cr3t");
/// assert_eq!(inline.credential().unwrap().as_deref(), Some("s3cr3t"));
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthStrategy {
    #[serde(with = "serde_yaml::with::singleton_map")]
    method: ApiAuthMethod,
    #[serde(default)]
    env: Vec<String>,
    #[serde(default)]
    secret: Option<String>,
}

impl AuthStrategy {
    /// No authentication.
    pub fn none() -> Self {
        Self {
            method: ApiAuthMethod::None,
            env: Vec::new(),
            secret: None,
        }
    }

    /// Reads the credential from the first set variable in `vars`.
    pub fn from_env<I>(method: ApiAuthMethod, vars: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            method,
            env: vars.into_iter().map(Into::into).collect(),
            secret: None,
        }
    }

    /// Uses a fixed credential.
    pub fn with_secret(method: ApiAuthMethod, secret: impl Into<String>) -> Self {
        Self {
            method,
            env: Vec::new(),
            secret: Some(secret.into()),
        }
    }

    /// The attachment method.
    pub fn method(&self) -> &ApiAuthMethod {
        &self.method
    }

    /// Environment variables consulted, in order.
    pub fn env_vars(&self) -> &[String] {
        &self.env
    }

    /// Resolves the credential; `None` when the method needs none.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::MissingCredential`] when no inline secret is set
    /// and none of the environment variables holds a non-empty value.
    pub fn credential(&self) -> Result<Option<String>, AuthError> {
        if self.method == ApiAuthMethod::None {
            return Ok(None);
        }
        if let Some(secret) = &self.secret {
            return Ok(Some(secret.clone()));
        }
        self.env
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .map(Some)
            .ok_or_else(|| AuthError::MissingCredential {
                env_vars: self.env.clone(),
            })
    }

    /// Attaches the credential to a request.
    ///
    /// ## Errors
    ///
    /// Returns an error when the credential is missing or cannot be used as a
    /// header.
    pub fn apply(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        let Some(credential) = self.credential()? else {
            return Ok(request);
        };
        Ok(match &self.method {
            ApiAuthMethod::BearerToken => request.header(AUTHORIZATION, format!("Bearer {credential}")),
            ApiAuthMethod::ApiKey(header) => {
                let name =
                    HeaderName::try_from(header.as_str()).map_err(|_| AuthError::InvalidKeyFormat)?;
                request.header(name, credential)
            }
            ApiAuthMethod::QueryParam(param) => request.query(&[(param.as_str(), credential.as_str())]),
            ApiAuthMethod::Basic(username) => request.basic_auth(username, Some(credential)),
            ApiAuthMethod::None => request,
        })
    }
}

impl Default for AuthStrategy {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStrategy")
            .field("method", &self.method)
            .field("env", &self.env)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
