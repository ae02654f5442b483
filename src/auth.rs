use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::AppError};

/// Claims
///
/// Payload carried inside a bearer token. Tokens are HS256-signed with the configured
/// secret and must carry an expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username the token was issued to.
    pub username: String,
    /// Whether the subject holds the admin privilege.
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
}

/// Principal
///
/// The verified identity behind a request. Built once from the token claims and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub subject: String,
    pub is_privileged: bool,
    pub issued_at: DateTime<Utc>,
}

/// Access
///
/// Outcome of credential verification for one request. A missing, malformed, forged or
/// expired credential all produce `Anonymous`; only the guards below turn that into an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Anonymous,
    Authenticated(Principal),
}

/// Grant
///
/// Which branch of [`Access::require_privileged_or_owner`] admitted the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Admin,
    Owner,
}

impl Access {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Access::Authenticated(principal) => Some(principal),
            Access::Anonymous => None,
        }
    }

    /// Admits any verified caller; anonymous callers get `Unauthorized`.
    pub fn require_authenticated(&self) -> Result<&Principal, AppError> {
        self.principal().ok_or_else(AppError::unauthorized)
    }

    /// Admits only callers holding the admin privilege. Anonymous callers are `Forbidden`
    /// here as well; pair with [`Access::require_authenticated`] to answer them with 401.
    pub fn require_privileged(&self) -> Result<&Principal, AppError> {
        match self {
            Access::Authenticated(principal) if principal.is_privileged => Ok(principal),
            _ => Err(AppError::forbidden()),
        }
    }

    /// Admits admins, or a caller whose subject is exactly `target`.
    pub fn require_privileged_or_owner(&self, target: &str) -> Result<Grant, AppError> {
        match self {
            Access::Authenticated(principal) if principal.is_privileged => Ok(Grant::Admin),
            Access::Authenticated(principal) if principal.subject == target => Ok(Grant::Owner),
            _ => Err(AppError::forbidden()),
        }
    }
}

/// derive_access
///
/// Resolves the `Authorization` header value into an [`Access`]. Never fails: every
/// verification problem is logged at debug level and downgraded to `Anonymous`.
pub fn derive_access(authorization: Option<&str>, secret: &str) -> Access {
    let Some(value) = authorization else {
        return Access::Anonymous;
    };

    let Some(token) = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
    else {
        tracing::debug!("authorization header without bearer scheme");
        return Access::Anonymous;
    };

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let claims = match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(reason = ?e.kind(), "bearer token rejected");
            return Access::Anonymous;
        }
    };

    let Some(issued_at) = DateTime::<Utc>::from_timestamp(claims.iat, 0) else {
        tracing::debug!(iat = claims.iat, "bearer token has an unrepresentable iat");
        return Access::Anonymous;
    };

    Access::Authenticated(Principal {
        subject: claims.username,
        is_privileged: claims.is_admin,
        issued_at,
    })
}

/// Access Extractor Implementation
///
/// Makes `Access` usable as a handler argument. The rejection type is `Infallible`:
/// authentication never blocks a request on its own, the route guards decide.
impl<S> FromRequestParts<S> for Access
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        Ok(derive_access(header, &config.jwt_secret))
    }
}
