//! Bearer token verification.

use boardhop_common::{AppError, AppResult, AuthConfig, CallerIdentity};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

/// Turns a bearer token into the identity of the caller.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`. Any failure is [`AppError::Unauthorized`].
    fn verify(&self, token: &str) -> AppResult<CallerIdentity>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// HS256 JWT verifier with optional issuer and audience checks.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from the `auth` config section.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> AppResult<CallerIdentity> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized
        })?;
        if data.claims.sub.is_empty() {
            return Err(AppError::Unauthorized);
        }
        Ok(CallerIdentity::new(data.claims.sub))
    }
}
