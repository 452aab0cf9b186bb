use std::sync::Arc;

use hkdf::Hkdf;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::AuthConfig;

/// Purpose a token was minted for. Each scope signs with its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenScope {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
    #[serde(rename = "email_token")]
    EmailConfirmation,
    #[serde(rename = "reset_token")]
    PasswordReset,
}

impl TokenScope {
    pub const ALL: [TokenScope; 4] = [
        TokenScope::Access,
        TokenScope::Refresh,
        TokenScope::EmailConfirmation,
        TokenScope::PasswordReset,
    ];

    fn key_info(self) -> &'static [u8] {
        match self {
            TokenScope::Access => b"contacts-server/jwt/access",
            TokenScope::Refresh => b"contacts-server/jwt/refresh",
            TokenScope::EmailConfirmation => b"contacts-server/jwt/email-confirmation",
            TokenScope::PasswordReset => b"contacts-server/jwt/password-reset",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // user email
    pub scope: TokenScope,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token was issued for a different purpose")]
    InvalidTokenKind,
    #[error("token has expired")]
    TokenExpired,
    #[error("token is malformed: {0}")]
    TokenMalformed(String),
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    pub access_secs: i64,
    pub refresh_secs: i64,
    pub confirmation_secs: i64,
    pub reset_secs: i64,
}

impl TokenTtls {
    fn for_scope(&self, scope: TokenScope) -> i64 {
        match scope {
            TokenScope::Access => self.access_secs,
            TokenScope::Refresh => self.refresh_secs,
            TokenScope::EmailConfirmation => self.confirmation_secs,
            TokenScope::PasswordReset => self.reset_secs,
        }
    }
}

impl From<&AuthConfig> for TokenTtls {
    fn from(cfg: &AuthConfig) -> Self {
        Self {
            access_secs: cfg.access_ttl_secs,
            refresh_secs: cfg.refresh_ttl_secs,
            confirmation_secs: cfg.confirmation_ttl_secs,
            reset_secs: cfg.reset_ttl_secs,
        }
    }
}

#[derive(Clone)]
struct JwtKeys {
    enc: EncodingKey,
    dec: DecodingKey,
}

impl JwtKeys {
    fn derive(secret: &[u8], scope: TokenScope) -> anyhow::Result<Self> {
        let mut okm = [0u8; 32];
        Hkdf::<Sha256>::new(None, secret)
            .expand(scope.key_info(), &mut okm)
            .map_err(|err| anyhow::anyhow!("failed to derive {scope:?} signing key: {err}"))?;
        Ok(Self {
            enc: EncodingKey::from_secret(&okm),
            dec: DecodingKey::from_secret(&okm),
        })
    }
}

struct ScopedKeys {
    access: JwtKeys,
    refresh: JwtKeys,
    confirmation: JwtKeys,
    reset: JwtKeys,
}

impl ScopedKeys {
    fn get(&self, scope: TokenScope) -> &JwtKeys {
        match scope {
            TokenScope::Access => &self.access,
            TokenScope::Refresh => &self.refresh,
            TokenScope::EmailConfirmation => &self.confirmation,
            TokenScope::PasswordReset => &self.reset,
        }
    }
}

/// Mints and verifies every JWT the service hands out.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<ScopedKeys>,
    ttls: TokenTtls,
}

impl TokenService {
    pub fn new(secret: &[u8], ttls: TokenTtls) -> anyhow::Result<Self> {
        let keys = ScopedKeys {
            access: JwtKeys::derive(secret, TokenScope::Access)?,
            refresh: JwtKeys::derive(secret, TokenScope::Refresh)?,
            confirmation: JwtKeys::derive(secret, TokenScope::EmailConfirmation)?,
            reset: JwtKeys::derive(secret, TokenScope::PasswordReset)?,
        };
        Ok(Self {
            keys: Arc::new(keys),
            ttls,
        })
    }

    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Self> {
        Self::new(cfg.jwt_secret.as_bytes(), TokenTtls::from(cfg))
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.ttls.access_secs
    }

    pub fn create_access_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenScope::Access)
    }

    pub fn create_refresh_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenScope::Refresh)
    }

    pub fn create_email_confirmation_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenScope::EmailConfirmation)
    }

    pub fn create_password_reset_token(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenScope::PasswordReset)
    }

    pub fn decode_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenScope::Access)
    }

    pub fn decode_refresh_token(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenScope::Refresh).map(|claims| claims.sub)
    }

    pub fn email_from_confirmation_token(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenScope::EmailConfirmation)
            .map(|claims| claims.sub)
    }

    pub fn email_from_reset_token(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenScope::PasswordReset)
            .map(|claims| claims.sub)
    }

    fn issue(&self, subject: &str, scope: TokenScope) -> Result<String, TokenError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            scope,
            iat,
            exp: iat + self.ttls.for_scope(scope),
        };
        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, claims, &self.keys.get(claims.scope).enc)
            .map_err(|err| TokenError::Encoding(err.to_string()))
    }

    fn verify(&self, token: &str, expected: TokenScope) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &self.keys.get(expected).dec, &validation) {
            Ok(data) if data.claims.scope == expected => Ok(data.claims),
            Ok(_) => Err(TokenError::InvalidTokenKind),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::TokenExpired),
                ErrorKind::InvalidSignature if self.signed_for_other_scope(token, expected) => {
                    Err(TokenError::InvalidTokenKind)
                }
                _ => Err(TokenError::TokenMalformed(err.to_string())),
            },
        }
    }

    fn signed_for_other_scope(&self, token: &str, expected: TokenScope) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        TokenScope::ALL
            .into_iter()
            .filter(|scope| *scope != expected)
            .any(|scope| decode::<Claims>(token, &self.keys.get(scope).dec, &validation).is_ok())
    }
}
