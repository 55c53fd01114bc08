//! Short-lived bearer tokens for the card API

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::CardApiConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Unsupported JWT algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("Token lifetime out of range: {0}")]
    InvalidTtl(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

pub type Result<T> = std::result::Result<T, TokenError>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: i64,
}

/// Signs `{iss, exp}` tokens with a fixed key and algorithm
#[derive(Clone)]
pub struct TokenMinter {
    header: Header,
    key: EncodingKey,
    issuer: Option<String>,
    ttl: TimeDelta,
}

impl TokenMinter {
    /// HMAC algorithms sign with the raw secret; RSA, ECDSA and EdDSA
    /// algorithms expect the secret to be a PEM-encoded private key.
    pub fn new(
        algorithm: &str,
        secret: Option<&str>,
        issuer: Option<String>,
        ttl: Duration,
    ) -> Result<Self> {
        let secret = secret
            .filter(|s| !s.is_empty())
            .ok_or(TokenError::MissingSecret)?;

        let algorithm = Algorithm::from_str(algorithm)
            .map_err(|_| TokenError::UnsupportedAlgorithm(algorithm.to_string()))?;

        let pem = secret.as_bytes();
        let key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                EncodingKey::from_secret(secret.as_bytes())
            }
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => EncodingKey::from_rsa_pem(pem).map_err(TokenError::InvalidKey)?,
            Algorithm::ES256 | Algorithm::ES384 => {
                EncodingKey::from_ec_pem(pem).map_err(TokenError::InvalidKey)?
            }
            Algorithm::EdDSA => EncodingKey::from_ed_pem(pem).map_err(TokenError::InvalidKey)?,
        };

        let requested = ttl;
        let ttl = TimeDelta::from_std(ttl)
            .ok()
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| TokenError::InvalidTtl(format!("{:?}", requested)))?;

        Ok(Self {
            header: Header::new(algorithm),
            key,
            issuer,
            ttl,
        })
    }

    pub fn from_config(config: &CardApiConfig) -> Result<Self> {
        Self::new(
            &config.jwt_algorithm,
            config.jwt_secret.as_deref(),
            config.jwt_issuer.clone(),
            config.token_ttl.as_duration(),
        )
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Mint a token valid for the configured lifetime from now
    pub fn mint(&self) -> Result<String> {
        self.mint_at(Utc::now())
    }

    pub fn mint_at(&self, now: DateTime<Utc>) -> Result<String> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::InvalidTtl(format!("{} past {}", self.ttl, now)))?;

        let claims = Claims {
            iss: self.issuer.clone(),
            exp: exp.timestamp(),
        };

        jsonwebtoken::encode(&self.header, &claims, &self.key).map_err(TokenError::Signing)
    }
}
