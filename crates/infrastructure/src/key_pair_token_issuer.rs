//! Key-pair JWT minting for warehouse authentication.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use frostline_application::TokenIssuer;
use frostline_core::{ConnectorError, ConnectorResult};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

/// Validity window of a minted token.
const TOKEN_VALIDITY_HOURS: i64 = 1;

/// Issues RS256 bearer tokens bound to one warehouse account and user.
///
/// The issuer claim carries the SHA-256 fingerprint of the public key, as
/// the warehouse requires for key-pair authentication. Key material is
/// loaded once at construction; minting itself never touches the
/// filesystem.
pub struct KeyPairTokenIssuer {
    qualified_user: String,
    issuer: String,
    encoding_key: EncodingKey,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    iat: i64,
    exp: i64,
}

impl KeyPairTokenIssuer {
    /// Creates a token issuer from a PKCS#8 RSA private key file.
    pub fn from_pem_file(
        account: &str,
        user: &str,
        private_key_path: &Path,
    ) -> ConnectorResult<Self> {
        let pem = std::fs::read_to_string(private_key_path).map_err(|error| {
            ConnectorError::Validation(format!(
                "cannot read private key file '{}': {error}",
                private_key_path.display()
            ))
        })?;
        Self::from_pem(account, user, &pem)
    }

    /// Creates a token issuer from PKCS#8 RSA private key PEM text.
    pub fn from_pem(account: &str, user: &str, pem: &str) -> ConnectorResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem).map_err(|error| {
            ConnectorError::Validation(format!("invalid PKCS#8 RSA private key: {error}"))
        })?;
        let public_key = RsaPublicKey::from(&private_key);
        let public_key_der = public_key.to_public_key_der().map_err(|error| {
            ConnectorError::Internal(format!("cannot encode public key: {error}"))
        })?;
        let fingerprint = format!(
            "SHA256:{}",
            STANDARD.encode(Sha256::digest(public_key_der.as_bytes()))
        );

        let qualified_user = format!(
            "{}.{}",
            account.to_uppercase(),
            user.to_uppercase()
        );
        let issuer = format!("{qualified_user}.{fingerprint}");
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|error| {
            ConnectorError::Validation(format!("invalid RSA signing key: {error}"))
        })?;

        info!(principal = %qualified_user, "loaded warehouse signing key");
        Ok(Self {
            qualified_user,
            issuer,
            encoding_key,
        })
    }
}

impl TokenIssuer for KeyPairTokenIssuer {
    fn bearer_token(&self) -> ConnectorResult<String> {
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::hours(TOKEN_VALIDITY_HOURS);
        let claims = Claims {
            iss: &self.issuer,
            sub: &self.qualified_user,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|error| {
                ConnectorError::Internal(format!("failed to sign bearer token: {error}"))
            })
    }
}
