use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a presigned token failed verification. Clients only ever see a generic
/// 401; the variant is logged server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token format")]
    InvalidFormat,
    #[error("invalid expiry")]
    InvalidExpiry,
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub filename: String,
    /// Epoch seconds
    pub expires: i64,
}

/// Stateless signed capability tokens binding a filename to a validity
/// window. Wire format: base64url of `"{filename}|{expires}|{hexHmacSha256}"`
/// with the signature computed over `"{filename}|{expires}"`.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).expect("HMAC key")
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Create a token for a given filename with a TTL in seconds.
    pub fn create_token(&self, filename: &str, ttl_secs: i64) -> String {
        let expires = Utc::now().timestamp() + ttl_secs;
        let payload = format!("{}|{}", filename, expires);
        let signature = self.sign(&payload);
        URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature))
    }

    /// Verify a token and return its payload. Signature comparison is
    /// constant-time; expiry is checked only after the signature holds.
    pub fn verify_token(&self, token: &str) -> Result<SignedPayload, TokenError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| TokenError::Malformed)?;
        let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Malformed)?;

        let parts: Vec<&str> = decoded.split('|').collect();
        if parts.len() != 3 {
            return Err(TokenError::InvalidFormat);
        }
        let (filename, expires_str, signature) = (parts[0], parts[1], parts[2]);

        let expires: i64 = expires_str.parse().map_err(|_| TokenError::InvalidExpiry)?;

        let claimed = hex::decode(signature).map_err(|_| TokenError::SignatureMismatch)?;
        let mut mac = self.mac();
        mac.update(format!("{}|{}", filename, expires).as_bytes());
        mac.verify_slice(&claimed)
            .map_err(|_| TokenError::SignatureMismatch)?;

        if Utc::now().timestamp() > expires {
            return Err(TokenError::Expired);
        }

        Ok(SignedPayload {
            filename: filename.to_string(),
            expires,
        })
    }
}
