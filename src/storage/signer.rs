use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::StorageError;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a signed download link, in minutes
pub const SIGNED_URL_TTL_MINUTES: i64 = 15;

/// Issues and checks `/media/{bucket}/{key}?key_id=..&expires=..&signature=..` links
#[derive(Clone)]
pub struct UrlSigner {
    secret: String,
    key_id: String,
    region: String,
    ttl: Duration,
}

/// Query string carried by a signed link
#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub key_id: String,
    pub expires: i64,
    pub signature: String,
}

impl UrlSigner {
    pub fn new(secret: impl Into<String>, key_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            key_id: key_id.into(),
            region: region.into(),
            ttl: Duration::minutes(SIGNED_URL_TTL_MINUTES),
        }
    }

    pub fn sign(&self, bucket: &str, key: &str, now: DateTime<Utc>) -> Result<String, StorageError> {
        let expires = (now + self.ttl).timestamp();
        let signature = hex::encode(self.mac(bucket, key, expires)?.finalize().into_bytes());
        Ok(format!(
            "/media/{}/{}?key_id={}&expires={}&signature={}",
            bucket,
            key,
            url::form_urlencoded::byte_serialize(self.key_id.as_bytes()).collect::<String>(),
            expires,
            signature
        ))
    }

    pub fn verify(&self, bucket: &str, key: &str, query: &SignedQuery, now: DateTime<Utc>) -> Result<(), StorageError> {
        if query.key_id != self.key_id {
            return Err(StorageError::InvalidSignature);
        }
        let provided = hex::decode(&query.signature).map_err(|_| StorageError::InvalidSignature)?;
        self.mac(bucket, key, query.expires)?
            .verify_slice(&provided)
            .map_err(|_| StorageError::InvalidSignature)?;
        if now.timestamp() > query.expires {
            return Err(StorageError::Expired);
        }
        Ok(())
    }

    /// HMAC-SHA256 keyed by the media secret over `region\nbucket/key\nexpires`
    fn mac(&self, bucket: &str, key: &str, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| StorageError::SigningKey(e.to_string()))?;
        mac.update(self.region.as_bytes());
        mac.update(b"\n");
        mac.update(format!("{}/{}", bucket, key).as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}
