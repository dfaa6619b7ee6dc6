use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs broker requests with HMAC-SHA256 over `timestamp + method + path + body`,
/// keyed by the base64-decoded API secret.
#[derive(Clone)]
pub struct RequestSigner {
    key: Vec<u8>,
}

impl RequestSigner {
    pub fn new(secret_b64: &str) -> Result<Self> {
        let secret = secret_b64.trim();
        if secret.is_empty() {
            return Err(Error::config("api secret must be set"));
        }
        let key = STANDARD
            .decode(secret)
            .map_err(|err| Error::config(format!("api secret is not valid base64: {err}")))?;
        Ok(Self { key })
    }

    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<String> {
        let prehash = format!("{timestamp}{method}{request_path}{body}");
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| Error::config("invalid key"))?;
        mac.update(prehash.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Epoch seconds with millisecond precision, e.g. `1641031200.123`.
    pub fn timestamp() -> String {
        let millis = Utc::now().timestamp_millis();
        format!("{}.{:03}", millis.div_euclid(1000), millis.rem_euclid(1000))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner").field("key", &"<redacted>").finish()
    }
}
