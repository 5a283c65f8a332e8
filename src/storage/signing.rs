use base64::Engine;
use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;
use time::{Duration, OffsetDateTime};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const URL_SAFE_ENGINE: base64::engine::general_purpose::GeneralPurpose =
    base64::engine::general_purpose::GeneralPurpose::new(
        &base64::alphabet::URL_SAFE,
        base64::engine::general_purpose::NO_PAD,
    );

/// Returns the `base64url` encoding of the input.
pub fn b64<T>(to_encode: T) -> String
where
    T: AsRef<[u8]>,
{
    Engine::encode(&URL_SAFE_ENGINE, to_encode)
}

/// Issues and checks time-limited GET URLs for a remote store.
///
/// A signed URL carries `expires` (unix seconds) and `signature`, the
/// `base64url` HMAC-SHA256 of `"<storage key>\n<expires>"`.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new<K: AsRef<[u8]>>(key: K) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(key.as_ref())?,
        })
    }

    pub fn sign(&self, mut url: Url, storage_key: &str, ttl: Duration) -> Url {
        let expires = (OffsetDateTime::now_utc() + ttl).unix_timestamp();
        let signature = b64(self.keyed(storage_key, expires).finalize().into_bytes());

        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);
        url
    }

    /// Checks a URL issued by `sign` for `storage_key` at time `now`.
    pub fn verify(&self, url: &Url, storage_key: &str, now: OffsetDateTime) -> bool {
        let mut expires = None;
        let mut signature = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "expires" => expires = value.parse::<i64>().ok(),
                "signature" => signature = URL_SAFE_ENGINE.decode(value.as_bytes()).ok(),
                _ => {}
            }
        }

        let (Some(expires), Some(signature)) = (expires, signature) else {
            return false;
        };
        if expires < now.unix_timestamp() {
            return false;
        }

        self.keyed(storage_key, expires).verify_slice(&signature).is_ok()
    }

    fn keyed(&self, storage_key: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{storage_key}\n{expires}").as_bytes());
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://objects.example.org/bucket/external/file.txt").unwrap()
    }

    #[test]
    fn signed_url_verifies_until_expiry() {
        let signer = UrlSigner::new("secret").unwrap();
        let url = signer.sign(base(), "external/file.txt", Duration::minutes(5));

        assert!(url.query().unwrap().contains("signature="));
        assert!(signer.verify(&url, "external/file.txt", OffsetDateTime::now_utc()));
        assert!(!signer.verify(
            &url,
            "external/file.txt",
            OffsetDateTime::now_utc() + Duration::minutes(10)
        ));
    }

    #[test]
    fn other_keys_and_secrets_do_not_verify() {
        let signer = UrlSigner::new("secret").unwrap();
        let url = signer.sign(base(), "external/file.txt", Duration::minutes(5));

        assert!(!signer.verify(&url, "external/other.txt", OffsetDateTime::now_utc()));
        assert!(!UrlSigner::new("other").unwrap().verify(&url, "external/file.txt", OffsetDateTime::now_utc()));
    }

    #[test]
    fn tampered_expiry_does_not_verify() {
        let signer = UrlSigner::new("secret").unwrap();
        let url = signer.sign(base(), "k", Duration::minutes(5));

        let mut tampered = base();
        for (name, value) in url.query_pairs() {
            let value = match name.as_ref() {
                "expires" => (value.parse::<i64>().unwrap() + 3600).to_string(),
                _ => value.into_owned(),
            };
            tampered.query_pairs_mut().append_pair(&name, &value);
        }

        assert!(!signer.verify(&tampered, "k", OffsetDateTime::now_utc()));
    }

    #[test]
    fn long_keys_are_hashed_first() {
        let signer = UrlSigner::new([7u8; 100]).unwrap();
        let url = signer.sign(base(), "k", Duration::minutes(1));
        assert!(signer.verify(&url, "k", OffsetDateTime::now_utc()));
    }

    #[test]
    fn signature_is_standard_hmac_sha256() {
        let signer = UrlSigner::new("secret").unwrap();
        assert_eq!(
            b64(signer.keyed("abc", 123).finalize().into_bytes()),
            "VGFepDg07PwckRvKQpAgrhpSu2TZp01iVcGv2A0dwY4"
        );
    }

    #[test]
    fn unsigned_url_does_not_verify() {
        assert!(!UrlSigner::new("secret").unwrap().verify(&base(), "k", OffsetDateTime::now_utc()));
    }
}
