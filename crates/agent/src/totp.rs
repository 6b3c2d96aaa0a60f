//! Time-based one-time passwords (RFC 6238)
//!
//! HMAC-SHA1 over the 30-second time step, dynamic truncation to the
//! configured number of digits. Verification accepts the configured number
//! of steps either side of the current one.

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use ops_assistant_config::{constants::security::TOTP_SECRET_BYTES, TotpConfig};
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;
use thiserror::Error;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TotpError {
    #[error("Secret is not valid base32")]
    InvalidSecret,

    #[error("Invalid HMAC key")]
    InvalidKey,

    #[error("Failed to build provisioning URI: {0}")]
    Uri(String),
}

#[derive(Debug, Clone)]
pub struct Totp {
    issuer: String,
    digits: u32,
    period_secs: u64,
    skew: u8,
}

impl Default for Totp {
    fn default() -> Self {
        Self::new(&TotpConfig::default())
    }
}

impl Totp {
    pub fn new(config: &TotpConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            digits: config.digits,
            period_secs: config.period_secs.max(1),
            skew: config.skew,
        }
    }

    /// Fresh random secret, base32 without padding
    pub fn generate_secret(&self) -> String {
        let mut bytes = [0u8; TOTP_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        BASE32_NOPAD.encode(&bytes)
    }

    /// `otpauth://` URI for authenticator apps, scoped to the account
    pub fn provisioning_uri(&self, secret: &str, account: &str) -> Result<String, TotpError> {
        let mut url = Url::parse("otpauth://totp/").map_err(|e| TotpError::Uri(e.to_string()))?;
        url.set_path(&format!("/{}:{}", self.issuer, account));
        url.query_pairs_mut()
            .append_pair("secret", secret)
            .append_pair("issuer", &self.issuer)
            .append_pair("algorithm", "SHA1")
            .append_pair("digits", &self.digits.to_string())
            .append_pair("period", &self.period_secs.to_string());
        Ok(url.to_string())
    }

    /// Code for the time step containing `at`
    pub fn code_at(&self, secret: &str, at: DateTime<Utc>) -> Result<String, TotpError> {
        let key = decode_secret(secret)?;
        self.hotp(&key, self.step(at))
    }

    /// Whether `code` matches any step within the skew window
    pub fn verify(&self, secret: &str, code: &str, at: DateTime<Utc>) -> Result<bool, TotpError> {
        let code = code.trim();
        if code.len() != self.digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }

        let key = decode_secret(secret)?;
        let current = self.step(at);
        let skew = u64::from(self.skew);
        for step in current.saturating_sub(skew)..=current.saturating_add(skew) {
            if constant_time_eq(self.hotp(&key, step)?.as_bytes(), code.as_bytes()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn step(&self, at: DateTime<Utc>) -> u64 {
        u64::try_from(at.timestamp()).unwrap_or(0) / self.period_secs
    }

    fn hotp(&self, key: &[u8], counter: u64) -> Result<String, TotpError> {
        let mut mac = HmacSha1::new_from_slice(key).map_err(|_| TotpError::InvalidKey)?;
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);
        let code = binary % 10u32.pow(self.digits);
        Ok(format!("{:0width$}", code, width = self.digits as usize))
    }
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|_| TotpError::InvalidSecret)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    // RFC 6238 appendix B secret ("12345678901234567890")
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn totp(digits: u32) -> Totp {
        Totp::new(&TotpConfig {
            digits,
            ..TotpConfig::default()
        })
    }

    #[test]
    fn test_rfc_vectors() {
        let totp = totp(8);
        let cases = [
            (59, "94287082"),
            (1_111_111_109, "07081804"),
            (1_234_567_890, "89005924"),
            (2_000_000_000, "69279037"),
        ];
        for (secs, expected) in cases {
            let at = Utc.timestamp_opt(secs, 0).unwrap();
            assert_eq!(totp.code_at(RFC_SECRET, at).unwrap(), expected, "t={}", secs);
        }
    }

    #[test]
    fn test_round_trip_within_skew() {
        let totp = totp(6);
        let secret = totp.generate_secret();
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 15).unwrap();
        let code = totp.code_at(&secret, now).unwrap();

        assert!(totp.verify(&secret, &code, now).unwrap());
        assert!(totp.verify(&secret, &code, now + Duration::seconds(30)).unwrap());
        assert!(totp.verify(&secret, &code, now - Duration::seconds(30)).unwrap());
        assert!(!totp.verify(&secret, &code, now + Duration::seconds(90)).unwrap());
    }

    #[test]
    fn test_rejected_for_other_secret() {
        let totp = totp(6);
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        let code = totp.code_at(RFC_SECRET, now).unwrap();
        let other = totp.generate_secret();
        assert!(!totp.verify(&other, &code, now).unwrap());
    }

    #[test]
    fn test_malformed_input() {
        let totp = totp(6);
        let now = Utc::now();
        assert!(!totp.verify(RFC_SECRET, "12345", now).unwrap());
        assert!(!totp.verify(RFC_SECRET, "12a456", now).unwrap());
        assert_eq!(totp.verify("not base32!", "123456", now), Err(TotpError::InvalidSecret));
    }

    #[test]
    fn test_secret_shape() {
        let secret = totp(6).generate_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
    }

    #[test]
    fn test_provisioning_uri() {
        let uri = totp(6).provisioning_uri("ABCDEF", "jamie@example.com").unwrap();
        assert_eq!(
            uri,
            "otpauth://totp/OpsAssistant:jamie@example.com?secret=ABCDEF\
             &issuer=OpsAssistant&algorithm=SHA1&digits=6&period=30"
        );
    }
}
