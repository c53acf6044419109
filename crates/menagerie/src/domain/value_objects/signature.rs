//! SignatureHex - wire form of a raw ECDSA signature

use serde::{Deserialize, Serialize};

/// Length of a raw secp256k1 signature (`r || s`)
pub const RAW_SIGNATURE_LEN: usize = 64;

/// Lowercase hex of a raw signature, exactly `2 * RAW_SIGNATURE_LEN` characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignatureHex(String);

impl SignatureHex {
    /// Accepts only a correctly shaped signature; anything else is rejected
    pub fn parse(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if value.len() != RAW_SIGNATURE_LEN * 2 {
            return Err(format!(
                "expected {} hex characters, got {}",
                RAW_SIGNATURE_LEN * 2,
                value.len()
            ));
        }
        if !value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err("signature must be lowercase hex without separators".to_string());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SignatureHex {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SignatureHex> for String {
    fn from(value: SignatureHex) -> Self {
        value.0
    }
}

impl std::fmt::Display for SignatureHex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        assert!(SignatureHex::parse("ab").is_err());
        assert!(SignatureHex::parse("a".repeat(130)).is_err());
    }

    #[test]
    fn test_rejects_uppercase_and_separators() {
        assert!(SignatureHex::parse("A".repeat(128)).is_err());
        let mut with_sep = "0".repeat(127);
        with_sep.push(':');
        assert!(SignatureHex::parse(with_sep).is_err());
    }

    #[test]
    fn test_accepts_well_formed() {
        let hex = format!("{}{}", "00".repeat(32), "ff".repeat(32));
        let sig = SignatureHex::parse(hex.clone()).unwrap();
        assert_eq!(sig.as_str(), hex);
    }
}
