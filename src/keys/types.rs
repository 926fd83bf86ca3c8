use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{error_codes, KeyError, KeyResult};
use crate::formats;
use crate::utils;

/// Key algorithms supported by the key file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    #[serde(rename = "rsa")]
    Rsa,
    #[serde(rename = "ed25519")]
    Ed25519,
    #[serde(rename = "ecdsa-sha2-nistp256")]
    EcdsaSha2Nistp256,
}

impl KeyType {
    pub const ALL: [KeyType; 3] = [KeyType::Rsa, KeyType::Ed25519, KeyType::EcdsaSha2Nistp256];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Rsa => "rsa",
            KeyType::Ed25519 => "ed25519",
            KeyType::EcdsaSha2Nistp256 => "ecdsa-sha2-nistp256",
        }
    }

    /// Scheme used when the caller does not name one
    pub fn default_scheme(&self) -> SignatureScheme {
        match self {
            KeyType::Rsa => SignatureScheme::RsassaPssSha256,
            KeyType::Ed25519 => SignatureScheme::Ed25519,
            KeyType::EcdsaSha2Nistp256 => SignatureScheme::EcdsaSha2Nistp256,
        }
    }

    /// Human-readable algorithm name used in password prompts
    pub fn label(&self) -> &'static str {
        match self {
            KeyType::Rsa => "RSA",
            KeyType::Ed25519 => "Ed25519",
            KeyType::EcdsaSha2Nistp256 => "ECDSA",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyType::ALL
            .iter()
            .copied()
            .find(|keytype| keytype.as_str() == s)
            .ok_or_else(|| {
                KeyError::format_error(
                    "keytype",
                    "one of 'rsa', 'ed25519', 'ecdsa-sha2-nistp256'",
                    s,
                    error_codes::UNEXPECTED_KEY_TYPE,
                )
            })
    }
}

/// Signature schemes, each bound to exactly one key type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureScheme {
    #[serde(rename = "rsassa-pss-sha256")]
    RsassaPssSha256,
    #[serde(rename = "rsa-pkcs1v15-sha256")]
    RsaPkcs1v15Sha256,
    #[serde(rename = "ed25519")]
    Ed25519,
    #[serde(rename = "ecdsa-sha2-nistp256")]
    EcdsaSha2Nistp256,
}

impl SignatureScheme {
    pub const ALL: [SignatureScheme; 4] = [
        SignatureScheme::RsassaPssSha256,
        SignatureScheme::RsaPkcs1v15Sha256,
        SignatureScheme::Ed25519,
        SignatureScheme::EcdsaSha2Nistp256,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureScheme::RsassaPssSha256 => "rsassa-pss-sha256",
            SignatureScheme::RsaPkcs1v15Sha256 => "rsa-pkcs1v15-sha256",
            SignatureScheme::Ed25519 => "ed25519",
            SignatureScheme::EcdsaSha2Nistp256 => "ecdsa-sha2-nistp256",
        }
    }

    pub fn keytype(&self) -> KeyType {
        match self {
            SignatureScheme::RsassaPssSha256 | SignatureScheme::RsaPkcs1v15Sha256 => KeyType::Rsa,
            SignatureScheme::Ed25519 => KeyType::Ed25519,
            SignatureScheme::EcdsaSha2Nistp256 => KeyType::EcdsaSha2Nistp256,
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureScheme {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignatureScheme::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| {
                KeyError::format_error(
                    "scheme",
                    "a supported signature scheme",
                    s,
                    error_codes::INVALID_SCHEME,
                )
            })
    }
}

/// Hash algorithms a keyid may be computed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// Public and private halves of a key, in their algorithm-specific encoding.
///
/// `private` is empty when only public material is held. It is wiped when
/// the value is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyVal {
    pub public: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private: String,
}

impl fmt::Debug for KeyVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let private = if self.private.is_empty() { "" } else { "[REDACTED]" };
        f.debug_struct("KeyVal")
            .field("public", &self.public)
            .field("private", &private)
            .finish()
    }
}

/// A key pair (or public key) with its content-derived identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub keytype: KeyType,
    pub scheme: SignatureScheme,
    pub keyid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyid_hash_algorithms: Option<Vec<HashAlgorithm>>,
    pub keyval: KeyVal,
}

#[derive(Serialize)]
struct PublicOnly<'a> {
    public: &'a str,
}

// Field order is the canonical (sorted) order.
#[derive(Serialize)]
struct KeyIdInput<'a> {
    keytype: KeyType,
    keyval: PublicOnly<'a>,
    scheme: SignatureScheme,
}

/// Compute a keyid from public material only
pub fn compute_keyid(
    keytype: KeyType,
    scheme: SignatureScheme,
    public: &str,
    algorithm: HashAlgorithm,
) -> String {
    let input = KeyIdInput {
        keytype,
        keyval: PublicOnly { public },
        scheme,
    };
    // Serializing plain strings and unit enums cannot fail.
    let canonical = serde_json::to_vec(&input).unwrap_or_default();
    utils::to_hex(&algorithm.digest(&canonical))
}

impl KeyPair {
    /// Assemble a key pair and derive its keyid
    pub fn new(
        keytype: KeyType,
        scheme: SignatureScheme,
        public: String,
        private: String,
    ) -> KeyResult<Self> {
        formats::check_scheme(keytype, scheme)?;
        let keyid = compute_keyid(keytype, scheme, &public, HashAlgorithm::Sha256);
        Ok(Self {
            keytype,
            scheme,
            keyid,
            keyid_hash_algorithms: None,
            keyval: KeyVal { public, private },
        })
    }

    /// The keyid of this key computed with another hash algorithm
    pub fn keyid_with(&self, algorithm: HashAlgorithm) -> String {
        compute_keyid(self.keytype, self.scheme, &self.keyval.public, algorithm)
    }

    /// Every keyid this key is known by: the primary one plus one per
    /// attached `keyid_hash_algorithms` entry
    pub fn keyids(&self) -> Vec<String> {
        let mut keyids = vec![self.keyid.clone()];
        for algorithm in self.keyid_hash_algorithms.iter().flatten() {
            let keyid = self.keyid_with(*algorithm);
            if !keyids.contains(&keyid) {
                keyids.push(keyid);
            }
        }
        keyids
    }

    pub fn has_private(&self) -> bool {
        !self.keyval.private.is_empty()
    }

    /// Copy of this key without private material
    pub fn public_only(&self) -> KeyPair {
        KeyPair {
            keytype: self.keytype,
            scheme: self.scheme,
            keyid: self.keyid.clone(),
            keyid_hash_algorithms: self.keyid_hash_algorithms.clone(),
            keyval: KeyVal {
                public: self.keyval.public.clone(),
                private: String::new(),
            },
        }
    }

    /// Public metadata envelope written to `<path>.pub`
    pub fn to_metadata(&self) -> KeyMetadata {
        KeyMetadata {
            keytype: self.keytype,
            scheme: self.scheme,
            keyval: PublicKeyVal {
                public: self.keyval.public.clone(),
            },
        }
    }
}

/// `keyval` of a metadata envelope. Any `private` entry in the source is
/// ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyVal {
    pub public: String,
}

/// Public key metadata: `{keytype, scheme, keyval: {public}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub keytype: KeyType,
    pub scheme: SignatureScheme,
    pub keyval: PublicKeyVal,
}

impl KeyMetadata {
    pub fn to_json(&self) -> KeyResult<String> {
        serde_json::to_string(self).map_err(|e| {
            KeyError::decode_error("key metadata", &e.to_string(), error_codes::MALFORMED_METADATA)
        })
    }

    pub fn from_json(json: &str) -> KeyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A signature over some data, tagged with the signing key's keyid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub keyid: String,
    /// Hex-encoded signature bytes
    pub sig: String,
}
