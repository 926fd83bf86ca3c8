/*!
 * Key pair generation and algorithm dispatch
 *
 * `KeyPair` is the single in-memory representation of RSA, Ed25519 and
 * ECDSA (nistp256) keys. Algorithm-specific work lives in the submodules;
 * this module selects between them with exhaustive matches on `KeyType`.
 */

mod ecdsa;
mod ed25519;
mod rsa;
mod types;

pub use types::*;

use pkcs8::ObjectIdentifier;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::{error_codes, KeyError, KeyResult};
use crate::formats;
use crate::settings::Settings;
use crate::utils;

pub use self::ed25519::KEY_LENGTH as ED25519_SEED_LENGTH;

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// Key type named by a PKCS#8 / SPKI algorithm identifier
pub(crate) fn keytype_for_algorithm(oid: &ObjectIdentifier) -> Option<KeyType> {
    if *oid == RSA_ENCRYPTION_OID {
        Some(KeyType::Rsa)
    } else if *oid == EC_PUBLIC_KEY_OID {
        Some(KeyType::EcdsaSha2Nistp256)
    } else if *oid == ED25519_OID {
        Some(KeyType::Ed25519)
    } else {
        None
    }
}

impl KeyPair {
    /// Generate an RSA key pair after checking `bits` against `settings`
    pub fn generate_rsa(bits: usize, scheme: SignatureScheme, settings: &Settings) -> KeyResult<Self> {
        Self::generate_rsa_with_rng(&mut OsRng, bits, scheme, settings)
    }

    pub fn generate_rsa_with_rng<R: CryptoRng + RngCore>(
        rng: &mut R,
        bits: usize,
        scheme: SignatureScheme,
        settings: &Settings,
    ) -> KeyResult<Self> {
        formats::check_rsa_bits(bits, settings)?;
        formats::check_scheme(KeyType::Rsa, scheme)?;
        rsa::generate_with_rng(rng, bits, scheme)
    }

    pub fn generate_ed25519() -> KeyResult<Self> {
        Self::generate_ed25519_with_rng(&mut OsRng)
    }

    pub fn generate_ed25519_with_rng<R: CryptoRng + RngCore>(rng: &mut R) -> KeyResult<Self> {
        ed25519::generate_with_rng(rng)
    }

    /// Ed25519 key pair derived from a fixed seed
    pub fn ed25519_from_seed(seed: &[u8; ED25519_SEED_LENGTH]) -> KeyResult<Self> {
        ed25519::from_seed(seed)
    }

    pub fn generate_ecdsa() -> KeyResult<Self> {
        Self::generate_ecdsa_with_rng(&mut OsRng)
    }

    pub fn generate_ecdsa_with_rng<R: CryptoRng + RngCore>(rng: &mut R) -> KeyResult<Self> {
        ecdsa::generate_with_rng(rng)
    }

    /// Build a public-only key from a metadata envelope, which must be of
    /// the `expected` type
    pub fn from_metadata(metadata: KeyMetadata, expected: KeyType) -> KeyResult<Self> {
        if metadata.keytype != expected {
            return Err(KeyError::unexpected_keytype(
                expected.as_str(),
                metadata.keytype.as_str(),
            ));
        }
        let keypair = KeyPair::new(
            metadata.keytype,
            metadata.scheme,
            metadata.keyval.public,
            String::new(),
        )?;
        keypair.validate()?;
        Ok(keypair)
    }

    /// Check that the encoded key material decodes for this key type and
    /// that the private half, if any, matches the public half
    pub fn validate(&self) -> KeyResult<()> {
        formats::check_scheme(self.keytype, self.scheme)?;
        match self.keytype {
            KeyType::Rsa => rsa::validate_keyval(self),
            KeyType::Ed25519 => ed25519::validate_keyval(self),
            KeyType::EcdsaSha2Nistp256 => ecdsa::validate_keyval(self),
        }
    }

    /// Sign `data` with the private half under this key's scheme
    pub fn sign(&self, data: &[u8]) -> KeyResult<Signature> {
        if !self.has_private() {
            return Err(KeyError::format_error(
                "keyval.private",
                "private key material",
                "a public-only key",
                error_codes::MISSING_PRIVATE_KEY,
            ));
        }
        let sig = match self.keytype {
            KeyType::Rsa => rsa::sign(self, data)?,
            KeyType::Ed25519 => ed25519::sign(self, data)?,
            KeyType::EcdsaSha2Nistp256 => ecdsa::sign(self, data)?,
        };
        Ok(Signature {
            keyid: self.keyid.clone(),
            sig: utils::to_hex(&sig),
        })
    }

    /// Verify `signature` over `data` against the public half
    pub fn verify(&self, data: &[u8], signature: &Signature) -> KeyResult<bool> {
        let sig = hex::decode(&signature.sig).map_err(|e| {
            KeyError::decode_error("signature", &e.to_string(), error_codes::MALFORMED_SIGNATURE)
        })?;
        match self.keytype {
            KeyType::Rsa => rsa::verify(self, data, &sig),
            KeyType::Ed25519 => ed25519::verify(self, data, &sig),
            KeyType::EcdsaSha2Nistp256 => ecdsa::verify(self, data, &sig),
        }
    }
}

pub(crate) use self::rsa::{
    encrypt_private_pem as rsa_encrypt_private_pem, import_private_pem as rsa_import_private_pem,
    import_public_pem as rsa_import_public_pem,
};
