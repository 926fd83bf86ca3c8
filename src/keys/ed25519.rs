// Ed25519 key pairs: hex-encoded 32-byte verifying key and 32-byte seed.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use super::types::{KeyPair, KeyType, SignatureScheme};
use crate::error::{error_codes, KeyError, KeyResult};
use crate::utils;

pub const KEY_LENGTH: usize = 32;

fn keyval_error(cause: &str) -> KeyError {
    KeyError::decode_error("Ed25519 key", cause, error_codes::MALFORMED_KEYVAL)
}

pub fn generate_with_rng<R: CryptoRng + RngCore>(rng: &mut R) -> KeyResult<KeyPair> {
    let signing_key = SigningKey::generate(rng);
    from_signing_key(&signing_key)
}

/// Deterministic key pair from a 32-byte seed
pub fn from_seed(seed: &[u8; KEY_LENGTH]) -> KeyResult<KeyPair> {
    from_signing_key(&SigningKey::from_bytes(seed))
}

fn from_signing_key(signing_key: &SigningKey) -> KeyResult<KeyPair> {
    let public = utils::to_hex(signing_key.verifying_key().as_bytes());
    let seed = Zeroizing::new(signing_key.to_bytes());
    let private = utils::to_hex(&seed[..]);
    KeyPair::new(KeyType::Ed25519, SignatureScheme::Ed25519, public, private)
}

fn fixed_bytes(what: &str, text: &str) -> KeyResult<Zeroizing<[u8; KEY_LENGTH]>> {
    let decoded = Zeroizing::new(utils::from_hex(what, text)?);
    if decoded.len() != KEY_LENGTH {
        return Err(keyval_error(&format!(
            "{} must be {} bytes, got {}",
            what,
            KEY_LENGTH,
            decoded.len()
        )));
    }
    let mut bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    bytes.copy_from_slice(&decoded);
    Ok(bytes)
}

fn verifying_key(keypair: &KeyPair) -> KeyResult<VerifyingKey> {
    let bytes = fixed_bytes("Ed25519 public key", &keypair.keyval.public)?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| keyval_error(&e.to_string()))
}

fn signing_key(keypair: &KeyPair) -> KeyResult<SigningKey> {
    let seed = fixed_bytes("Ed25519 private key", &keypair.keyval.private)?;
    Ok(SigningKey::from_bytes(&seed))
}

/// Check that the public half is a valid point and the seed, when present,
/// derives it
pub fn validate_keyval(keypair: &KeyPair) -> KeyResult<()> {
    let public_key = verifying_key(keypair)?;
    if keypair.has_private() && signing_key(keypair)?.verifying_key() != public_key {
        return Err(keyval_error("private key does not match public key"));
    }
    Ok(())
}

pub fn sign(keypair: &KeyPair, data: &[u8]) -> KeyResult<Vec<u8>> {
    let signing_key = signing_key(keypair)?;
    let signature = signing_key.try_sign(data).map_err(|e| {
        KeyError::crypto_error("ed25519_sign", &e.to_string(), error_codes::SIGNING_FAILED)
    })?;
    Ok(signature.to_bytes().to_vec())
}

pub fn verify(keypair: &KeyPair, data: &[u8], signature: &[u8]) -> KeyResult<bool> {
    let public_key = verifying_key(keypair)?;
    let valid = match DalekSignature::from_slice(signature) {
        Ok(signature) => public_key.verify(data, &signature).is_ok(),
        Err(_) => false,
    };
    Ok(valid)
}
