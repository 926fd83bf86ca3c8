// ECDSA nistp256 key pairs: SubjectPublicKeyInfo PEM public half and
// unencrypted PKCS#8 PEM private half.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use p256::{PublicKey, SecretKey};
use rand::{CryptoRng, RngCore};

use super::types::{KeyPair, KeyType, SignatureScheme};
use crate::error::{error_codes, KeyError, KeyResult};

fn keyval_error(cause: impl ToString) -> KeyError {
    KeyError::decode_error("ECDSA key", &cause.to_string(), error_codes::MALFORMED_KEYVAL)
}

pub fn generate_with_rng<R: CryptoRng + RngCore>(rng: &mut R) -> KeyResult<KeyPair> {
    let secret_key = SecretKey::random(rng);
    from_secret_key(&secret_key)
}

fn from_secret_key(secret_key: &SecretKey) -> KeyResult<KeyPair> {
    let public = secret_key
        .public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(keyval_error)?;
    let private = secret_key.to_pkcs8_pem(LineEnding::LF).map_err(keyval_error)?;
    KeyPair::new(
        KeyType::EcdsaSha2Nistp256,
        SignatureScheme::EcdsaSha2Nistp256,
        public,
        private.to_string(),
    )
}

fn public_key(keypair: &KeyPair) -> KeyResult<PublicKey> {
    PublicKey::from_public_key_pem(keypair.keyval.public.trim()).map_err(keyval_error)
}

fn secret_key(keypair: &KeyPair) -> KeyResult<SecretKey> {
    SecretKey::from_pkcs8_pem(keypair.keyval.private.trim()).map_err(keyval_error)
}

/// Check that both PEM halves decode and belong together
pub fn validate_keyval(keypair: &KeyPair) -> KeyResult<()> {
    let public_key = public_key(keypair)?;
    if keypair.has_private() && secret_key(keypair)?.public_key() != public_key {
        return Err(keyval_error("private key does not match public key"));
    }
    Ok(())
}

pub fn sign(keypair: &KeyPair, data: &[u8]) -> KeyResult<Vec<u8>> {
    let signing_key = SigningKey::from(&secret_key(keypair)?);
    let signature: EcdsaSignature = signing_key.try_sign(data).map_err(|e| {
        KeyError::crypto_error("ecdsa_sign", &e.to_string(), error_codes::SIGNING_FAILED)
    })?;
    Ok(signature.to_der().as_bytes().to_vec())
}

pub fn verify(keypair: &KeyPair, data: &[u8], signature: &[u8]) -> KeyResult<bool> {
    let verifying_key = VerifyingKey::from(&public_key(keypair)?);
    let valid = match EcdsaSignature::from_der(signature) {
        Ok(signature) => verifying_key.verify(data, &signature).is_ok(),
        Err(_) => false,
    };
    Ok(valid)
}
