// RSA key pairs: SubjectPublicKeyInfo PEM public half, PKCS#8 PEM private
// half, PBES2 (PBKDF2-SHA256 + AES-256-CBC) when encrypted.

use ::rsa::pkcs1v15;
use ::rsa::pss;
use ::rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use ::rsa::pkcs1::RsaPublicKey as Pkcs1PublicKey;
use ::rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use pkcs8::der::{Decode, Document};
use pkcs8::{
    pkcs5, EncodePrivateKey, EncodePublicKey, EncryptedPrivateKeyInfo, LineEnding,
    PrivateKeyInfo, SecretDocument, SubjectPublicKeyInfoRef,
};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use super::keytype_for_algorithm;
use super::types::{KeyPair, KeyType, SignatureScheme};
use crate::error::{error_codes, KeyError, KeyResult};
use crate::utils;

const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const PUBLIC_KEY_BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const PUBLIC_KEY_END: &str = "-----END PUBLIC KEY-----";

/// Largest modulus accepted when decoding a public key. Generation is bounded
/// by `Settings` instead.
pub const MAX_DECODED_MODULUS_BITS: usize = 16384;

fn pem_error(artifact: &str, cause: impl ToString) -> KeyError {
    KeyError::decode_error(artifact, &cause.to_string(), error_codes::MALFORMED_PEM)
}

/// Generate an RSA key pair of `bits` bits. `bits` must already be validated.
pub fn generate_with_rng<R: CryptoRng + RngCore>(
    rng: &mut R,
    bits: usize,
    scheme: SignatureScheme,
) -> KeyResult<KeyPair> {
    let private_key = RsaPrivateKey::new(rng, bits).map_err(|e| {
        KeyError::crypto_error("rsa_generate", &e.to_string(), error_codes::KEY_GENERATION_FAILED)
    })?;
    from_private_key(&private_key, scheme)
}

fn from_private_key(private_key: &RsaPrivateKey, scheme: SignatureScheme) -> KeyResult<KeyPair> {
    let public_pem = private_key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| pem_error("RSA public key", e))?;
    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| pem_error("RSA private key", e))?;

    KeyPair::new(KeyType::Rsa, scheme, public_pem, private_pem.to_string())
}

/// The `PUBLIC KEY` block of `text`. Anything around it, such as a private
/// key kept in the same file, is ignored.
fn public_key_block(text: &str) -> &str {
    let Some(start) = text.find(PUBLIC_KEY_BEGIN) else {
        return text.trim();
    };
    let block = &text[start..];
    match block.find(PUBLIC_KEY_END) {
        Some(end) => &block[..end + PUBLIC_KEY_END.len()],
        None => block.trim(),
    }
}

fn parse_public(text: &str) -> KeyResult<RsaPublicKey> {
    let malformed = |cause: String| {
        pem_error(
            "RSA public key",
            format!("Cannot import improperly formatted PEM file: {}", cause),
        )
    };

    let (label, document) =
        Document::from_pem(public_key_block(text)).map_err(|e| malformed(e.to_string()))?;
    if label != PUBLIC_KEY_LABEL {
        return Err(malformed(format!("unexpected PEM label '{}'", label)));
    }
    let spki = SubjectPublicKeyInfoRef::try_from(document.as_bytes())
        .map_err(|e| malformed(e.to_string()))?;

    match keytype_for_algorithm(&spki.algorithm.oid) {
        Some(KeyType::Rsa) => {}
        Some(found) => return Err(KeyError::unexpected_keytype(KeyType::Rsa.as_str(), found.as_str())),
        None => return Err(malformed(format!("unknown key algorithm {}", spki.algorithm.oid))),
    }

    let components = Pkcs1PublicKey::from_der(spki.subject_public_key.raw_bytes())
        .map_err(|e| malformed(e.to_string()))?;
    RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(components.modulus.as_bytes()),
        BigUint::from_bytes_be(components.public_exponent.as_bytes()),
        MAX_DECODED_MODULUS_BITS,
    )
    .map_err(|e| malformed(e.to_string()))
}

/// Decode a SubjectPublicKeyInfo PEM into a public-only key pair. The PEM
/// is re-encoded so the keyid does not depend on incidental whitespace.
pub fn import_public_pem(pem: &str, scheme: SignatureScheme) -> KeyResult<KeyPair> {
    let public_key = parse_public(pem)?;
    let canonical = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| pem_error("RSA public key", e))?;
    KeyPair::new(KeyType::Rsa, scheme, canonical, String::new())
}

/// Decode a private PKCS#8 PEM, decrypting it when `password` is non-empty.
///
/// An encrypted file with an empty password, or a plaintext file with a
/// password, is a cryptographic error. A PKCS#8 key of another algorithm is
/// a format error naming the type found.
pub fn import_private_pem(pem: &str, password: &str, scheme: SignatureScheme) -> KeyResult<KeyPair> {
    let (label, document) =
        SecretDocument::from_pem(pem.trim()).map_err(|e| pem_error("RSA private key", e))?;

    let (der, decrypted) = match label {
        ENCRYPTED_PRIVATE_KEY_LABEL => {
            if password.is_empty() {
                return Err(KeyError::crypto_error(
                    "rsa_import",
                    "Password was not given but private key is encrypted",
                    error_codes::ENCRYPTION_STATE_MISMATCH,
                ));
            }
            let encrypted = EncryptedPrivateKeyInfo::try_from(document.as_bytes())
                .map_err(|e| pem_error("RSA private key", e))?;
            let der = encrypted
                .decrypt(password.as_bytes())
                .map_err(|e| KeyError::decryption_failed(&e.to_string()))?;
            (der, true)
        }
        PRIVATE_KEY_LABEL => {
            if !password.is_empty() {
                return Err(KeyError::crypto_error(
                    "rsa_import",
                    "Password was given but private key is not encrypted",
                    error_codes::ENCRYPTION_STATE_MISMATCH,
                ));
            }
            (document, false)
        }
        other => {
            return Err(pem_error(
                "RSA private key",
                format!("unsupported PEM label '{}'", other),
            ))
        }
    };

    // Garbage from a wrong password occasionally survives the padding check.
    let info = PrivateKeyInfo::try_from(der.as_bytes()).map_err(|e| {
        if decrypted {
            KeyError::decryption_failed(&e.to_string())
        } else {
            pem_error("RSA private key", e)
        }
    })?;

    match keytype_for_algorithm(&info.algorithm.oid) {
        Some(KeyType::Rsa) => {}
        Some(found) => return Err(KeyError::unexpected_keytype(KeyType::Rsa.as_str(), found.as_str())),
        None => {
            return Err(pem_error(
                "RSA private key",
                format!("unknown key algorithm {}", info.algorithm.oid),
            ))
        }
    }

    let private_key = RsaPrivateKey::try_from(info).map_err(|e| pem_error("RSA private key", e))?;
    from_private_key(&private_key, scheme)
}

/// Encrypt an unencrypted PKCS#8 PEM private key with `password`
pub fn encrypt_private_pem(private_pem: &str, password: &str, iterations: u32) -> KeyResult<String> {
    let (_, document) =
        SecretDocument::from_pem(private_pem.trim()).map_err(|e| pem_error("RSA private key", e))?;
    let info =
        PrivateKeyInfo::try_from(document.as_bytes()).map_err(|e| pem_error("RSA private key", e))?;

    let salt = utils::random_bytes(16)?;
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&utils::random_bytes(16)?);

    let encryption_error =
        |e: String| KeyError::crypto_error("rsa_encrypt", &e, error_codes::ENCRYPTION_FAILED);
    let params = pkcs5::pbes2::Parameters::pbkdf2_sha256_aes256cbc(iterations, &salt, &iv)
        .map_err(|e| encryption_error(e.to_string()))?;
    let encrypted = info
        .encrypt_with_params(params, password.as_bytes())
        .map_err(|e| encryption_error(e.to_string()))?;
    let pem = encrypted
        .to_pem(ENCRYPTED_PRIVATE_KEY_LABEL, LineEnding::LF)
        .map_err(|e| encryption_error(e.to_string()))?;

    Ok(pem.to_string())
}

/// Check that the private half, when present, belongs to the public half
pub fn validate_keyval(keypair: &KeyPair) -> KeyResult<()> {
    let public_key = parse_public(&keypair.keyval.public)?;
    if keypair.has_private() {
        let private_key = private_key(keypair)?;
        if private_key.to_public_key() != public_key {
            return Err(KeyError::decode_error(
                "RSA key",
                "private key does not match public key",
                error_codes::MALFORMED_KEYVAL,
            ));
        }
    }
    Ok(())
}

fn private_key(keypair: &KeyPair) -> KeyResult<RsaPrivateKey> {
    use pkcs8::DecodePrivateKey;

    RsaPrivateKey::from_pkcs8_pem(keypair.keyval.private.trim())
        .map_err(|e| pem_error("RSA private key", e))
}

pub fn sign(keypair: &KeyPair, data: &[u8]) -> KeyResult<Vec<u8>> {
    let private_key = private_key(keypair)?;
    let signing_error =
        |e: ::rsa::signature::Error| KeyError::crypto_error("rsa_sign", &e.to_string(), error_codes::SIGNING_FAILED);

    match keypair.scheme {
        SignatureScheme::RsassaPssSha256 => {
            let signing_key = pss::BlindedSigningKey::<Sha256>::new(private_key);
            let signature = signing_key
                .try_sign_with_rng(&mut OsRng, data)
                .map_err(signing_error)?;
            Ok(signature.to_vec())
        }
        SignatureScheme::RsaPkcs1v15Sha256 => {
            let signing_key = pkcs1v15::SigningKey::<Sha256>::new(private_key);
            let signature = signing_key.try_sign(data).map_err(signing_error)?;
            Ok(signature.to_vec())
        }
        other => Err(KeyError::format_error(
            "scheme",
            "an RSA signature scheme",
            other.as_str(),
            error_codes::INVALID_SCHEME,
        )),
    }
}

pub fn verify(keypair: &KeyPair, data: &[u8], signature: &[u8]) -> KeyResult<bool> {
    let public_key = parse_public(&keypair.keyval.public)?;

    let valid = match keypair.scheme {
        SignatureScheme::RsassaPssSha256 => {
            let verifying_key = pss::VerifyingKey::<Sha256>::new(public_key);
            match pss::Signature::try_from(signature) {
                Ok(signature) => verifying_key.verify(data, &signature).is_ok(),
                Err(_) => false,
            }
        }
        SignatureScheme::RsaPkcs1v15Sha256 => {
            let verifying_key = pkcs1v15::VerifyingKey::<Sha256>::new(public_key);
            match pkcs1v15::Signature::try_from(signature) {
                Ok(signature) => verifying_key.verify(data, &signature).is_ok(),
                Err(_) => false,
            }
        }
        other => {
            return Err(KeyError::format_error(
                "scheme",
                "an RSA signature scheme",
                other.as_str(),
                error_codes::INVALID_SCHEME,
            ))
        }
    };
    Ok(valid)
}
