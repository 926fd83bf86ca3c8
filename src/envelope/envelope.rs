use std::num::NonZeroU32;

use aes::cipher::{KeyIvInit, StreamCipher};
use ring::{hmac, pbkdf2};
use zeroize::Zeroizing;

use crate::error::{error_codes, KeyError, KeyResult};
use crate::keys::KeyPair;
use crate::utils;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Separator between the envelope fields
pub const ENCRYPTION_DELIMITER: &str = "@@@@";

/// Size of the PBKDF2 salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of the AES-CTR initial counter block in bytes
pub const IV_SIZE: usize = 16;

/// Size of the derived AES-256 / HMAC key in bytes
pub const DERIVED_KEY_SIZE: usize = 32;

/// Size of an HMAC-SHA256 tag in bytes
pub const HMAC_SIZE: usize = 32;

/// Parsed form of an encrypted envelope:
/// `hex(salt)@@@@iterations@@@@hex(hmac)@@@@hex(iv)@@@@hex(ciphertext)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub hmac: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

fn malformed(cause: &str) -> KeyError {
    KeyError::decode_error("encrypted key", cause, error_codes::MALFORMED_ENVELOPE)
}

fn derive_key(
    password: &str,
    salt: &[u8],
    iterations: NonZeroU32,
) -> Zeroizing<[u8; DERIVED_KEY_SIZE]> {
    let mut derived = Zeroizing::new([0u8; DERIVED_KEY_SIZE]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password.as_bytes(),
        &mut derived[..],
    );
    derived
}

fn apply_keystream(key: &[u8], iv: &[u8], data: &mut [u8]) -> KeyResult<()> {
    let mut cipher = Aes256Ctr::new_from_slices(key, iv).map_err(|e| {
        KeyError::crypto_error("aes_ctr", &e.to_string(), error_codes::ENCRYPTION_FAILED)
    })?;
    cipher.apply_keystream(data);
    Ok(())
}

impl EncryptedEnvelope {
    /// Encrypt `plaintext` under a key strengthened from `password`
    pub fn seal(plaintext: &[u8], password: &str, iterations: u32) -> KeyResult<Self> {
        let rounds = NonZeroU32::new(iterations).ok_or_else(|| {
            KeyError::crypto_error(
                "encrypt",
                "PBKDF2 iteration count must be non-zero",
                error_codes::ENCRYPTION_FAILED,
            )
        })?;
        let salt = utils::random_bytes(SALT_SIZE)?;
        let iv = utils::random_bytes(IV_SIZE)?;
        let key = derive_key(password, &salt, rounds);

        let mut ciphertext = plaintext.to_vec();
        apply_keystream(&key[..], &iv, &mut ciphertext)?;

        let mac_key = hmac::Key::new(hmac::HMAC_SHA256, &key[..]);
        let tag = hmac::sign(&mac_key, &ciphertext);

        Ok(Self {
            salt,
            iterations,
            hmac: tag.as_ref().to_vec(),
            iv,
            ciphertext,
        })
    }

    /// Verify the HMAC and decrypt. A wrong password and a tampered
    /// envelope both surface as a decryption failure.
    pub fn open(&self, password: &str) -> KeyResult<Zeroizing<Vec<u8>>> {
        let rounds = NonZeroU32::new(self.iterations)
            .ok_or_else(|| malformed("PBKDF2 iteration count must be non-zero"))?;
        let key = derive_key(password, &self.salt, rounds);

        let mac_key = hmac::Key::new(hmac::HMAC_SHA256, &key[..]);
        hmac::verify(&mac_key, &self.ciphertext, &self.hmac)
            .map_err(|_| KeyError::decryption_failed("HMAC mismatch"))?;

        let mut plaintext = Zeroizing::new(self.ciphertext.clone());
        apply_keystream(&key[..], &self.iv, &mut plaintext)?;
        Ok(plaintext)
    }

    pub fn encode(&self) -> String {
        [
            utils::to_hex(&self.salt),
            self.iterations.to_string(),
            utils::to_hex(&self.hmac),
            utils::to_hex(&self.iv),
            utils::to_hex(&self.ciphertext),
        ]
        .join(ENCRYPTION_DELIMITER)
    }

    pub fn decode(text: &str) -> KeyResult<Self> {
        let fields: Vec<&str> = text.trim().split(ENCRYPTION_DELIMITER).collect();
        if fields.len() != 5 {
            return Err(malformed(&format!(
                "expected 5 fields separated by '{}', found {}",
                ENCRYPTION_DELIMITER,
                fields.len()
            )));
        }

        let hex_field = |name: &str, value: &str| {
            hex::decode(value).map_err(|e| malformed(&format!("invalid {}: {}", name, e)))
        };
        let salt = hex_field("salt", fields[0])?;
        let iterations: u32 = fields[1]
            .parse()
            .map_err(|_| malformed("invalid iteration count"))?;
        let hmac = hex_field("hmac", fields[2])?;
        let iv = hex_field("iv", fields[3])?;
        let ciphertext = hex_field("ciphertext", fields[4])?;

        if salt.is_empty() || iterations == 0 {
            return Err(malformed("missing key derivation parameters"));
        }
        if iv.len() != IV_SIZE {
            return Err(malformed(&format!("iv must be {} bytes", IV_SIZE)));
        }
        if hmac.len() != HMAC_SIZE {
            return Err(malformed(&format!("hmac must be {} bytes", HMAC_SIZE)));
        }

        Ok(Self {
            salt,
            iterations,
            hmac,
            iv,
            ciphertext,
        })
    }
}

/// Serialize `keypair` (both halves) and encrypt it into envelope text
pub fn encrypt_key(keypair: &KeyPair, password: &str, iterations: u32) -> KeyResult<String> {
    let plaintext = Zeroizing::new(serde_json::to_vec(keypair).map_err(|e| {
        KeyError::crypto_error("encrypt", &e.to_string(), error_codes::ENCRYPTION_FAILED)
    })?);
    let envelope = EncryptedEnvelope::seal(&plaintext, password, iterations)?;
    Ok(envelope.encode())
}

/// Decrypt envelope text and return the key JSON it protects. Envelopes
/// asking for more than `max_iterations` PBKDF2 rounds are rejected before
/// any key derivation.
pub fn decrypt_key(
    text: &str,
    password: &str,
    max_iterations: u32,
) -> KeyResult<Zeroizing<Vec<u8>>> {
    let envelope = EncryptedEnvelope::decode(text)?;
    if envelope.iterations > max_iterations {
        return Err(malformed(&format!(
            "iteration count {} exceeds the limit of {}",
            envelope.iterations, max_iterations
        )));
    }
    envelope.open(password)
}

/// True when `text` has the shape of an encrypted envelope
pub fn looks_encrypted(text: &str) -> bool {
    text.trim().split(ENCRYPTION_DELIMITER).count() == 5
}
