/*!
 * Encrypted key envelope for Ed25519 and ECDSA private keys
 *
 * The key JSON is encrypted with AES-256-CTR under a key strengthened from
 * the password with PBKDF2-HMAC-SHA256, and authenticated with an
 * HMAC-SHA256 over the ciphertext.
 */

mod envelope;

pub use envelope::*;
