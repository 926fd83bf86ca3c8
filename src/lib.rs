/*!
 * Keysmith: key material provisioning and persistence
 *
 * This crate generates signing key pairs, writes them to disk with the
 * private half optionally encrypted under a password, and imports them
 * again with key type checking.
 *
 * Supported key types:
 *
 * - RSA (RSASSA-PSS or PKCS#1 v1.5 with SHA-256), stored as PEM
 * - Ed25519, stored as JSON key metadata
 * - ECDSA over NIST P-256, stored as JSON key metadata with PEM key values
 *
 * Encrypted RSA keys use PKCS#8 PBES2. Encrypted Ed25519 and ECDSA keys use
 * an AES-256-CTR envelope authenticated with HMAC-SHA256.
 */

/// Common error types
pub mod error;

/// Shared helpers for randomness, hex and file names
pub mod utils;

/// Runtime settings
pub mod settings;

/// Input validation
pub mod formats;

/// Key pair types, generation and signing
pub mod keys;

/// Password-protected envelope for Ed25519 and ECDSA keys
pub mod envelope;

/// Password prompting and confirmation
pub mod password;

/// Writing and importing key files
pub mod storage;

pub use error::{KeyError, KeyResult};
pub use keys::{HashAlgorithm, KeyMetadata, KeyPair, KeyType, KeyVal, Signature, SignatureScheme};
pub use password::{PasswordSource, ScriptedPasswords, TerminalPrompt};
pub use settings::Settings;
pub use storage::KeyFileManager;

/// The types needed to generate, store and import keys.
///
/// ```
/// use keysmith::prelude::*;
///
/// fn main() -> KeyResult<()> {
///     let keypair = KeyPair::generate_ed25519()?;
///     let signature = keypair.sign(b"metadata")?;
///     assert!(keypair.public_only().verify(b"metadata", &signature)?);
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::error::{KeyError, KeyResult};
    pub use crate::keys::{KeyMetadata, KeyPair, KeyType, Signature, SignatureScheme};
    pub use crate::password::{PasswordSource, ScriptedPasswords, TerminalPrompt};
    pub use crate::settings::Settings;
    pub use crate::storage::KeyFileManager;
}
