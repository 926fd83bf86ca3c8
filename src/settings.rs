// Configuration shared by generation, persistence and import.
// Passed explicitly; nothing in the crate reads process-wide state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{error_codes, KeyError, KeyResult};
use crate::keys::HashAlgorithm;

/// Recommended RSA modulus size. 3072-bit keys are expected to remain
/// secure well beyond 2030.
pub const DEFAULT_RSA_KEY_BITS: usize = 3072;

/// Smallest RSA modulus accepted for generation
pub const MIN_RSA_KEY_BITS: usize = 2048;

/// Default PBKDF2-HMAC-SHA256 iteration count for the encrypted envelope
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Largest iteration count accepted from an encrypted key file
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Parameters consulted by the key file operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hash algorithms attached to imported Ed25519/ECDSA keys as
    /// `keyid_hash_algorithms`
    pub hash_algorithms: Vec<HashAlgorithm>,
    /// PBKDF2 iterations used when encrypting a private key envelope
    pub pbkdf2_iterations: u32,
    /// Envelopes asking for more PBKDF2 iterations than this are rejected
    /// before any key derivation
    pub max_pbkdf2_iterations: u32,
    /// Lower bound for generated RSA keys
    pub rsa_min_bits: usize,
    /// Optional upper bound for generated RSA keys. Unbounded by default.
    pub rsa_max_bits: Option<usize>,
    /// Modulus size used when the caller does not ask for one
    pub default_rsa_bits: usize,
    /// How many times a mismatched password confirmation is re-prompted
    pub max_password_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hash_algorithms: vec![HashAlgorithm::Sha256, HashAlgorithm::Sha512],
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
            max_pbkdf2_iterations: MAX_PBKDF2_ITERATIONS,
            rsa_min_bits: MIN_RSA_KEY_BITS,
            rsa_max_bits: None,
            default_rsa_bits: DEFAULT_RSA_KEY_BITS,
            max_password_attempts: 3,
        }
    }
}

impl Settings {
    /// Cheaper key strengthening for constrained environments and tests
    pub fn low_resource() -> Self {
        Self {
            pbkdf2_iterations: 10_000,
            default_rsa_bits: MIN_RSA_KEY_BITS,
            ..Self::default()
        }
    }

    /// True when `bits` lies within the configured RSA key size bounds
    pub fn rsa_bits_allowed(&self, bits: usize) -> bool {
        bits >= self.rsa_min_bits && self.rsa_max_bits.map_or(true, |max| bits <= max)
    }

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> KeyResult<Self> {
        let settings: Settings = serde_json::from_str(json).map_err(|e| {
            KeyError::format_error(
                "settings",
                "a settings JSON object",
                &e.to_string(),
                error_codes::INVALID_SETTINGS,
            )
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> KeyResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Reject settings that would make every operation fail later
    pub fn validate(&self) -> KeyResult<()> {
        if self.pbkdf2_iterations == 0 {
            return Err(invalid("pbkdf2_iterations", "a non-zero count", "0"));
        }
        if self.max_pbkdf2_iterations < self.pbkdf2_iterations {
            return Err(invalid(
                "max_pbkdf2_iterations",
                &format!("at least pbkdf2_iterations ({})", self.pbkdf2_iterations),
                &self.max_pbkdf2_iterations.to_string(),
            ));
        }
        if let Some(max) = self.rsa_max_bits {
            if self.rsa_min_bits > max {
                return Err(invalid(
                    "rsa_min_bits",
                    &format!("at most rsa_max_bits ({})", max),
                    &self.rsa_min_bits.to_string(),
                ));
            }
        }
        if !self.rsa_bits_allowed(self.default_rsa_bits) {
            return Err(invalid(
                "default_rsa_bits",
                &format!("an allowed RSA key size, at least {}", self.rsa_min_bits),
                &self.default_rsa_bits.to_string(),
            ));
        }
        if self.max_password_attempts == 0 {
            return Err(invalid("max_password_attempts", "at least 1", "0"));
        }
        Ok(())
    }
}

fn invalid(parameter: &str, expected: &str, actual: &str) -> KeyError {
    KeyError::format_error(parameter, expected, actual, error_codes::INVALID_SETTINGS)
}
