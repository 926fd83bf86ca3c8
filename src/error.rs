/*!
 * Error Handling for key provisioning and persistence
 *
 * Every public operation returns a `KeyResult`. Errors fall into four kinds:
 * malformed input, undecodable content, cryptographic failure and I/O.
 */

use thiserror::Error;

/// Error type for all key generation, persistence and import operations
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid format: {parameter} - expected {expected}, got {actual}")]
    FormatError {
        parameter: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Cannot decode {artifact}: {cause}")]
    DecodeError {
        artifact: String,
        cause: String,
        error_code: u32,
    },

    #[error("Cryptographic operation failed: {operation} - {cause}")]
    CryptoError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Error code constants for the different error categories
pub mod error_codes {
    // Format errors: 1000-1999
    pub const INVALID_PATH: u32 = 1001;
    pub const INVALID_RSA_BITS: u32 = 1002;
    pub const INVALID_SCHEME: u32 = 1003;
    pub const UNEXPECTED_KEY_TYPE: u32 = 1004;
    pub const PASSWORD_MISMATCH: u32 = 1005;
    pub const INVALID_SETTINGS: u32 = 1006;
    pub const MISSING_PRIVATE_KEY: u32 = 1007;

    // Decode errors: 2000-2999
    pub const MALFORMED_PEM: u32 = 2001;
    pub const MALFORMED_METADATA: u32 = 2002;
    pub const MALFORMED_ENVELOPE: u32 = 2003;
    pub const MALFORMED_KEYVAL: u32 = 2004;
    pub const MALFORMED_SIGNATURE: u32 = 2005;

    // Cryptographic errors: 3000-3999
    pub const KEY_GENERATION_FAILED: u32 = 3001;
    pub const ENCRYPTION_FAILED: u32 = 3002;
    pub const DECRYPTION_FAILED: u32 = 3003;
    pub const SIGNING_FAILED: u32 = 3004;
    pub const ENCRYPTION_STATE_MISMATCH: u32 = 3005;
    pub const ENTROPY_UNAVAILABLE: u32 = 3006;

    // I/O errors: 4000-4999
    pub const IO_FAILED: u32 = 4001;
}

impl KeyError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            KeyError::FormatError { error_code, .. } => *error_code,
            KeyError::DecodeError { error_code, .. } => *error_code,
            KeyError::CryptoError { error_code, .. } => *error_code,
            KeyError::IoError(_) => error_codes::IO_FAILED,
        }
    }

    /// Get the error category as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            KeyError::FormatError { .. } => "FormatError",
            KeyError::DecodeError { .. } => "DecodeError",
            KeyError::CryptoError { .. } => "CryptoError",
            KeyError::IoError(_) => "IoError",
        }
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            KeyError::FormatError {
                parameter,
                expected,
                ..
            } => {
                format!(
                    "Invalid value for '{}'. Expected {}.",
                    parameter, expected
                )
            }
            KeyError::DecodeError { artifact, .. } => {
                format!(
                    "'{}' is not a valid key file for the requested key type.",
                    artifact
                )
            }
            KeyError::CryptoError { operation, error_code, .. } => match *error_code {
                error_codes::DECRYPTION_FAILED => {
                    "Decryption failed. The password may be wrong or the key file corrupted."
                        .to_string()
                }
                _ => format!("Cryptographic operation '{}' failed.", operation),
            },
            KeyError::IoError(_) => {
                "Input/output operation failed. Check file permissions and disk space.".to_string()
            }
        }
    }

    /// True when the failure is a wrong password or tampered ciphertext
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            KeyError::CryptoError {
                error_code: error_codes::DECRYPTION_FAILED,
                ..
            }
        )
    }
}

/// Convenience constructors for common error types
impl KeyError {
    pub fn format_error(parameter: &str, expected: &str, actual: &str, error_code: u32) -> Self {
        KeyError::FormatError {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code,
        }
    }

    /// Format error raised when an imported key is not of the requested type
    pub fn unexpected_keytype(expected: &str, found: &str) -> Self {
        KeyError::FormatError {
            parameter: "keytype".to_string(),
            expected: format!("'{}'", expected),
            actual: format!("Invalid key type loaded: '{}'", found),
            error_code: error_codes::UNEXPECTED_KEY_TYPE,
        }
    }

    pub fn decode_error(artifact: &str, cause: &str, error_code: u32) -> Self {
        KeyError::DecodeError {
            artifact: artifact.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn crypto_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KeyError::CryptoError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn decryption_failed(cause: &str) -> Self {
        Self::crypto_error("decrypt", cause, error_codes::DECRYPTION_FAILED)
    }
}

impl From<serde_json::Error> for KeyError {
    fn from(err: serde_json::Error) -> Self {
        KeyError::decode_error("key metadata", &err.to_string(), error_codes::MALFORMED_METADATA)
    }
}

/// Result type alias for key operations
pub type KeyResult<T> = Result<T, KeyError>;
