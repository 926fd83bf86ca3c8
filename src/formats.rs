/*!
 * Format validators
 *
 * Gates applied to caller input before any I/O or cryptographic work.
 * Every failure is a `KeyError::FormatError`.
 */

use std::path::Path;

use crate::error::{error_codes, KeyError, KeyResult};
use crate::keys::{KeyType, SignatureScheme};
use crate::settings::Settings;
use crate::utils;

/// A key path must name a file: non-empty and with a final component
pub fn check_path(path: &Path) -> KeyResult<()> {
    if path.as_os_str().is_empty() {
        return Err(KeyError::format_error(
            "filepath",
            "a non-empty path",
            "an empty path",
            error_codes::INVALID_PATH,
        ));
    }
    if path.file_name().is_none() {
        return Err(KeyError::format_error(
            "filepath",
            "a path naming a file",
            &format!("a path ending in '{}'", utils::display_name(path)),
            error_codes::INVALID_PATH,
        ));
    }
    Ok(())
}

/// RSA modulus size must meet the configured minimum, and the maximum when
/// one is set
pub fn check_rsa_bits(bits: usize, settings: &Settings) -> KeyResult<()> {
    if !settings.rsa_bits_allowed(bits) {
        let expected = match settings.rsa_max_bits {
            Some(max) => format!(
                "an RSA key size between {} and {}",
                settings.rsa_min_bits, max
            ),
            None => format!("an RSA key size of at least {}", settings.rsa_min_bits),
        };
        return Err(KeyError::format_error(
            "bits",
            &expected,
            &bits.to_string(),
            error_codes::INVALID_RSA_BITS,
        ));
    }
    Ok(())
}

/// The scheme must belong to the key type it is used with
pub fn check_scheme(keytype: KeyType, scheme: SignatureScheme) -> KeyResult<()> {
    if scheme.keytype() != keytype {
        return Err(KeyError::format_error(
            "scheme",
            &format!("a signature scheme for '{}' keys", keytype),
            scheme.as_str(),
            error_codes::INVALID_SCHEME,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_path() {
        assert!(check_path(Path::new("keys/root")).is_ok());
        assert!(check_path(Path::new("")).is_err());
        assert!(check_path(Path::new("/")).is_err());
        assert!(check_path(Path::new("keys/..")).is_err());
    }

    #[test]
    fn test_check_path_error_hides_directories() {
        let error = check_path(Path::new("/home/alice/secret/keys/..")).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("'..'"));
        assert!(!message.contains("secret"));
        assert!(!message.contains("/home"));
    }

    #[test]
    fn test_check_rsa_bits() {
        let settings = Settings::default();
        assert!(check_rsa_bits(3072, &settings).is_ok());
        assert!(check_rsa_bits(2048, &settings).is_ok());
        assert!(check_rsa_bits(4096, &settings).is_ok());

        match check_rsa_bits(1024, &settings) {
            Err(KeyError::FormatError { error_code, actual, .. }) => {
                assert_eq!(error_code, error_codes::INVALID_RSA_BITS);
                assert_eq!(actual, "1024");
            }
            other => panic!("expected format error, got {:?}", other),
        }
        assert!(check_rsa_bits(6144, &settings).is_ok());
        assert!(check_rsa_bits(8192, &settings).is_ok());

        let capped = Settings {
            rsa_max_bits: Some(4096),
            ..Settings::default()
        };
        assert!(check_rsa_bits(4096, &capped).is_ok());
        assert!(check_rsa_bits(8192, &capped).is_err());
    }

    #[test]
    fn test_check_scheme() {
        assert!(check_scheme(KeyType::Rsa, SignatureScheme::RsassaPssSha256).is_ok());
        assert!(check_scheme(KeyType::Rsa, SignatureScheme::RsaPkcs1v15Sha256).is_ok());
        assert!(check_scheme(KeyType::Ed25519, SignatureScheme::Ed25519).is_ok());
        assert!(check_scheme(KeyType::Rsa, SignatureScheme::Ed25519).is_err());
        assert!(check_scheme(KeyType::EcdsaSha2Nistp256, SignatureScheme::RsassaPssSha256).is_err());
    }
}
