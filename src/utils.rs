use std::path::{Path, PathBuf};

use crate::error::{error_codes, KeyError, KeyResult};

/// Generate random bytes of the specified length from the OS entropy source
pub fn random_bytes(length: usize) -> KeyResult<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    getrandom::getrandom(&mut bytes).map_err(|e| {
        KeyError::crypto_error("random_bytes", &e.to_string(), error_codes::ENTROPY_UNAVAILABLE)
    })?;
    Ok(bytes)
}

/// Constant-time comparison of two byte slices to avoid timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

/// Securely compare two potentially sensitive strings in constant time
pub fn secure_compare(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Convert bytes to a lowercase hexadecimal string
pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Convert a hexadecimal string to bytes
pub fn from_hex(what: &str, text: &str) -> KeyResult<Vec<u8>> {
    hex::decode(text).map_err(|e| {
        KeyError::decode_error(what, &format!("invalid hex: {}", e), error_codes::MALFORMED_KEYVAL)
    })
}

/// The final component of `path`, used wherever a path is shown to a user
pub fn display_name(path: &Path) -> String {
    path.components()
        .next_back()
        .map(|last| last.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `path` as printed by the command line tool: relative paths unchanged,
/// absolute ones relative to `base` when below it, otherwise the final
/// component only
pub fn relative_display(path: &Path, base: &Path) -> String {
    if path.is_relative() {
        return path.display().to_string();
    }
    match path.strip_prefix(base) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.display().to_string(),
        _ => display_name(path),
    }
}

/// `<path>.pub`, keeping any dots already present in the file name
pub fn public_key_path(path: &Path) -> PathBuf {
    let mut public = path.as_os_str().to_owned();
    public.push(".pub");
    PathBuf::from(public)
}
