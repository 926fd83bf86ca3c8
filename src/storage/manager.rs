use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::envelope;
use crate::error::{error_codes, KeyError, KeyResult};
use crate::formats;
use crate::keys::{
    rsa_encrypt_private_pem, rsa_import_private_pem, rsa_import_public_pem, KeyMetadata, KeyPair,
    KeyType, SignatureScheme,
};
use crate::password::{self, PasswordSource, TerminalPrompt};
use crate::settings::Settings;
use crate::storage::atomic;
use crate::utils;

/// Writes key pairs to disk and reads them back.
///
/// The public half of a key stored at `<path>` lives in `<path>.pub`.
/// Passwords that are not passed explicitly are requested from the
/// manager's `PasswordSource`.
pub struct KeyFileManager<P: PasswordSource = TerminalPrompt> {
    settings: Settings,
    passwords: P,
}

impl KeyFileManager<TerminalPrompt> {
    /// Manager prompting on the terminal
    pub fn new(settings: Settings) -> KeyResult<Self> {
        Self::with_password_source(settings, TerminalPrompt)
    }
}

impl<P: PasswordSource> KeyFileManager<P> {
    pub fn with_password_source(settings: Settings, passwords: P) -> KeyResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            passwords,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn password_source(&self) -> &P {
        &self.passwords
    }

    /// Generate an RSA key pair and write it out. `bits` defaults to
    /// `Settings::default_rsa_bits`.
    pub fn generate_and_write_rsa_keypair(
        &mut self,
        filepath: Option<&Path>,
        bits: Option<usize>,
        password: Option<&str>,
    ) -> KeyResult<PathBuf> {
        let bits = bits.unwrap_or(self.settings.default_rsa_bits);
        let keypair = KeyPair::generate_rsa(bits, KeyType::Rsa.default_scheme(), &self.settings)?;
        self.write_keypair(&keypair, filepath, password)
    }

    pub fn generate_and_write_ed25519_keypair(
        &mut self,
        filepath: Option<&Path>,
        password: Option<&str>,
    ) -> KeyResult<PathBuf> {
        let keypair = KeyPair::generate_ed25519()?;
        self.write_keypair(&keypair, filepath, password)
    }

    pub fn generate_and_write_ecdsa_keypair(
        &mut self,
        filepath: Option<&Path>,
        password: Option<&str>,
    ) -> KeyResult<PathBuf> {
        let keypair = KeyPair::generate_ecdsa()?;
        self.write_keypair(&keypair, filepath, password)
    }

    /// Write `keypair` to `filepath` (or `<cwd>/<keyid>`) and its public
    /// half to the `.pub` sibling. Returns the private key path.
    ///
    /// An empty password stores the private key unencrypted. With no
    /// password the source is asked, with confirmation.
    pub fn write_keypair(
        &mut self,
        keypair: &KeyPair,
        filepath: Option<&Path>,
        password: Option<&str>,
    ) -> KeyResult<PathBuf> {
        if !keypair.has_private() {
            return Err(KeyError::format_error(
                "keypair",
                "a key pair with private material",
                "a public-only key",
                error_codes::MISSING_PRIVATE_KEY,
            ));
        }

        let path = match filepath {
            Some(path) => {
                formats::check_path(path)?;
                log::debug!("filepath specified: {}", utils::display_name(path));
                path.to_path_buf()
            }
            None => env::current_dir()?.join(&keypair.keyid),
        };
        let name = utils::display_name(&path);

        let prompt = password::creation_prompt(keypair.keytype, &path);
        let password = password::acquire_password(
            &mut self.passwords,
            password,
            &prompt,
            true,
            self.settings.max_password_attempts,
        )?;

        let private = self.private_payload(keypair, &password)?;
        if password.is_empty() {
            log::warn!("writing unencrypted private key {}", name);
        }
        let public = match keypair.keytype {
            KeyType::Rsa => keypair.keyval.public.clone(),
            KeyType::Ed25519 | KeyType::EcdsaSha2Nistp256 => keypair.to_metadata().to_json()?,
        };

        atomic::write_atomic(&utils::public_key_path(&path), public.as_bytes())?;
        atomic::write_atomic(&path, private.as_bytes())?;

        log::info!("wrote {} key pair {}", keypair.keytype, name);
        Ok(path)
    }

    fn private_payload(&self, keypair: &KeyPair, password: &str) -> KeyResult<Zeroizing<String>> {
        let payload = match (keypair.keytype, password.is_empty()) {
            (KeyType::Rsa, true) => keypair.keyval.private.clone(),
            (KeyType::Rsa, false) => rsa_encrypt_private_pem(
                &keypair.keyval.private,
                password,
                self.settings.pbkdf2_iterations,
            )?,
            (KeyType::Ed25519 | KeyType::EcdsaSha2Nistp256, true) => serde_json::to_string(keypair)?,
            (KeyType::Ed25519 | KeyType::EcdsaSha2Nistp256, false) => {
                envelope::encrypt_key(keypair, password, self.settings.pbkdf2_iterations)?
            }
        };
        Ok(Zeroizing::new(payload))
    }

    /// Read the public key in `filepath`, which must hold a key of type
    /// `expected`
    pub fn read_public(&self, filepath: &Path, expected: KeyType) -> KeyResult<KeyPair> {
        self.load_public(filepath, expected, expected.default_scheme())
    }

    /// Read and, when the password is non-empty, decrypt the private key in
    /// `filepath`. A missing password is asked for without confirmation.
    pub fn read_private(
        &mut self,
        filepath: &Path,
        expected: KeyType,
        password: Option<&str>,
    ) -> KeyResult<KeyPair> {
        self.load_private(filepath, expected, password, expected.default_scheme())
    }

    pub fn import_rsa_publickey_from_file(
        &self,
        filepath: &Path,
        scheme: SignatureScheme,
    ) -> KeyResult<KeyPair> {
        self.load_public(filepath, KeyType::Rsa, scheme)
    }

    pub fn import_rsa_privatekey_from_file(
        &mut self,
        filepath: &Path,
        password: Option<&str>,
        scheme: SignatureScheme,
    ) -> KeyResult<KeyPair> {
        self.load_private(filepath, KeyType::Rsa, password, scheme)
    }

    pub fn import_ed25519_publickey_from_file(&self, filepath: &Path) -> KeyResult<KeyPair> {
        self.read_public(filepath, KeyType::Ed25519)
    }

    pub fn import_ed25519_privatekey_from_file(
        &mut self,
        filepath: &Path,
        password: Option<&str>,
    ) -> KeyResult<KeyPair> {
        self.read_private(filepath, KeyType::Ed25519, password)
    }

    pub fn import_ecdsa_publickey_from_file(&self, filepath: &Path) -> KeyResult<KeyPair> {
        self.read_public(filepath, KeyType::EcdsaSha2Nistp256)
    }

    pub fn import_ecdsa_privatekey_from_file(
        &mut self,
        filepath: &Path,
        password: Option<&str>,
    ) -> KeyResult<KeyPair> {
        self.read_private(filepath, KeyType::EcdsaSha2Nistp256, password)
    }

    fn load_public(
        &self,
        filepath: &Path,
        expected: KeyType,
        scheme: SignatureScheme,
    ) -> KeyResult<KeyPair> {
        formats::check_path(filepath)?;
        let text = fs::read_to_string(filepath)?;

        if let Some(found) = json_keytype(&text) {
            if found != expected {
                return Err(KeyError::unexpected_keytype(expected.as_str(), found.as_str()));
            }
        }

        match expected {
            KeyType::Rsa => {
                formats::check_scheme(KeyType::Rsa, scheme)?;
                rsa_import_public_pem(&text, scheme)
            }
            KeyType::Ed25519 | KeyType::EcdsaSha2Nistp256 => {
                let metadata = KeyMetadata::from_json(&text)?;
                KeyPair::from_metadata(metadata, expected)
            }
        }
    }

    fn load_private(
        &mut self,
        filepath: &Path,
        expected: KeyType,
        password: Option<&str>,
        scheme: SignatureScheme,
    ) -> KeyResult<KeyPair> {
        formats::check_path(filepath)?;
        if expected == KeyType::Rsa {
            formats::check_scheme(KeyType::Rsa, scheme)?;
        }

        let prompt = password::import_prompt(expected, filepath);
        let password = password::acquire_password(
            &mut self.passwords,
            password,
            &prompt,
            false,
            self.settings.max_password_attempts,
        )?;
        if password.is_empty() {
            log::debug!("empty password given for {}", utils::display_name(filepath));
        }

        let text = Zeroizing::new(fs::read_to_string(filepath)?);

        match expected {
            KeyType::Rsa => {
                if let Some(found) = json_keytype(&text) {
                    return Err(KeyError::unexpected_keytype(expected.as_str(), found.as_str()));
                }
                rsa_import_private_pem(&text, &password, scheme)
            }
            KeyType::Ed25519 | KeyType::EcdsaSha2Nistp256 => {
                let json = if password.is_empty() {
                    if envelope::looks_encrypted(&text) {
                        return Err(encryption_state_mismatch(
                            "Password was not given but private key is encrypted",
                        ));
                    }
                    Zeroizing::new(text.as_bytes().to_vec())
                } else {
                    if json_keytype(&text).is_some() {
                        return Err(encryption_state_mismatch(
                            "Password was given but private key is not encrypted",
                        ));
                    }
                    envelope::decrypt_key(
                        &text,
                        &password,
                        self.settings.max_pbkdf2_iterations,
                    )?
                };
                self.keypair_from_json(&json, expected)
            }
        }
    }

    fn keypair_from_json(&self, json: &[u8], expected: KeyType) -> KeyResult<KeyPair> {
        let mut stored: KeyPair = serde_json::from_slice(json)?;
        if stored.keytype != expected {
            return Err(KeyError::unexpected_keytype(
                expected.as_str(),
                stored.keytype.as_str(),
            ));
        }

        let mut keypair = KeyPair::new(
            stored.keytype,
            stored.scheme,
            std::mem::take(&mut stored.keyval.public),
            std::mem::take(&mut stored.keyval.private),
        )?;
        if !keypair.has_private() {
            return Err(KeyError::decode_error(
                "private key file",
                "no private key material",
                error_codes::MALFORMED_KEYVAL,
            ));
        }
        keypair.validate()?;
        keypair.keyid_hash_algorithms = Some(self.settings.hash_algorithms.clone());
        Ok(keypair)
    }
}

impl Default for KeyFileManager<TerminalPrompt> {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            passwords: TerminalPrompt,
        }
    }
}

fn encryption_state_mismatch(cause: &str) -> KeyError {
    KeyError::crypto_error("import", cause, error_codes::ENCRYPTION_STATE_MISMATCH)
}

/// Key type named by a JSON key document, if `text` is one
fn json_keytype(text: &str) -> Option<KeyType> {
    if !text.trim_start().starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("keytype")?.as_str()?.parse().ok()
}
