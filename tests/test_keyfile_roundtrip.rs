//! Integration tests for writing and importing key files
//!
//! Every test works in its own temporary directory and answers password
//! prompts from a scripted source.

use std::fs;

use keysmith::prelude::*;
use keysmith::utils::public_key_path;
use tempfile::tempdir;

fn manager_with(answers: &[&str]) -> KeyFileManager<ScriptedPasswords> {
    KeyFileManager::with_password_source(
        Settings::low_resource(),
        ScriptedPasswords::new(answers.iter().copied()),
    )
    .expect("valid settings")
}

/// An RSA key written encrypted can be read back and used for signing
#[test]
fn test_rsa_generate_write_import_sign() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("root_key");
    let mut manager = manager_with(&[]);

    let written = manager
        .generate_and_write_rsa_keypair(Some(&path), Some(2048), Some("release password"))
        .expect("Failed to write RSA key pair");
    assert_eq!(written, path);
    assert!(public_key_path(&path).exists());

    let private = manager
        .import_rsa_privatekey_from_file(
            &path,
            Some("release password"),
            SignatureScheme::RsassaPssSha256,
        )
        .expect("Failed to import RSA private key");
    let public = manager
        .import_rsa_publickey_from_file(&public_key_path(&path), SignatureScheme::RsassaPssSha256)
        .expect("Failed to import RSA public key");

    assert_eq!(private.keyid, public.keyid);
    assert_eq!(private.keyval.public, public.keyval.public);

    let signature = private.sign(b"root.json").unwrap();
    assert!(public.verify(b"root.json", &signature).unwrap());
}

/// Ed25519 and ECDSA keys written without a password come back identical
#[test]
fn test_unencrypted_roundtrip_is_exact() {
    let dir = tempdir().unwrap();
    let mut manager = manager_with(&[]);

    for keytype in [KeyType::Ed25519, KeyType::EcdsaSha2Nistp256] {
        let path = dir.path().join(keytype.as_str());
        let keypair = match keytype {
            KeyType::Ed25519 => KeyPair::generate_ed25519().unwrap(),
            _ => KeyPair::generate_ecdsa().unwrap(),
        };

        manager.write_keypair(&keypair, Some(&path), Some("")).unwrap();

        let private = manager.read_private(&path, keytype, Some("")).unwrap();
        assert_eq!(private.keytype, keypair.keytype);
        assert_eq!(private.scheme, keypair.scheme);
        assert_eq!(private.keyid, keypair.keyid);
        assert_eq!(private.keyval, keypair.keyval);

        let public = manager.read_public(&public_key_path(&path), keytype).unwrap();
        assert_eq!(public.keyval.public, keypair.keyval.public);
        assert!(!public.has_private());
    }
}

/// Prompted passwords are confirmed on write and asked once on import
#[test]
fn test_prompted_ecdsa_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("targets_key");
    let mut manager = manager_with(&["s3cret", "s3cret", "s3cret"]);

    manager
        .generate_and_write_ecdsa_keypair(Some(&path), None)
        .expect("Failed to write ECDSA key pair");
    let keypair = manager
        .import_ecdsa_privatekey_from_file(&path, None)
        .expect("Failed to import ECDSA private key");

    assert_eq!(keypair.keytype, KeyType::EcdsaSha2Nistp256);
    assert_eq!(manager.password_source().remaining(), 0);
    assert_eq!(manager.password_source().mismatches(), 0);

    let prompts = manager.password_source().prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().all(|prompt| !prompt.contains(dir.path().to_str().unwrap())));
}

/// An Ed25519 file fed to the ECDSA importer is rejected by type
#[test]
fn test_type_confusion_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot_key");
    let mut manager = manager_with(&[]);

    manager
        .generate_and_write_ed25519_keypair(Some(&path), Some("pw"))
        .unwrap();

    let error = manager
        .import_ecdsa_privatekey_from_file(&path, Some("pw"))
        .unwrap_err();
    assert_eq!(error.error_type(), "FormatError");
    assert!(error.to_string().contains("ed25519"));
}

/// Encrypted files never contain the private key in the clear
#[test]
fn test_encrypted_file_hides_private_material() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("timestamp_key");
    let mut manager = manager_with(&[]);

    let keypair = KeyPair::generate_ed25519().unwrap();
    manager.write_keypair(&keypair, Some(&path), Some("pw")).unwrap();

    let private_file = fs::read_to_string(&path).unwrap();
    assert!(!private_file.contains(&keypair.keyval.private));

    let public_file = fs::read_to_string(public_key_path(&path)).unwrap();
    assert!(!public_file.contains(&keypair.keyval.private));
    assert!(!public_file.contains("keyid"));
}

/// Settings loaded from a file drive the hash algorithms attached on import
#[test]
fn test_settings_from_file() {
    let dir = tempdir().unwrap();
    let settings_path = dir.path().join("settings.json");
    fs::write(
        &settings_path,
        r#"{"hash_algorithms": ["sha512"], "pbkdf2_iterations": 2000}"#,
    )
    .unwrap();

    let settings = Settings::from_json_file(&settings_path).unwrap();
    let mut manager =
        KeyFileManager::with_password_source(settings, ScriptedPasswords::default()).unwrap();

    let path = dir.path().join("key");
    manager
        .generate_and_write_ed25519_keypair(Some(&path), Some("pw"))
        .unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.split("@@@@").nth(1), Some("2000"));

    let keypair = manager.read_private(&path, KeyType::Ed25519, Some("pw")).unwrap();
    assert_eq!(
        keypair.keyid_hash_algorithms,
        Some(vec![keysmith::HashAlgorithm::Sha512])
    );
    assert_eq!(keypair.keyids().len(), 2);
}
