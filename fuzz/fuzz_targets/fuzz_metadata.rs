#![no_main]

use keysmith::{KeyMetadata, KeyPair, KeyType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(metadata) = KeyMetadata::from_json(text) {
        for keytype in KeyType::ALL {
            if let Ok(keypair) = KeyPair::from_metadata(metadata.clone(), keytype) {
                assert_eq!(keypair.keytype, keytype);
                assert!(!keypair.has_private());
            }
        }
    }
});
