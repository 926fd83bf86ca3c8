#![no_main]

use arbitrary::Arbitrary;
use keysmith::envelope::{self, EncryptedEnvelope};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct EnvelopeFuzzInput {
    text: String,
    password: String,
    plaintext: Vec<u8>,
    flip: Option<usize>,
}

fuzz_target!(|input: EnvelopeFuzzInput| {
    // Arbitrary text must be rejected cleanly
    let _ = envelope::decrypt_key(&input.text, &input.password, 1_000);

    // A sealed envelope opens again, and a flipped ciphertext bit is caught
    if let Ok(mut sealed) = EncryptedEnvelope::seal(&input.plaintext, &input.password, 1) {
        let decoded = EncryptedEnvelope::decode(&sealed.encode()).expect("own encoding decodes");
        let opened = decoded.open(&input.password).expect("own envelope opens");
        assert_eq!(&opened[..], &input.plaintext[..]);

        if let Some(index) = input.flip {
            if !sealed.ciphertext.is_empty() {
                let index = index % sealed.ciphertext.len();
                sealed.ciphertext[index] ^= 0x80;
                assert!(sealed.open(&input.password).is_err());
            }
        }
    }
});
