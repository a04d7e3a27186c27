#![no_main]

use cipher_envelope::{EnvelopeCipher, Options, LEGACY_CIPHER};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static CIPHERS: Lazy<(EnvelopeCipher, EnvelopeCipher)> = Lazy::new(|| {
    (
        EnvelopeCipher::new(LEGACY_CIPHER).unwrap(),
        EnvelopeCipher::default(),
    )
});

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the options, the rest is the envelope.
    let selector = data[0];
    let envelope = &data[1..];

    let mut options = Options::new().raw();
    if selector & 0x01 != 0 {
        options = options.positional();
    }
    if selector & 0x02 != 0 {
        options = options.with_aad(b"fuzz".to_vec());
    }
    if selector & 0x08 != 0 {
        options = options.with_tag_length(usize::from(selector >> 4));
    }

    let (ctr, gcm) = &*CIPHERS;
    let cipher = if selector & 0x04 != 0 { gcm } else { ctr };

    let _ = cipher.decrypt(envelope, b"fuzz-key", &options);
});
