use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use cipher_envelope::wire::{HASH_BYTES, HEADER_BYTES, KIND_AEAD, KIND_DIGEST, PROTOCOL_VERSION};
use cipher_envelope::{suite_id, EnvelopeCipher, EnvelopeError, Options, LEGACY_CIPHER};

const PLAINTEXT: &[u8] = b"Test encryption of this string.";
const KEY: &[u8] = b"EncryptionKey";

fn ctr() -> EnvelopeCipher {
    EnvelopeCipher::new(LEGACY_CIPHER).unwrap()
}

fn gcm() -> EnvelopeCipher {
    EnvelopeCipher::default()
}

#[test]
fn roundtrip_every_cipher() {
    for name in [
        "aes-128-ctr",
        "aes-192-ctr",
        "aes-256-ctr",
        "aes-128-gcm",
        "aes-192-gcm",
        "aes-256-gcm",
    ] {
        let cipher = EnvelopeCipher::new(name).unwrap();
        let sealed = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
        let pt = cipher.decrypt(sealed.as_bytes(), KEY, &Options::default()).unwrap();
        assert_eq!(pt, PLAINTEXT, "cipher {}", name);
    }
}

#[test]
fn roundtrip_empty_plaintext() {
    for cipher in [ctr(), gcm()] {
        let sealed = cipher.encrypt(b"", KEY, &Options::default()).unwrap();
        let pt = cipher.decrypt(sealed.as_bytes(), KEY, &Options::default()).unwrap();
        assert!(pt.is_empty());
    }
}

#[test]
fn roundtrip_large_plaintext() {
    let plaintext = vec![0xABu8; 65536];
    for cipher in [ctr(), gcm()] {
        let sealed = cipher.encrypt(&plaintext, KEY, &Options::new().raw()).unwrap();
        let pt = cipher.decrypt(sealed.as_bytes(), KEY, &Options::new().raw()).unwrap();
        assert_eq!(pt, plaintext);
    }
}

#[test]
fn concrete_scenario_positional() {
    let cipher = ctr();
    let options = Options::new().positional();

    let sealed = cipher.encrypt(PLAINTEXT, KEY, &options).unwrap();
    let text = sealed.as_str().unwrap();
    let decoded = STANDARD.decode(text).unwrap();
    // CTR keeps the plaintext length.
    assert_eq!(decoded.len(), 16 + 32 + PLAINTEXT.len());
    assert_eq!(&decoded[..16], sealed.iv().as_bytes());
    assert_eq!(&decoded[16..48], &sealed.hash().unwrap()[..]);

    let pt = cipher.decrypt(text.as_bytes(), KEY, &options).unwrap();
    assert_eq!(pt, PLAINTEXT);

    match cipher.decrypt(text.as_bytes(), b"AnotherKey", &options) {
        Ok(pt) => assert_ne!(pt, PLAINTEXT),
        Err(e) => assert!(e.is_integrity_failure()),
    }
}

#[test]
fn concrete_scenario_versioned() {
    let cipher = ctr();
    let sealed = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
    let decoded = STANDARD.decode(sealed.as_str().unwrap()).unwrap();
    assert_eq!(decoded.len(), HEADER_BYTES + 16 + HASH_BYTES + PLAINTEXT.len());

    let pt = cipher.decrypt(sealed.as_bytes(), KEY, &Options::default()).unwrap();
    assert_eq!(pt, PLAINTEXT);
}

#[test]
fn base64_with_trailing_newline_decrypts() {
    let cipher = ctr();
    let sealed = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
    let mut text = sealed.as_bytes().to_vec();
    text.extend_from_slice(b"\r\n");
    let pt = cipher.decrypt(&text, KEY, &Options::default()).unwrap();
    assert_eq!(pt, PLAINTEXT);
}

#[test]
fn wrong_key_never_returns_plaintext() {
    // CTR has no key check: the hash still matches, so the result is garbage.
    let cipher = ctr();
    let sealed = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
    let pt = cipher.decrypt(sealed.as_bytes(), b"other", &Options::default()).unwrap();
    assert_ne!(pt, PLAINTEXT);

    let cipher = gcm();
    let sealed = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
    assert_eq!(
        cipher.decrypt(sealed.as_bytes(), b"other", &Options::default()),
        Err(EnvelopeError::DecryptionFailed)
    );
}

#[test]
fn iv_freshness() {
    for cipher in [ctr(), gcm()] {
        let a = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
        let b = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.as_bytes(), b.as_bytes());
    }
}

#[test]
fn header_fields() {
    let sealed = ctr().encrypt(PLAINTEXT, KEY, &Options::new().raw()).unwrap();
    let ct = sealed.as_bytes();
    assert_eq!(ct[0], PROTOCOL_VERSION);
    assert_eq!(Some(ct[1]), suite_id("aes-256-ctr"));
    assert_eq!(ct[2], KIND_DIGEST);
    assert_eq!(ct[3], 16);

    let options = Options::new().with_aad(b"ctx".to_vec()).with_tag_length(13).raw();
    let sealed = gcm().encrypt(PLAINTEXT, KEY, &options).unwrap();
    let ct = sealed.as_bytes();
    assert_eq!(ct[0], PROTOCOL_VERSION);
    assert_eq!(Some(ct[1]), suite_id("aes-256-gcm"));
    assert_eq!(ct[2], KIND_AEAD);
    assert_eq!(ct[3], 12);
    let fields = HEADER_BYTES + 12;
    assert_eq!(ct[fields], 13);
    assert_eq!(u16::from_be_bytes([ct[fields + 1], ct[fields + 2]]), 3);
}

#[test]
fn tamper_version_fails() {
    let cipher = ctr();
    let mut ct = cipher.encrypt(PLAINTEXT, KEY, &Options::new().raw()).unwrap().into_bytes();
    ct[0] = 0xFF;
    assert_eq!(
        cipher.decrypt(&ct, KEY, &Options::new().raw()),
        Err(EnvelopeError::UnsupportedVersion(0xFF))
    );
}

#[test]
fn tamper_suite_fails() {
    let cipher = ctr();
    let mut ct = cipher.encrypt(PLAINTEXT, KEY, &Options::new().raw()).unwrap().into_bytes();
    ct[1] = 0x11;
    assert!(matches!(
        cipher.decrypt(&ct, KEY, &Options::new().raw()),
        Err(EnvelopeError::AlgorithmMismatch { .. })
    ));
}

#[test]
fn tamper_hash_fails() {
    let cipher = ctr();
    let mut ct = cipher.encrypt(PLAINTEXT, KEY, &Options::new().raw()).unwrap().into_bytes();
    ct[HEADER_BYTES + 16 + 5] ^= 0x80;
    assert_eq!(
        cipher.decrypt(&ct, KEY, &Options::new().raw()),
        Err(EnvelopeError::InvalidHash)
    );
}

#[test]
fn tamper_ciphertext_fails() {
    let cipher = ctr();
    let ct = cipher.encrypt(PLAINTEXT, KEY, &Options::new().raw()).unwrap().into_bytes();
    let start = HEADER_BYTES + 16 + HASH_BYTES;
    for i in start..ct.len() {
        let mut tampered = ct.clone();
        tampered[i] ^= 0x01;
        assert_eq!(
            cipher.decrypt(&tampered, KEY, &Options::new().raw()),
            Err(EnvelopeError::InvalidHash),
            "byte {}",
            i
        );
    }
}

#[test]
fn tamper_positional_ciphertext_fails() {
    let cipher = ctr();
    let options = Options::new().positional().raw();
    let ct = cipher.encrypt(PLAINTEXT, KEY, &options).unwrap().into_bytes();
    for i in 16 + HASH_BYTES..ct.len() {
        let mut tampered = ct.clone();
        tampered[i] ^= 0x01;
        assert_eq!(cipher.decrypt(&tampered, KEY, &options), Err(EnvelopeError::InvalidHash));
    }
}

#[test]
fn tamper_aead_regions_fail() {
    let cipher = gcm();
    let options = Options::new().with_aad(b"bound".to_vec()).raw();
    let ct = cipher.encrypt(PLAINTEXT, KEY, &options).unwrap().into_bytes();

    // iv, tag, aad, ciphertext
    let body = HEADER_BYTES + 12 + 3;
    for i in (HEADER_BYTES..HEADER_BYTES + 12).chain(body..ct.len()) {
        let mut tampered = ct.clone();
        tampered[i] ^= 0x01;
        assert_eq!(
            cipher.decrypt(&tampered, KEY, &Options::new().raw()),
            Err(EnvelopeError::DecryptionFailed),
            "byte {}",
            i
        );
    }
}

#[test]
fn truncated_aead_tag_fails() {
    let cipher = gcm();
    let options = Options::new().raw();
    let ct = cipher.encrypt(PLAINTEXT, KEY, &options).unwrap().into_bytes();

    // Rewrite tag_len 16 -> 12 and drop the last four tag bytes.
    let tag_len_at = HEADER_BYTES + 12;
    let tag_start = tag_len_at + 3;
    assert_eq!(ct[tag_len_at], 16);
    let mut truncated = ct[..tag_start + 12].to_vec();
    truncated[tag_len_at] = 12;
    truncated.extend_from_slice(&ct[tag_start + 16..]);

    assert_eq!(cipher.decrypt(&truncated, KEY, &options), Err(EnvelopeError::DecryptionFailed));

    // Expecting a shorter tag than the envelope carries fails the same way.
    assert_eq!(
        cipher.decrypt(&ct, KEY, &Options::new().raw().with_tag_length(12)),
        Err(EnvelopeError::DecryptionFailed)
    );
    assert_eq!(cipher.decrypt(&ct, KEY, &options).unwrap(), PLAINTEXT);
}

#[test]
fn positional_tag_length_out_of_range() {
    let cipher = gcm();
    let options = Options::new().raw().positional().with_tag_length(usize::MAX);
    assert_eq!(
        cipher.decrypt(&[0u8; 40], KEY, &options),
        Err(EnvelopeError::InvalidOptions("unsupported tag length"))
    );
}

#[test]
fn wrong_aad_fails() {
    let cipher = gcm();
    let sealed = cipher
        .encrypt(PLAINTEXT, KEY, &Options::new().with_aad(b"good".to_vec()))
        .unwrap();
    let result = cipher.decrypt(sealed.as_bytes(), KEY, &Options::new().with_aad(b"bad".to_vec()));
    assert_eq!(result, Err(EnvelopeError::DecryptionFailed));
}

#[test]
fn truncated_fails() {
    let cipher = ctr();
    let ct = cipher.encrypt(PLAINTEXT, KEY, &Options::new().raw()).unwrap().into_bytes();
    for len in 0..HEADER_BYTES + 16 + HASH_BYTES {
        assert!(
            matches!(
                cipher.decrypt(&ct[..len], KEY, &Options::new().raw()),
                Err(EnvelopeError::MalformedEnvelope(_))
            ),
            "prefix {}",
            len
        );
    }

    let options = Options::new().positional().raw();
    let ct = cipher.encrypt(PLAINTEXT, KEY, &options).unwrap().into_bytes();
    for len in 0..16 + HASH_BYTES {
        assert!(matches!(
            cipher.decrypt(&ct[..len], KEY, &options),
            Err(EnvelopeError::MalformedEnvelope(_))
        ));
    }
}

#[test]
fn unknown_algorithm_rejected() {
    assert_eq!(
        EnvelopeCipher::new("rot13").unwrap_err(),
        EnvelopeError::CipherUnavailable("rot13".into())
    );
    assert!(EnvelopeCipher::new("").is_err());
}

#[test]
fn suite_mismatch_between_ctr_and_gcm() {
    let sealed = ctr().encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
    assert!(matches!(
        gcm().decrypt(sealed.as_bytes(), KEY, &Options::default()),
        Err(EnvelopeError::AlgorithmMismatch { .. })
    ));
}

#[test]
fn empty_key_rejected() {
    let cipher = ctr();
    assert!(matches!(
        cipher.encrypt(PLAINTEXT, b"", &Options::default()),
        Err(EnvelopeError::InvalidKey(_))
    ));
    let sealed = cipher.encrypt(PLAINTEXT, KEY, &Options::default()).unwrap();
    assert!(matches!(
        cipher.decrypt(sealed.as_bytes(), b"", &Options::default()),
        Err(EnvelopeError::InvalidKey(_))
    ));
}

#[test]
fn caller_iv_must_match_length() {
    let cipher = ctr();
    assert_eq!(
        cipher.suite().iv_from_bytes(&[0u8; 12]).unwrap_err(),
        EnvelopeError::InvalidIv {
            expected: 16,
            actual: 12
        }
    );
    assert!(cipher.suite().iv_from_bytes(&[]).is_err());
}
