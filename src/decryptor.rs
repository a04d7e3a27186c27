//! Decryption: transport decode → parse → (digest path) verify hash → decrypt.
//!
//! Per message: `Received → Decoded → HashVerified → Decrypted`, or a
//! terminal `MalformedEnvelope` / `InvalidHash` / `DecryptionFailed`. On the
//! digest path the hash is checked before the cipher ever runs.

use subtle::ConstantTimeEq;

use crate::engine::{AeadOpen, CipherEngine, GCM_TAG_LENGTHS};
use crate::error::{Direction, EnvelopeError};
use crate::options::{Options, WireFormat};
use crate::suite::{self, CipherSuite};
use crate::wire::{self, Envelope, HASH_BYTES, KIND_AEAD, KIND_DIGEST};

fn check_tag_length(options: &Options) -> Result<(), EnvelopeError> {
    if !GCM_TAG_LENGTHS.contains(&options.tag_length) {
        return Err(EnvelopeError::InvalidOptions("unsupported tag length"));
    }
    Ok(())
}

/// Decrypts envelopes produced for one cipher suite.
#[derive(Debug, Clone, Copy)]
pub struct Decryptor<'a, E: CipherEngine> {
    engine: &'a E,
    suite: &'a CipherSuite,
}

impl<'a, E: CipherEngine> Decryptor<'a, E> {
    pub fn new(engine: &'a E, suite: &'a CipherSuite) -> Self {
        Self { engine, suite }
    }

    /// Verify and decrypt one envelope. Never returns unverified plaintext.
    pub fn decrypt(&self, envelope: &[u8], key: &[u8], options: &Options) -> Result<Vec<u8>, EnvelopeError> {
        if key.is_empty() {
            return Err(EnvelopeError::InvalidKey("empty key"));
        }
        let data = wire::decode_transport(envelope, options.encoding)?;

        let plaintext = match options.format {
            WireFormat::Versioned => self.open_versioned(&data, key, options)?,
            WireFormat::Positional => self.open_positional(&data, key, options)?,
        };

        tracing::debug!(
            cipher = %self.suite.algorithm(),
            envelope_bytes = data.len(),
            plaintext_bytes = plaintext.len(),
            "opened envelope"
        );
        Ok(plaintext)
    }

    fn open_versioned(&self, data: &[u8], key: &[u8], options: &Options) -> Result<Vec<u8>, EnvelopeError> {
        let parts = wire::decode_wire(data)?;

        let expected_id = self
            .suite
            .suite_id()
            .ok_or_else(|| EnvelopeError::UnregisteredSuite(self.suite.algorithm().to_owned()))?;
        let expected_kind = if self.suite.is_authenticated() {
            KIND_AEAD
        } else {
            KIND_DIGEST
        };
        if parts.suite != expected_id || parts.envelope.kind() != expected_kind {
            return Err(EnvelopeError::AlgorithmMismatch {
                expected: self.suite.algorithm().to_owned(),
                found: suite::suite_name(parts.suite)
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("unknown suite {:#04x}", parts.suite)),
            });
        }

        match parts.envelope {
            Envelope::Digest {
                iv,
                hash,
                ciphertext,
            } => self.open_digest(iv, hash, ciphertext, key),
            Envelope::Aead {
                iv,
                tag,
                aad,
                ciphertext,
            } => {
                check_tag_length(options)?;
                // GCM tags truncate to a prefix, so a shortened tag would still verify.
                if tag.len() != options.tag_length {
                    tracing::warn!(
                        cipher = %self.suite.algorithm(),
                        tag_bytes = tag.len(),
                        expected_tag_bytes = options.tag_length,
                        "envelope tag length mismatch"
                    );
                    return Err(EnvelopeError::DecryptionFailed);
                }
                // Caller-supplied AAD wins; a mismatch fails authentication.
                let aad = if options.aad.is_empty() { aad } else { &options.aad[..] };
                self.open_aead(iv, tag, aad, ciphertext, key)
            }
        }
    }

    fn open_positional(&self, data: &[u8], key: &[u8], options: &Options) -> Result<Vec<u8>, EnvelopeError> {
        let iv_length = self.suite.iv_length();
        if self.suite.is_authenticated() {
            check_tag_length(options)?;
            let parts = wire::decode_positional(data, iv_length, options.tag_length)?;
            self.open_aead(parts.iv, parts.integrity, &options.aad, parts.ciphertext, key)
        } else {
            let parts = wire::decode_positional(data, iv_length, HASH_BYTES)?;
            let hash: &[u8; HASH_BYTES] = parts
                .integrity
                .try_into()
                .map_err(|_| EnvelopeError::MalformedEnvelope("shorter than iv + integrity"))?;
            self.open_digest(parts.iv, hash, parts.ciphertext, key)
        }
    }

    fn open_digest(
        &self,
        iv: &[u8],
        stored_hash: &[u8; HASH_BYTES],
        ciphertext: &[u8],
        key: &[u8],
    ) -> Result<Vec<u8>, EnvelopeError> {
        let calculated = self.suite.integrity_hash(self.engine, ciphertext)?;
        if !bool::from(calculated[..].ct_eq(&stored_hash[..])) {
            tracing::warn!(
                cipher = %self.suite.algorithm(),
                ciphertext_bytes = ciphertext.len(),
                "envelope hash mismatch"
            );
            return Err(EnvelopeError::InvalidHash);
        }

        let iv = self.suite.iv_from_bytes(iv)?;
        self.engine
            .decrypt(self.suite.algorithm(), key, iv.as_bytes(), ciphertext, None)
            .map_err(|e| EnvelopeError::from_engine(e, Direction::Decrypt))
    }

    fn open_aead(
        &self,
        iv: &[u8],
        tag: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        key: &[u8],
    ) -> Result<Vec<u8>, EnvelopeError> {
        let iv = self.suite.iv_from_bytes(iv)?;
        self.engine
            .decrypt(
                self.suite.algorithm(),
                key,
                iv.as_bytes(),
                ciphertext,
                Some(AeadOpen { aad, tag }),
            )
            .map_err(|e| {
                let err = EnvelopeError::from_engine(e, Direction::Decrypt);
                if err == EnvelopeError::DecryptionFailed {
                    tracing::warn!(cipher = %self.suite.algorithm(), "envelope authentication failed");
                }
                err
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryptor::Encryptor;
    use crate::engine::RustCryptoEngine;
    use crate::wire::HEADER_BYTES;

    fn suite(name: &str) -> CipherSuite {
        CipherSuite::configure(&RustCryptoEngine, name).unwrap()
    }

    #[test]
    fn digest_roundtrip() {
        let suite = suite("aes-256-ctr");
        let sealed = Encryptor::new(&RustCryptoEngine, &suite)
            .encrypt(b"payload", b"key", &Options::default())
            .unwrap();
        let pt = Decryptor::new(&RustCryptoEngine, &suite)
            .decrypt(sealed.as_bytes(), b"key", &Options::default())
            .unwrap();
        assert_eq!(pt, b"payload");
    }

    #[test]
    fn tampered_hash_fails_before_decryption() {
        // A corrupted hash must surface as InvalidHash even when the IV is fine.
        let suite = suite("aes-256-ctr");
        let options = Options::new().raw();
        let sealed = Encryptor::new(&RustCryptoEngine, &suite)
            .encrypt(b"payload", b"key", &options)
            .unwrap();
        let mut bytes = sealed.into_bytes();
        bytes[HEADER_BYTES + 16] ^= 0x01;
        let err = Decryptor::new(&RustCryptoEngine, &suite)
            .decrypt(&bytes, b"key", &options)
            .unwrap_err();
        assert_eq!(err, EnvelopeError::InvalidHash);
    }

    #[test]
    fn suite_mismatch_is_reported() {
        let ctr128 = suite("aes-128-ctr");
        let ctr256 = suite("aes-256-ctr");
        let sealed = Encryptor::new(&RustCryptoEngine, &ctr128)
            .encrypt(b"payload", b"key", &Options::default())
            .unwrap();
        let err = Decryptor::new(&RustCryptoEngine, &ctr256)
            .decrypt(sealed.as_bytes(), b"key", &Options::default())
            .unwrap_err();
        assert_eq!(
            err,
            EnvelopeError::AlgorithmMismatch {
                expected: "aes-256-ctr".into(),
                found: "aes-128-ctr".into(),
            }
        );
    }

    #[test]
    fn aead_uses_embedded_aad_by_default() {
        let suite = suite("aes-128-gcm");
        let sealed = Encryptor::new(&RustCryptoEngine, &suite)
            .encrypt(b"payload", b"key", &Options::new().with_aad(b"bound".to_vec()))
            .unwrap();
        let dec = Decryptor::new(&RustCryptoEngine, &suite);
        assert_eq!(
            dec.decrypt(sealed.as_bytes(), b"key", &Options::default()).unwrap(),
            b"payload"
        );
        assert_eq!(
            dec.decrypt(
                sealed.as_bytes(),
                b"key",
                &Options::new().with_aad(b"other".to_vec())
            ),
            Err(EnvelopeError::DecryptionFailed)
        );
    }

    #[test]
    fn aead_tag_length_must_match_options() {
        let suite = suite("aes-128-gcm");
        let options = Options::new().with_tag_length(13);
        let sealed = Encryptor::new(&RustCryptoEngine, &suite)
            .encrypt(b"payload", b"key", &options)
            .unwrap();
        let dec = Decryptor::new(&RustCryptoEngine, &suite);
        assert_eq!(dec.decrypt(sealed.as_bytes(), b"key", &options).unwrap(), b"payload");
        assert_eq!(
            dec.decrypt(sealed.as_bytes(), b"key", &Options::default()),
            Err(EnvelopeError::DecryptionFailed)
        );
    }

    #[test]
    fn out_of_range_tag_length_is_rejected() {
        let suite = suite("aes-256-gcm");
        let dec = Decryptor::new(&RustCryptoEngine, &suite);
        for tag_length in [0, 11, 17, usize::MAX] {
            let options = Options::new().raw().positional().with_tag_length(tag_length);
            assert_eq!(
                dec.decrypt(&[0u8; 40], b"key", &options),
                Err(EnvelopeError::InvalidOptions("unsupported tag length"))
            );
        }
    }

    #[test]
    fn positional_digest_roundtrip() {
        let suite = suite("aes-256-ctr");
        let options = Options::new().positional();
        let sealed = Encryptor::new(&RustCryptoEngine, &suite)
            .encrypt(b"legacy", b"key", &options)
            .unwrap();
        let pt = Decryptor::new(&RustCryptoEngine, &suite)
            .decrypt(sealed.as_bytes(), b"key", &options)
            .unwrap();
        assert_eq!(pt, b"legacy");
    }

    #[test]
    fn positional_aead_roundtrip() {
        let suite = suite("aes-256-gcm");
        let options = Options::new().positional().with_aad(b"a".to_vec()).with_tag_length(12);
        let sealed = Encryptor::new(&RustCryptoEngine, &suite)
            .encrypt(b"legacy", b"key", &options)
            .unwrap();
        let pt = Decryptor::new(&RustCryptoEngine, &suite)
            .decrypt(sealed.as_bytes(), b"key", &options)
            .unwrap();
        assert_eq!(pt, b"legacy");
    }

    #[test]
    fn malformed_base64() {
        let suite = suite("aes-256-ctr");
        let err = Decryptor::new(&RustCryptoEngine, &suite)
            .decrypt(b"%%%", b"key", &Options::default())
            .unwrap_err();
        assert_eq!(err, EnvelopeError::MalformedEnvelope("invalid base64"));
    }
}
