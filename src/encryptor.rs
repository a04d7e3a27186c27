//! Encryption: ensure IV → cipher → (digest path) hash → envelope → transport.

use crate::engine::{AeadSeal, CipherEngine, GCM_MAX_PLAINTEXT_BYTES};
use crate::error::{Direction, EnvelopeError};
use crate::options::{Options, OutputEncoding, WireFormat};
use crate::suite::{CipherSuite, Iv};
use crate::wire::{self, Envelope, HASH_BYTES, MAX_AAD_BYTES};

/// Integrity material attached to an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    /// SHA-256 of the raw ciphertext (non-authenticated ciphers).
    Digest([u8; HASH_BYTES]),
    /// AEAD authentication tag.
    Tag(Vec<u8>),
}

/// Result of one encryption.
#[derive(Debug, Clone)]
pub struct Sealed {
    envelope: Vec<u8>,
    encoding: OutputEncoding,
    iv: Iv,
    integrity: Integrity,
}

impl Sealed {
    /// The encoded envelope, ready for transport.
    pub fn as_bytes(&self) -> &[u8] {
        &self.envelope
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.envelope
    }

    /// The envelope as text, when base64 output was requested.
    pub fn as_str(&self) -> Option<&str> {
        match self.encoding {
            OutputEncoding::Base64 => core::str::from_utf8(&self.envelope).ok(),
            OutputEncoding::Raw => None,
        }
    }

    /// IV used for this message.
    pub fn iv(&self) -> &Iv {
        &self.iv
    }

    pub fn integrity(&self) -> &Integrity {
        &self.integrity
    }

    /// Ciphertext hash, on the digest path.
    pub fn hash(&self) -> Option<&[u8; HASH_BYTES]> {
        match &self.integrity {
            Integrity::Digest(hash) => Some(hash),
            Integrity::Tag(_) => None,
        }
    }

    /// Authentication tag, on the AEAD path.
    pub fn tag(&self) -> Option<&[u8]> {
        match &self.integrity {
            Integrity::Tag(tag) => Some(tag),
            Integrity::Digest(_) => None,
        }
    }
}

/// Encrypts messages for one cipher suite.
#[derive(Debug, Clone, Copy)]
pub struct Encryptor<'a, E: CipherEngine> {
    engine: &'a E,
    suite: &'a CipherSuite,
}

impl<'a, E: CipherEngine> Encryptor<'a, E> {
    pub fn new(engine: &'a E, suite: &'a CipherSuite) -> Self {
        Self { engine, suite }
    }

    /// Encrypt `plaintext` under a freshly generated IV.
    pub fn encrypt(&self, plaintext: &[u8], key: &[u8], options: &Options) -> Result<Sealed, EnvelopeError> {
        self.seal(plaintext, key, None, options)
    }

    /// Encrypt under a caller-chosen IV. The IV must never repeat for a key.
    pub fn encrypt_with_iv(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Iv,
        options: &Options,
    ) -> Result<Sealed, EnvelopeError> {
        self.seal(plaintext, key, Some(iv), options)
    }

    fn seal(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Option<Iv>,
        options: &Options,
    ) -> Result<Sealed, EnvelopeError> {
        if key.is_empty() {
            return Err(EnvelopeError::InvalidKey("empty key"));
        }
        let suite_id = match options.format {
            WireFormat::Versioned => Some(
                self.suite
                    .suite_id()
                    .ok_or_else(|| EnvelopeError::UnregisteredSuite(self.suite.algorithm().to_owned()))?,
            ),
            WireFormat::Positional => None,
        };

        let (envelope, iv, integrity) = if self.suite.is_authenticated() {
            self.seal_aead(plaintext, key, iv, options, suite_id)?
        } else {
            self.seal_digest(plaintext, key, iv, suite_id)?
        };

        tracing::debug!(
            cipher = %self.suite.algorithm(),
            plaintext_bytes = plaintext.len(),
            envelope_bytes = envelope.len(),
            "sealed envelope"
        );

        Ok(Sealed {
            envelope: wire::encode_transport(envelope, options.encoding),
            encoding: options.encoding,
            iv,
            integrity,
        })
    }

    fn seal_aead(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Option<Iv>,
        options: &Options,
        suite_id: Option<u8>,
    ) -> Result<(Vec<u8>, Iv, Integrity), EnvelopeError> {
        if plaintext.len() as u64 > GCM_MAX_PLAINTEXT_BYTES {
            return Err(EnvelopeError::InvalidPlaintext("exceeds the cipher's message limit"));
        }
        if suite_id.is_some() && options.aad.len() > MAX_AAD_BYTES {
            return Err(EnvelopeError::InvalidOptions("aad longer than 65535 bytes"));
        }

        let iv = self.suite.ensure_iv(self.engine, iv)?;
        let out = self
            .engine
            .encrypt(
                self.suite.algorithm(),
                key,
                iv.as_bytes(),
                plaintext,
                Some(AeadSeal {
                    aad: &options.aad,
                    tag_length: options.tag_length,
                }),
            )
            .map_err(|e| EnvelopeError::from_engine(e, Direction::Encrypt))?;

        let bytes = match suite_id {
            Some(id) => wire::encode_wire(
                id,
                &Envelope::Aead {
                    iv: iv.as_bytes(),
                    tag: &out.tag,
                    aad: &options.aad,
                    ciphertext: &out.ciphertext,
                },
            )?,
            None => wire::encode_positional(iv.as_bytes(), &out.tag, &out.ciphertext),
        };
        Ok((bytes, iv, Integrity::Tag(out.tag)))
    }

    fn seal_digest(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Option<Iv>,
        suite_id: Option<u8>,
    ) -> Result<(Vec<u8>, Iv, Integrity), EnvelopeError> {
        let iv = self.suite.ensure_iv(self.engine, iv)?;
        let out = self
            .engine
            .encrypt(self.suite.algorithm(), key, iv.as_bytes(), plaintext, None)
            .map_err(|e| EnvelopeError::from_engine(e, Direction::Encrypt))?;
        let hash = self.suite.integrity_hash(self.engine, &out.ciphertext)?;

        let bytes = match suite_id {
            Some(id) => wire::encode_wire(
                id,
                &Envelope::Digest {
                    iv: iv.as_bytes(),
                    hash: &hash,
                    ciphertext: &out.ciphertext,
                },
            )?,
            None => wire::encode_positional(iv.as_bytes(), &hash, &out.ciphertext),
        };
        Ok((bytes, iv, Integrity::Digest(hash)))
    }
}
