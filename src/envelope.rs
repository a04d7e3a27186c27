//! One-stop façade: engine + suite, with encryptor/decryptor handles and
//! envelope inspection.

use core::fmt;

use crate::decryptor::Decryptor;
use crate::encryptor::{Encryptor, Sealed};
use crate::engine::{CipherEngine, RustCryptoEngine};
use crate::error::EnvelopeError;
use crate::options::{Options, OutputEncoding};
use crate::suite::{self, CipherSuite, Iv};
use crate::wire::{self, Envelope, HASH_BYTES, KIND_AEAD};

/// Default cipher: authenticated AES-256-GCM.
pub const DEFAULT_CIPHER: &str = "aes-256-gcm";

/// Non-authenticated cipher protected by the SHA-256 envelope hash.
pub const LEGACY_CIPHER: &str = "aes-256-ctr";

/// Envelope encryption bound to one cipher.
///
/// # Example
///
/// ```
/// use cipher_envelope::{EnvelopeCipher, Options};
///
/// let cipher = EnvelopeCipher::new("aes-256-ctr")?;
/// let sealed = cipher.encrypt(b"Test encryption of this string.", b"EncryptionKey", &Options::default())?;
/// let plaintext = cipher.decrypt(sealed.as_bytes(), b"EncryptionKey", &Options::default())?;
///
/// assert_eq!(plaintext, b"Test encryption of this string.");
/// # Ok::<(), cipher_envelope::EnvelopeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeCipher<E: CipherEngine = RustCryptoEngine> {
    engine: E,
    suite: CipherSuite,
}

impl EnvelopeCipher<RustCryptoEngine> {
    /// Configure `algorithm` on the built-in engine.
    pub fn new(algorithm: &str) -> Result<Self, EnvelopeError> {
        Self::with_engine(RustCryptoEngine, algorithm)
    }
}

impl Default for EnvelopeCipher<RustCryptoEngine> {
    fn default() -> Self {
        Self {
            engine: RustCryptoEngine,
            suite: CipherSuite::from_parts(DEFAULT_CIPHER, 12, true),
        }
    }
}

impl<E: CipherEngine> EnvelopeCipher<E> {
    pub fn with_engine(engine: E, algorithm: &str) -> Result<Self, EnvelopeError> {
        let suite = CipherSuite::configure(&engine, algorithm)?;
        Ok(Self { engine, suite })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn suite(&self) -> &CipherSuite {
        &self.suite
    }

    pub fn encryptor(&self) -> Encryptor<'_, E> {
        Encryptor::new(&self.engine, &self.suite)
    }

    pub fn decryptor(&self) -> Decryptor<'_, E> {
        Decryptor::new(&self.engine, &self.suite)
    }

    pub fn encrypt(&self, plaintext: &[u8], key: &[u8], options: &Options) -> Result<Sealed, EnvelopeError> {
        self.encryptor().encrypt(plaintext, key, options)
    }

    pub fn encrypt_with_iv(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Iv,
        options: &Options,
    ) -> Result<Sealed, EnvelopeError> {
        self.encryptor().encrypt_with_iv(plaintext, key, iv, options)
    }

    pub fn decrypt(&self, envelope: &[u8], key: &[u8], options: &Options) -> Result<Vec<u8>, EnvelopeError> {
        self.decryptor().decrypt(envelope, key, options)
    }
}

// ---------------------------------------------------------------------------
// Inspection utilities (for ops/debugging)
// ---------------------------------------------------------------------------

/// Envelope metadata, read without decrypting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub version: u8,
    pub suite_id: u8,
    /// Canonical cipher name, or `"unknown"`.
    pub algorithm: &'static str,
    pub authenticated: bool,
    pub iv_bytes: usize,
    /// Hash or tag length.
    pub integrity_bytes: usize,
    pub aad_bytes: usize,
    pub ciphertext_bytes: usize,
    /// Length after transport decoding.
    pub total_bytes: usize,
}

impl fmt::Display for EnvelopeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "envelope v{} | {} ({}) | iv {} | {} {} | aad {} | {} bytes ({} ciphertext)",
            self.version,
            self.algorithm,
            if self.authenticated { "aead" } else { "digest" },
            self.iv_bytes,
            if self.authenticated { "tag" } else { "hash" },
            self.integrity_bytes,
            self.aad_bytes,
            self.total_bytes,
            self.ciphertext_bytes
        )
    }
}

/// Read metadata from a versioned envelope. Reveals no secret material.
pub fn inspect(envelope: &[u8], encoding: OutputEncoding) -> Result<EnvelopeInfo, EnvelopeError> {
    let data = wire::decode_transport(envelope, encoding)?;
    let parts = wire::decode_wire(&data)?;

    let (integrity_bytes, aad_bytes) = match parts.envelope {
        Envelope::Digest { .. } => (HASH_BYTES, 0),
        Envelope::Aead { tag, aad, .. } => (tag.len(), aad.len()),
    };

    Ok(EnvelopeInfo {
        version: parts.version,
        suite_id: parts.suite,
        algorithm: suite::suite_name(parts.suite).unwrap_or("unknown"),
        authenticated: parts.envelope.kind() == KIND_AEAD,
        iv_bytes: parts.envelope.iv().len(),
        integrity_bytes,
        aad_bytes,
        ciphertext_bytes: parts.envelope.ciphertext().len(),
        total_bytes: data.len(),
    })
}
