//! Error types for envelope encryption.

use thiserror::Error;

use crate::engine::EngineError;

/// Every failure the envelope layer can surface to a caller.
///
/// Nothing is retried internally. An [`EnvelopeError::InvalidHash`] in
/// particular is final for that message: the caller needs a fresh,
/// unmodified envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The engine does not provide the requested cipher.
    #[error("cipher not available: {0}")]
    CipherUnavailable(String),

    /// The engine does not provide the requested digest.
    #[error("digest not available: {0}")]
    DigestUnavailable(String),

    /// The engine failed while computing a digest it claims to support.
    #[error("digest computation failed")]
    DigestComputationFailed,

    /// Empty IV, or an IV whose length does not match the cipher.
    #[error("invalid initialization vector: expected {expected} bytes, got {actual}")]
    InvalidIv { expected: usize, actual: usize },

    #[error("invalid key: {0}")]
    InvalidKey(&'static str),

    #[error("invalid plaintext: {0}")]
    InvalidPlaintext(&'static str),

    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),

    /// Input too short, bad transport encoding, or inconsistent length fields.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    #[error("unsupported envelope version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// The envelope was produced for a different cipher than the one configured.
    #[error("algorithm mismatch: configured {expected}, envelope carries {found}")]
    AlgorithmMismatch { expected: String, found: String },

    /// The versioned wire format has no identifier for this cipher.
    #[error("no wire identifier registered for cipher {0}")]
    UnregisteredSuite(String),

    /// The stored digest does not match the ciphertext (tampering or corruption).
    #[error("invalid hash")]
    InvalidHash,

    #[error("encryption failed")]
    EncryptionFailed,

    /// The cipher rejected the ciphertext/key/IV combination (e.g. AEAD tag mismatch).
    #[error("decryption failed")]
    DecryptionFailed,

    #[error("secure random generator unavailable")]
    RandomUnavailable,
}

/// Which side of the envelope an engine failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

impl EnvelopeError {
    /// Map an engine failure. Configuration errors keep their meaning on both
    /// sides; anything else becomes `EncryptionFailed` or `DecryptionFailed`.
    pub(crate) fn from_engine(e: EngineError, direction: Direction) -> Self {
        match (e, direction) {
            (EngineError::UnknownCipher(name), _) => Self::CipherUnavailable(name),
            (EngineError::InvalidKey, _) => Self::InvalidKey("rejected by cipher"),
            (EngineError::InvalidIvLength { expected, actual }, _) => Self::InvalidIv { expected, actual },
            (EngineError::InvalidTagLength(_), Direction::Encrypt) => {
                Self::InvalidOptions("unsupported tag length")
            }
            (EngineError::Random, Direction::Encrypt) => Self::RandomUnavailable,
            (_, Direction::Encrypt) => Self::EncryptionFailed,
            (_, Direction::Decrypt) => Self::DecryptionFailed,
        }
    }

    /// True for failures that indicate the envelope was modified in transit.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::InvalidHash | Self::DecryptionFailed)
    }
}
