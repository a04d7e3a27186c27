//! Cipher suite: the selected algorithm, its IV rules, and the digest helper.
//!
//! A [`CipherSuite`] is immutable once configured. IVs are plain values
//! ([`Iv`]) passed per call, so one suite can be shared between threads.

use core::fmt;

use crate::engine::{CipherEngine, EngineError};
use crate::error::EnvelopeError;

/// Digest protecting the ciphertext on the non-authenticated path.
pub const DEFAULT_DIGEST: &str = "sha256";

/// Output length of [`DEFAULT_DIGEST`].
pub const DEFAULT_DIGEST_BYTES: usize = 32;

/// On-wire suite identifiers for the versioned envelope format.
pub const SUITE_AES128_CTR: u8 = 0x11;
pub const SUITE_AES192_CTR: u8 = 0x12;
pub const SUITE_AES256_CTR: u8 = 0x13;
pub const SUITE_AES128_GCM: u8 = 0x21;
pub const SUITE_AES192_GCM: u8 = 0x22;
pub const SUITE_AES256_GCM: u8 = 0x23;

const SUITE_IDS: &[(u8, &str)] = &[
    (SUITE_AES128_CTR, "aes-128-ctr"),
    (SUITE_AES192_CTR, "aes-192-ctr"),
    (SUITE_AES256_CTR, "aes-256-ctr"),
    (SUITE_AES128_GCM, "aes-128-gcm"),
    (SUITE_AES192_GCM, "aes-192-gcm"),
    (SUITE_AES256_GCM, "aes-256-gcm"),
];

/// Wire identifier for a cipher name (case-insensitive).
pub fn suite_id(name: &str) -> Option<u8> {
    SUITE_IDS
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(id, _)| *id)
}

/// Canonical cipher name for a wire identifier.
pub fn suite_name(id: u8) -> Option<&'static str> {
    SUITE_IDS.iter().find(|(i, _)| *i == id).map(|(_, n)| *n)
}

// ---------------------------------------------------------------------------
// Initialization vector
// ---------------------------------------------------------------------------

/// A non-empty initialization vector of the length its suite requires.
///
/// Built only through [`CipherSuite::ensure_iv`], [`CipherSuite::generate_iv`]
/// or [`CipherSuite::iv_from_bytes`].
#[derive(Clone, PartialEq, Eq)]
pub struct Iv(Vec<u8>);

impl Iv {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Iv {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Iv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iv({})", hex::encode(&self.0))
    }
}

// ---------------------------------------------------------------------------
// Cipher suite
// ---------------------------------------------------------------------------

/// The algorithm a session encrypts or decrypts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherSuite {
    algorithm: String,
    iv_length: usize,
    authenticated: bool,
}

impl CipherSuite {
    /// Select `algorithm`, which must be one of `engine.available_ciphers(true)`.
    /// Names match case-insensitively; the suite keeps the engine's spelling.
    pub fn configure<E: CipherEngine>(engine: &E, algorithm: &str) -> Result<Self, EnvelopeError> {
        let algorithm = engine
            .available_ciphers(true)
            .into_iter()
            .find(|c| c.eq_ignore_ascii_case(algorithm))
            .ok_or_else(|| EnvelopeError::CipherUnavailable(algorithm.to_owned()))?;
        let iv_length = engine
            .cipher_iv_length(&algorithm)
            .filter(|n| *n > 0)
            .ok_or_else(|| EnvelopeError::CipherUnavailable(algorithm.clone()))?;

        let suite = Self {
            authenticated: engine.is_authenticated(&algorithm),
            algorithm,
            iv_length,
        };
        tracing::debug!(
            cipher = %suite.algorithm,
            iv_length = suite.iv_length,
            authenticated = suite.authenticated,
            "cipher suite configured"
        );
        Ok(suite)
    }

    /// Build a suite whose engine support is already known.
    pub(crate) fn from_parts(algorithm: &str, iv_length: usize, authenticated: bool) -> Self {
        Self {
            algorithm: algorithm.to_owned(),
            iv_length,
            authenticated,
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn iv_length(&self) -> usize {
        self.iv_length
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Wire identifier, if the algorithm has one.
    pub fn suite_id(&self) -> Option<u8> {
        suite_id(&self.algorithm)
    }

    /// Fresh random IV of [`Self::iv_length`] bytes.
    pub fn generate_iv<E: CipherEngine>(&self, engine: &E) -> Result<Iv, EnvelopeError> {
        let bytes = engine
            .secure_random_bytes(self.iv_length)
            .map_err(|_| EnvelopeError::RandomUnavailable)?;
        self.iv_from_bytes(&bytes)
    }

    /// Return `iv` when given, otherwise generate one. Runs before every encryption.
    pub fn ensure_iv<E: CipherEngine>(&self, engine: &E, iv: Option<Iv>) -> Result<Iv, EnvelopeError> {
        match iv {
            Some(iv) => self.iv_from_bytes(iv.as_bytes()),
            None => self.generate_iv(engine),
        }
    }

    /// Validate externally supplied IV bytes (e.g. extracted from an envelope).
    pub fn iv_from_bytes(&self, bytes: &[u8]) -> Result<Iv, EnvelopeError> {
        if bytes.is_empty() || bytes.len() != self.iv_length {
            return Err(EnvelopeError::InvalidIv {
                expected: self.iv_length,
                actual: bytes.len(),
            });
        }
        Ok(Iv(bytes.to_vec()))
    }

    /// Raw digest of `data` with the named algorithm.
    pub fn digest<E: CipherEngine>(
        &self,
        engine: &E,
        data: &[u8],
        algorithm: &str,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let algorithm = engine
            .available_digests(true)
            .into_iter()
            .find(|d| d.eq_ignore_ascii_case(algorithm))
            .ok_or_else(|| EnvelopeError::DigestUnavailable(algorithm.to_owned()))?;
        engine.digest(&algorithm, data).map_err(|e| match e {
            EngineError::UnknownDigest(name) => EnvelopeError::DigestUnavailable(name),
            _ => EnvelopeError::DigestComputationFailed,
        })
    }

    /// Lower-case hex digest of `data`.
    pub fn digest_hex<E: CipherEngine>(
        &self,
        engine: &E,
        data: &[u8],
        algorithm: &str,
    ) -> Result<String, EnvelopeError> {
        self.digest(engine, data, algorithm).map(hex::encode)
    }

    /// SHA-256 of `data` as a fixed array; the integrity hash of the digest envelope.
    pub(crate) fn integrity_hash<E: CipherEngine>(
        &self,
        engine: &E,
        data: &[u8],
    ) -> Result<[u8; DEFAULT_DIGEST_BYTES], EnvelopeError> {
        let raw = self.digest(engine, data, DEFAULT_DIGEST)?;
        raw.as_slice()
            .try_into()
            .map_err(|_| EnvelopeError::DigestComputationFailed)
    }
}
