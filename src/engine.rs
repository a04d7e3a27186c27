//! Cipher engine: the raw primitives the envelope layer calls into.
//!
//! The [`CipherEngine`] trait is the seam between the protocol logic and the
//! actual cryptography. [`RustCryptoEngine`] is the built-in implementation:
//!
//! | cipher        | key | IV | mode                         |
//! |---------------|-----|----|------------------------------|
//! | `aes-128-ctr` | 16  | 16 | CTR, 128-bit big-endian ctr  |
//! | `aes-192-ctr` | 24  | 16 | CTR, 128-bit big-endian ctr  |
//! | `aes-256-ctr` | 32  | 16 | CTR, 128-bit big-endian ctr  |
//! | `aes-128-gcm` | 16  | 12 | GCM, tag 12..=16 bytes       |
//! | `aes-192-gcm` | 24  | 12 | GCM, tag 12..=16 bytes       |
//! | `aes-256-gcm` | 32  | 12 | GCM, tag 12..=16 bytes       |
//!
//! Keys shorter or longer than the cipher's key size are zero-padded or
//! truncated, matching OpenSSL's `EVP` behaviour for fixed-size keys.

use aes_gcm::{
    aead::{
        consts::{U12, U13, U14, U15, U16},
        generic_array::{typenum::Unsigned, GenericArray},
        AeadCore, AeadInPlace, KeyInit,
    },
    aes::{Aes128, Aes192, Aes256},
    AesGcm,
};
use ctr::cipher::{KeyIvInit, StreamCipher};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};
use thiserror::Error;
use zeroize::Zeroizing;

/// Maximum GCM plaintext length (NIST SP 800-38D): 2^39 - 256 bits.
pub const GCM_MAX_PLAINTEXT_BYTES: u64 = (1 << 36) - 32;

/// Valid GCM tag lengths in bytes.
pub const GCM_TAG_LENGTHS: core::ops::RangeInclusive<usize> = 12..=16;

/// Failures reported by a [`CipherEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown cipher: {0}")]
    UnknownCipher(String),

    #[error("unknown digest: {0}")]
    UnknownDigest(String),

    #[error("invalid key")]
    InvalidKey,

    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("unsupported tag length: {0}")]
    InvalidTagLength(usize),

    /// An authenticated cipher was called without its tag/AAD parameters.
    #[error("missing AEAD parameters")]
    MissingAeadParams,

    #[error("random source failure")]
    Random,

    /// The primitive refused the operation (authentication failure included).
    #[error("cipher operation rejected")]
    Rejected,
}

/// AEAD inputs for encryption.
#[derive(Debug, Clone, Copy)]
pub struct AeadSeal<'a> {
    pub aad: &'a [u8],
    pub tag_length: usize,
}

/// AEAD inputs for decryption.
#[derive(Debug, Clone, Copy)]
pub struct AeadOpen<'a> {
    pub aad: &'a [u8],
    pub tag: &'a [u8],
}

/// Raw cipher output. `tag` is empty for non-authenticated ciphers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherOutput {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Symmetric primitives used by the envelope layer.
///
/// Cipher and digest names are matched ASCII case-insensitively.
pub trait CipherEngine {
    /// Cipher names this engine can run. With `include_aliases`, alternate
    /// spellings are listed too.
    fn available_ciphers(&self, include_aliases: bool) -> Vec<String>;

    /// Digest names this engine can compute.
    fn available_digests(&self, include_aliases: bool) -> Vec<String>;

    /// Required IV length for `cipher`, or `None` if unknown.
    fn cipher_iv_length(&self, cipher: &str) -> Option<usize>;

    /// Whether `cipher` is an AEAD mode.
    fn is_authenticated(&self, cipher: &str) -> bool {
        cipher.to_ascii_lowercase().contains("gcm")
    }

    fn secure_random_bytes(&self, count: usize) -> Result<Vec<u8>, EngineError>;

    fn encrypt(
        &self,
        cipher: &str,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
        aead: Option<AeadSeal<'_>>,
    ) -> Result<CipherOutput, EngineError>;

    fn decrypt(
        &self,
        cipher: &str,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
        aead: Option<AeadOpen<'_>>,
    ) -> Result<Vec<u8>, EngineError>;

    /// Raw (binary) digest of `data`.
    fn digest(&self, digest: &str, data: &[u8]) -> Result<Vec<u8>, EngineError>;
}

impl<E: CipherEngine + ?Sized> CipherEngine for &E {
    fn available_ciphers(&self, include_aliases: bool) -> Vec<String> {
        (**self).available_ciphers(include_aliases)
    }

    fn available_digests(&self, include_aliases: bool) -> Vec<String> {
        (**self).available_digests(include_aliases)
    }

    fn cipher_iv_length(&self, cipher: &str) -> Option<usize> {
        (**self).cipher_iv_length(cipher)
    }

    fn is_authenticated(&self, cipher: &str) -> bool {
        (**self).is_authenticated(cipher)
    }

    fn secure_random_bytes(&self, count: usize) -> Result<Vec<u8>, EngineError> {
        (**self).secure_random_bytes(count)
    }

    fn encrypt(
        &self,
        cipher: &str,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
        aead: Option<AeadSeal<'_>>,
    ) -> Result<CipherOutput, EngineError> {
        (**self).encrypt(cipher, key, iv, data, aead)
    }

    fn decrypt(
        &self,
        cipher: &str,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
        aead: Option<AeadOpen<'_>>,
    ) -> Result<Vec<u8>, EngineError> {
        (**self).decrypt(cipher, key, iv, data, aead)
    }

    fn digest(&self, digest: &str, data: &[u8]) -> Result<Vec<u8>, EngineError> {
        (**self).digest(digest, data)
    }
}

// ---------------------------------------------------------------------------
// RustCrypto-backed engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ctr,
    Gcm,
}

#[derive(Debug, Clone, Copy)]
struct CipherSpec {
    name: &'static str,
    key_bytes: usize,
    mode: Mode,
}

impl CipherSpec {
    fn iv_bytes(&self) -> usize {
        match self.mode {
            Mode::Ctr => 16,
            Mode::Gcm => 12,
        }
    }
}

const CIPHERS: &[CipherSpec] = &[
    CipherSpec { name: "aes-128-ctr", key_bytes: 16, mode: Mode::Ctr },
    CipherSpec { name: "aes-192-ctr", key_bytes: 24, mode: Mode::Ctr },
    CipherSpec { name: "aes-256-ctr", key_bytes: 32, mode: Mode::Ctr },
    CipherSpec { name: "aes-128-gcm", key_bytes: 16, mode: Mode::Gcm },
    CipherSpec { name: "aes-192-gcm", key_bytes: 24, mode: Mode::Gcm },
    CipherSpec { name: "aes-256-gcm", key_bytes: 32, mode: Mode::Gcm },
];

const DIGESTS: &[&str] = &["sha224", "sha256", "sha384", "sha512", "sha3-256", "sha3-512"];

fn cipher_spec(name: &str) -> Option<&'static CipherSpec> {
    CIPHERS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

fn with_aliases(names: impl Iterator<Item = &'static str>, include_aliases: bool) -> Vec<String> {
    let mut out = Vec::new();
    for name in names {
        out.push(name.to_owned());
        if include_aliases {
            out.push(name.to_ascii_uppercase());
        }
    }
    out
}

/// Copy `key` into a buffer of exactly `size` bytes, zero-padding or truncating.
fn normalize_key(key: &[u8], size: usize) -> Result<Zeroizing<Vec<u8>>, EngineError> {
    if key.is_empty() {
        return Err(EngineError::InvalidKey);
    }
    let mut out = Zeroizing::new(vec![0u8; size]);
    let n = key.len().min(size);
    out[..n].copy_from_slice(&key[..n]);
    Ok(out)
}

fn check_iv(spec: &CipherSpec, iv: &[u8]) -> Result<(), EngineError> {
    if iv.len() != spec.iv_bytes() {
        return Err(EngineError::InvalidIvLength {
            expected: spec.iv_bytes(),
            actual: iv.len(),
        });
    }
    Ok(())
}

fn ctr_apply<C: KeyIvInit + StreamCipher>(
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, EngineError> {
    let mut cipher = C::new_from_slices(key, iv).map_err(|_| EngineError::InvalidKey)?;
    let mut buf = data.to_vec();
    cipher
        .try_apply_keystream(&mut buf)
        .map_err(|_| EngineError::Rejected)?;
    Ok(buf)
}

fn gcm_seal<C: AeadInPlace + KeyInit>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    data: &[u8],
) -> Result<CipherOutput, EngineError> {
    let cipher = C::new_from_slice(key).map_err(|_| EngineError::InvalidKey)?;
    if iv.len() != <<C as AeadCore>::NonceSize as Unsigned>::USIZE {
        return Err(EngineError::InvalidIvLength {
            expected: <<C as AeadCore>::NonceSize as Unsigned>::USIZE,
            actual: iv.len(),
        });
    }
    let nonce = GenericArray::from_slice(iv);
    let mut buf = data.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(nonce, aad, &mut buf)
        .map_err(|_| EngineError::Rejected)?;
    Ok(CipherOutput {
        ciphertext: buf,
        tag: tag.to_vec(),
    })
}

fn gcm_open<C: AeadInPlace + KeyInit>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    tag: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, EngineError> {
    let cipher = C::new_from_slice(key).map_err(|_| EngineError::InvalidKey)?;
    if iv.len() != <<C as AeadCore>::NonceSize as Unsigned>::USIZE {
        return Err(EngineError::InvalidIvLength {
            expected: <<C as AeadCore>::NonceSize as Unsigned>::USIZE,
            actual: iv.len(),
        });
    }
    if tag.len() != <<C as AeadCore>::TagSize as Unsigned>::USIZE {
        return Err(EngineError::InvalidTagLength(tag.len()));
    }
    let nonce = GenericArray::from_slice(iv);
    let tag = GenericArray::from_slice(tag);
    let mut buf = data.to_vec();
    cipher
        .decrypt_in_place_detached(nonce, aad, &mut buf, tag)
        .map_err(|_| EngineError::Rejected)?;
    Ok(buf)
}

// GCM is generic over block cipher and tag size; pick the monomorphization.
macro_rules! gcm_dispatch {
    ($func:ident, $aes:ty, $tag_len:expr, $($arg:expr),+) => {
        match $tag_len {
            12 => $func::<AesGcm<$aes, U12, U12>>($($arg),+),
            13 => $func::<AesGcm<$aes, U12, U13>>($($arg),+),
            14 => $func::<AesGcm<$aes, U12, U14>>($($arg),+),
            15 => $func::<AesGcm<$aes, U12, U15>>($($arg),+),
            16 => $func::<AesGcm<$aes, U12, U16>>($($arg),+),
            other => Err(EngineError::InvalidTagLength(other)),
        }
    };
}

/// [`CipherEngine`] backed by the RustCrypto `aes`, `aes-gcm`, `ctr`, `sha2`
/// and `sha3` crates, with randomness from the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoEngine;

impl RustCryptoEngine {
    pub fn new() -> Self {
        Self
    }
}

impl CipherEngine for RustCryptoEngine {
    fn available_ciphers(&self, include_aliases: bool) -> Vec<String> {
        with_aliases(CIPHERS.iter().map(|c| c.name), include_aliases)
    }

    fn available_digests(&self, include_aliases: bool) -> Vec<String> {
        with_aliases(DIGESTS.iter().copied(), include_aliases)
    }

    fn cipher_iv_length(&self, cipher: &str) -> Option<usize> {
        cipher_spec(cipher).map(CipherSpec::iv_bytes)
    }

    fn is_authenticated(&self, cipher: &str) -> bool {
        matches!(cipher_spec(cipher), Some(spec) if spec.mode == Mode::Gcm)
    }

    fn secure_random_bytes(&self, count: usize) -> Result<Vec<u8>, EngineError> {
        let mut out = vec![0u8; count];
        getrandom::getrandom(&mut out).map_err(|_| EngineError::Random)?;
        Ok(out)
    }

    fn encrypt(
        &self,
        cipher: &str,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
        aead: Option<AeadSeal<'_>>,
    ) -> Result<CipherOutput, EngineError> {
        let spec = cipher_spec(cipher).ok_or_else(|| EngineError::UnknownCipher(cipher.into()))?;
        check_iv(spec, iv)?;
        let key = normalize_key(key, spec.key_bytes)?;

        match spec.mode {
            Mode::Ctr => {
                let ciphertext = match spec.key_bytes {
                    16 => ctr_apply::<ctr::Ctr128BE<Aes128>>(&key, iv, data)?,
                    24 => ctr_apply::<ctr::Ctr128BE<Aes192>>(&key, iv, data)?,
                    _ => ctr_apply::<ctr::Ctr128BE<Aes256>>(&key, iv, data)?,
                };
                Ok(CipherOutput {
                    ciphertext,
                    tag: Vec::new(),
                })
            }
            Mode::Gcm => {
                let params = aead.ok_or(EngineError::MissingAeadParams)?;
                if data.len() as u64 > GCM_MAX_PLAINTEXT_BYTES {
                    return Err(EngineError::Rejected);
                }
                match spec.key_bytes {
                    16 => gcm_dispatch!(gcm_seal, Aes128, params.tag_length, &key, iv, params.aad, data),
                    24 => gcm_dispatch!(gcm_seal, Aes192, params.tag_length, &key, iv, params.aad, data),
                    _ => gcm_dispatch!(gcm_seal, Aes256, params.tag_length, &key, iv, params.aad, data),
                }
            }
        }
    }

    fn decrypt(
        &self,
        cipher: &str,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
        aead: Option<AeadOpen<'_>>,
    ) -> Result<Vec<u8>, EngineError> {
        let spec = cipher_spec(cipher).ok_or_else(|| EngineError::UnknownCipher(cipher.into()))?;
        check_iv(spec, iv)?;
        let key = normalize_key(key, spec.key_bytes)?;

        match spec.mode {
            // CTR decryption is the same keystream XOR.
            Mode::Ctr => match spec.key_bytes {
                16 => ctr_apply::<ctr::Ctr128BE<Aes128>>(&key, iv, data),
                24 => ctr_apply::<ctr::Ctr128BE<Aes192>>(&key, iv, data),
                _ => ctr_apply::<ctr::Ctr128BE<Aes256>>(&key, iv, data),
            },
            Mode::Gcm => {
                let params = aead.ok_or(EngineError::MissingAeadParams)?;
                let tag_len = params.tag.len();
                match spec.key_bytes {
                    16 => gcm_dispatch!(gcm_open, Aes128, tag_len, &key, iv, params.aad, params.tag, data),
                    24 => gcm_dispatch!(gcm_open, Aes192, tag_len, &key, iv, params.aad, params.tag, data),
                    _ => gcm_dispatch!(gcm_open, Aes256, tag_len, &key, iv, params.aad, params.tag, data),
                }
            }
        }
    }

    fn digest(&self, digest: &str, data: &[u8]) -> Result<Vec<u8>, EngineError> {
        let out = match digest.to_ascii_lowercase().as_str() {
            "sha224" => Sha224::digest(data).to_vec(),
            "sha256" => Sha256::digest(data).to_vec(),
            "sha384" => Sha384::digest(data).to_vec(),
            "sha512" => Sha512::digest(data).to_vec(),
            "sha3-256" => Sha3_256::digest(data).to_vec(),
            "sha3-512" => Sha3_512::digest(data).to_vec(),
            _ => return Err(EngineError::UnknownDigest(digest.into())),
        };
        Ok(out)
    }
}
