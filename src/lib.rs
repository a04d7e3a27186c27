//! # Cipher Envelope
//!
//! Symmetric encryption envelopes: IV management and integrity protection
//! around AES-CTR and AES-GCM.
//!
//! ## Quick Start
//!
//! ```rust
//! use cipher_envelope::{EnvelopeCipher, Options};
//!
//! let cipher = EnvelopeCipher::default(); // aes-256-gcm
//! let options = Options::new().with_aad(b"record-42".to_vec());
//!
//! let sealed = cipher.encrypt(b"secret", b"my key", &options).unwrap();
//! let plaintext = cipher.decrypt(sealed.as_bytes(), b"my key", &options).unwrap();
//!
//! assert_eq!(plaintext, b"secret");
//! ```
//!
//! ## Security Properties
//!
//! - **Fresh IVs**: a new random IV per message unless the caller supplies one
//! - **Integrity**: SHA-256 over the ciphertext for CTR, the GCM tag for GCM
//! - **Verify before decrypt**: the hash is checked before any plaintext exists
//! - **Constant-time comparison** of stored and calculated hashes
//! - **Stable wire format**: versioned, self-describing
//!
//! ## What's NOT Provided
//!
//! - Key derivation or key management
//! - Streaming encryption
//! - Authentication of the IV on the digest path (the hash is unkeyed)

#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/cipher-envelope/0.1.0")]

// ---------------------------------------------------------------------------
// Internal modules
// ---------------------------------------------------------------------------

mod decryptor;
mod encryptor;
mod engine;
mod envelope;
mod error;
mod options;
mod suite;

// Wire helpers are public for the CLI and fuzzing, but the layout is
// versioned by PROTOCOL_VERSION rather than by semver.
#[doc(hidden)]
pub mod wire;

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

pub use decryptor::Decryptor;
pub use encryptor::{Encryptor, Integrity, Sealed};
pub use engine::{
    AeadOpen, AeadSeal, CipherEngine, CipherOutput, EngineError, RustCryptoEngine,
    GCM_MAX_PLAINTEXT_BYTES, GCM_TAG_LENGTHS,
};
pub use envelope::{inspect, EnvelopeCipher, EnvelopeInfo, DEFAULT_CIPHER, LEGACY_CIPHER};
pub use error::EnvelopeError;
pub use options::{Options, OutputEncoding, WireFormat, DEFAULT_TAG_LENGTH};
pub use suite::{
    suite_id, suite_name, CipherSuite, Iv, DEFAULT_DIGEST, DEFAULT_DIGEST_BYTES, SUITE_AES128_CTR,
    SUITE_AES128_GCM, SUITE_AES192_CTR, SUITE_AES192_GCM, SUITE_AES256_CTR, SUITE_AES256_GCM,
};
pub use wire::PROTOCOL_VERSION;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
