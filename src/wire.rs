//! Wire formats.
//!
//! Versioned (default):
//!   version[1] || suite[1] || kind[1] || iv_len[1] || iv[iv_len] || body
//!
//!   kind 0x00 (digest): hash[32] || ciphertext
//!   kind 0x01 (aead):   tag_len[1] || aad_len[2 BE] || tag[tag_len] || aad[aad_len] || ciphertext
//!
//! Positional (header-less, reader must know the cipher):
//!   iv[iv_len] || hash[32] || ciphertext          (digest)
//!   iv[iv_len] || tag[tag_len] || ciphertext      (aead)
//!
//! Either layout is then base64-encoded for transport unless raw output is
//! requested.

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::EnvelopeError;
use crate::options::OutputEncoding;

/// Version byte for the versioned layout.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Envelope kinds (on-wire).
pub const KIND_DIGEST: u8 = 0x00;
pub const KIND_AEAD: u8 = 0x01;

/// Header size: version + suite + kind + iv_len
pub const HEADER_BYTES: usize = 1 + 1 + 1 + 1; // 4

/// SHA-256 output carried by digest envelopes.
pub const HASH_BYTES: usize = 32;

/// AEAD length fields: tag_len(u8) + aad_len(u16)
pub const AEAD_FIELDS_BYTES: usize = 1 + 2; // 3

/// Largest AAD the versioned layout can carry.
pub const MAX_AAD_BYTES: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// Envelope (tagged variant)
// ---------------------------------------------------------------------------

/// Borrowed view of one envelope's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope<'a> {
    /// Non-authenticated cipher protected by an external SHA-256 hash.
    Digest {
        iv: &'a [u8],
        hash: &'a [u8; HASH_BYTES],
        ciphertext: &'a [u8],
    },
    /// Authenticated cipher; the tag and AAD travel with the ciphertext.
    Aead {
        iv: &'a [u8],
        tag: &'a [u8],
        aad: &'a [u8],
        ciphertext: &'a [u8],
    },
}

impl<'a> Envelope<'a> {
    pub fn kind(&self) -> u8 {
        match self {
            Self::Digest { .. } => KIND_DIGEST,
            Self::Aead { .. } => KIND_AEAD,
        }
    }

    pub fn iv(&self) -> &'a [u8] {
        match *self {
            Self::Digest { iv, .. } | Self::Aead { iv, .. } => iv,
        }
    }

    pub fn ciphertext(&self) -> &'a [u8] {
        match *self {
            Self::Digest { ciphertext, .. } | Self::Aead { ciphertext, .. } => ciphertext,
        }
    }
}

/// Parsed versioned envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireComponents<'a> {
    pub version: u8,
    pub suite: u8,
    pub envelope: Envelope<'a>,
}

pub fn encode_wire(suite: u8, envelope: &Envelope<'_>) -> Result<Vec<u8>, EnvelopeError> {
    let iv = envelope.iv();
    let iv_len = u8::try_from(iv.len())
        .map_err(|_| EnvelopeError::MalformedEnvelope("iv longer than 255 bytes"))?;

    let body_len = match envelope {
        Envelope::Digest { ciphertext, .. } => HASH_BYTES + ciphertext.len(),
        Envelope::Aead {
            tag,
            aad,
            ciphertext,
            ..
        } => AEAD_FIELDS_BYTES + tag.len() + aad.len() + ciphertext.len(),
    };
    let mut out = Vec::with_capacity(HEADER_BYTES + iv.len() + body_len);

    out.push(PROTOCOL_VERSION);
    out.push(suite);
    out.push(envelope.kind());
    out.push(iv_len);
    out.extend_from_slice(iv);

    match envelope {
        Envelope::Digest {
            hash, ciphertext, ..
        } => {
            out.extend_from_slice(*hash);
            out.extend_from_slice(ciphertext);
        }
        Envelope::Aead {
            tag,
            aad,
            ciphertext,
            ..
        } => {
            let tag_len = u8::try_from(tag.len())
                .map_err(|_| EnvelopeError::InvalidOptions("tag longer than 255 bytes"))?;
            let aad_len = u16::try_from(aad.len())
                .map_err(|_| EnvelopeError::InvalidOptions("aad longer than 65535 bytes"))?;
            out.push(tag_len);
            out.extend_from_slice(&aad_len.to_be_bytes());
            out.extend_from_slice(tag);
            out.extend_from_slice(aad);
            out.extend_from_slice(ciphertext);
        }
    }

    Ok(out)
}

/// Split `data` at `at`, failing as malformed when too short.
fn take<'a>(data: &'a [u8], at: usize, what: &'static str) -> Result<(&'a [u8], &'a [u8]), EnvelopeError> {
    if data.len() < at {
        return Err(EnvelopeError::MalformedEnvelope(what));
    }
    Ok(data.split_at(at))
}

pub fn decode_wire(data: &[u8]) -> Result<WireComponents<'_>, EnvelopeError> {
    let (header, rest) = take(data, HEADER_BYTES, "truncated header")?;

    let version = header[0];
    let suite = header[1];
    let kind = header[2];
    let iv_len = header[3] as usize;

    if version != PROTOCOL_VERSION {
        return Err(EnvelopeError::UnsupportedVersion(version));
    }
    if iv_len == 0 {
        return Err(EnvelopeError::MalformedEnvelope("empty iv"));
    }

    let (iv, rest) = take(rest, iv_len, "truncated iv")?;

    let envelope = match kind {
        KIND_DIGEST => {
            let (hash, ciphertext) = take(rest, HASH_BYTES, "truncated hash")?;
            let hash: &[u8; HASH_BYTES] = hash
                .try_into()
                .map_err(|_| EnvelopeError::MalformedEnvelope("truncated hash"))?;
            Envelope::Digest {
                iv,
                hash,
                ciphertext,
            }
        }
        KIND_AEAD => {
            let (fields, rest) = take(rest, AEAD_FIELDS_BYTES, "truncated aead fields")?;
            let tag_len = fields[0] as usize;
            let aad_len = u16::from_be_bytes([fields[1], fields[2]]) as usize;
            let (tag, rest) = take(rest, tag_len, "truncated tag")?;
            let (aad, ciphertext) = take(rest, aad_len, "truncated aad")?;
            Envelope::Aead {
                iv,
                tag,
                aad,
                ciphertext,
            }
        }
        _ => return Err(EnvelopeError::MalformedEnvelope("unknown envelope kind")),
    };

    Ok(WireComponents {
        version,
        suite,
        envelope,
    })
}

// ---------------------------------------------------------------------------
// Positional layout
// ---------------------------------------------------------------------------

/// Slices of a positional envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalParts<'a> {
    pub iv: &'a [u8],
    /// Hash (digest path) or tag (AEAD path).
    pub integrity: &'a [u8],
    pub ciphertext: &'a [u8],
}

pub fn encode_positional(iv: &[u8], integrity: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(iv.len() + integrity.len() + ciphertext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(integrity);
    out.extend_from_slice(ciphertext);
    out
}

/// Slice `data` at `[0, iv)`, `[iv, iv+n)`, `[iv+n, end)`.
pub fn decode_positional(
    data: &[u8],
    iv_length: usize,
    integrity_length: usize,
) -> Result<PositionalParts<'_>, EnvelopeError> {
    let min = iv_length
        .checked_add(integrity_length)
        .ok_or(EnvelopeError::MalformedEnvelope("shorter than iv + integrity"))?;
    if data.len() < min {
        return Err(EnvelopeError::MalformedEnvelope("shorter than iv + integrity"));
    }
    let (iv, rest) = data.split_at(iv_length);
    let (integrity, ciphertext) = rest.split_at(integrity_length);
    Ok(PositionalParts {
        iv,
        integrity,
        ciphertext,
    })
}

// ---------------------------------------------------------------------------
// Transport encoding
// ---------------------------------------------------------------------------

pub fn encode_transport(envelope: Vec<u8>, encoding: OutputEncoding) -> Vec<u8> {
    match encoding {
        OutputEncoding::Base64 => STANDARD.encode(envelope).into_bytes(),
        OutputEncoding::Raw => envelope,
    }
}

/// Undo [`encode_transport`]. Base64 input may carry surrounding whitespace.
pub fn decode_transport(data: &[u8], encoding: OutputEncoding) -> Result<Cow<'_, [u8]>, EnvelopeError> {
    match encoding {
        OutputEncoding::Raw => Ok(Cow::Borrowed(data)),
        OutputEncoding::Base64 => STANDARD
            .decode(trim_ascii_whitespace(data))
            .map(Cow::Owned)
            .map_err(|_| EnvelopeError::MalformedEnvelope("invalid base64")),
    }
}

fn trim_ascii_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &data[start..end]
}
