//! Per-call options for encryption and decryption.

/// Default AEAD tag length in bytes.
pub const DEFAULT_TAG_LENGTH: usize = 16;

/// How the envelope bytes are handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// Standard, padded base64 text.
    #[default]
    Base64,
    /// The envelope bytes as-is.
    Raw,
}

/// Which envelope layout to write and expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Self-describing layout with version and suite header.
    #[default]
    Versioned,
    /// Header-less `iv || hash-or-tag || ciphertext`. The reader must already
    /// know the cipher and, for AEAD, the tag length.
    Positional,
}

/// Options read on every encrypt/decrypt call.
///
/// `aad` and `tag_length` only apply to authenticated ciphers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub aad: Vec<u8>,
    pub tag_length: usize,
    pub encoding: OutputEncoding,
    pub format: WireFormat,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            aad: Vec::new(),
            tag_length: DEFAULT_TAG_LENGTH,
            encoding: OutputEncoding::Base64,
            format: WireFormat::Versioned,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additional authenticated data (bound to the ciphertext, not encrypted).
    pub fn with_aad(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.aad = aad.into();
        self
    }

    pub fn with_tag_length(mut self, tag_length: usize) -> Self {
        self.tag_length = tag_length;
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Shorthand for [`OutputEncoding::Raw`].
    pub fn raw(self) -> Self {
        self.with_encoding(OutputEncoding::Raw)
    }

    pub fn with_format(mut self, format: WireFormat) -> Self {
        self.format = format;
        self
    }

    /// Shorthand for [`WireFormat::Positional`].
    pub fn positional(self) -> Self {
        self.with_format(WireFormat::Positional)
    }
}
