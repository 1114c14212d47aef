//! Compression Codec Identifiers
//!
//! A keyfile compresses each block independently with a single codec,
//! recorded as a `u16` in the file header.
//!
//! ## Codecs
//! - **None**: blocks are stored raw and served zero-copy
//! - **Snappy**: fast decompression, the traditional codec for this file
//!   family
//! - **LZ4**: fast decompression with a slightly better ratio
//! - **Zstd**: reserved id; files using it are rejected at load time with
//!   `Error::Unsupported`

/// Compression codec applied to every block of a keyfile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    None = 0,
    Snappy = 1,
    Lz4 = 2,
    Zstd = 3,
}

impl Compression {
    /// Whether blocks need a decompression buffer to be read.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Compression::None)
    }
}

impl TryFrom<u16> for Compression {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Snappy),
            2 => Ok(Compression::Lz4),
            3 => Ok(Compression::Zstd),
            _ => Err(crate::Error::InvalidCompression(value)),
        }
    }
}
