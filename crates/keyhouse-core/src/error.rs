//! Error Types for KeyHouse
//!
//! This module defines all error types that can occur while opening and
//! scanning keyfiles.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! - `Io`: file system operations while opening a keyfile
//!
//! ### Data Integrity Errors
//! - `InvalidMagic`: file doesn't start/end with the expected magic bytes
//! - `CrcMismatch`: corruption detected via the footer checksum
//! - `InvalidFile`: malformed file or block data (truncated records, index
//!   positions out of bounds, bad block header)
//! - `Decompression`: a block failed to decompress (likely corruption)
//!
//! ### Version/Compatibility Errors
//! - `UnsupportedVersion`: file was written by a newer format version
//! - `InvalidCompression`: unknown compression codec id
//! - `Unsupported`: codec id is known but this build can't decode it
//!
//! ### Usage Contract Errors
//! - `OutOfOrderKey`: a scanner with key-order enforcement enabled was
//!   handed a key smaller than the previous one. Raised before any block
//!   work; never retried internally.
//!
//! Not-found is *not* an error: lookups report it as `Ok(None)` or an empty
//! `Vec`.
//!
//! ## Usage
//!
//! All fallible operations return `Result<T>`, aliased to
//! `Result<T, Error>`, so `?` propagation works throughout.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic bytes")]
    InvalidMagic,

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u16),

    #[error("Invalid compression type: {0}")]
    InvalidCompression(u16),

    #[error("CRC mismatch")]
    CrcMismatch,

    #[error("Invalid keyfile: {0}")]
    InvalidFile(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error("Out-of-order key: {key} queried after {last}")]
    OutOfOrderKey { key: String, last: String },
}

pub type Result<T> = std::result::Result<T, Error>;
