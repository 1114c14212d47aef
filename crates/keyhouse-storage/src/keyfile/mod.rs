//! Keyfile Storage Format
//!
//! This module implements the on-disk format of keyfiles and the machinery
//! for reading them.
//!
//! ## Keyfile Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header (32 bytes)                                           │
//! │ - Magic bytes: "KEYF" (4 bytes)                             │
//! │ - Version: 1 (2 bytes)                                      │
//! │ - Compression: None/Snappy/Lz4/Zstd (2 bytes)               │
//! │ - Block count (4 bytes)                                     │
//! │ - Record count (8 bytes)                                    │
//! │ - Total uncompressed payload bytes (8 bytes)                │
//! │ - Reserved (4 bytes)                                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Block 1 (independently compressed)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Block 2                                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │ ...                                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Index                                                       │
//! │ - Entry count (4 bytes)                                     │
//! │ - For each block:                                           │
//! │   * File position (8 bytes)                                 │
//! │   * Stored length (4 bytes)                                 │
//! │   * Uncompressed length (4 bytes)                           │
//! │   * Minimum key length (2 bytes) + minimum key bytes        │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Footer (32 bytes)                                           │
//! │ - Index position (8 bytes)                                  │
//! │ - CRC32 checksum (4 bytes)                                  │
//! │ - Magic bytes: "KEYF" again (4 bytes)                       │
//! │ - Reserved (16 bytes)                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Block Format (Uncompressed Payload)
//!
//! ```text
//! Block header: "KEYBLCK1" (8 bytes, skipped by the scanner)
//! Record 1:
//!   - Key length (u32, big-endian)
//!   - Value length (u32, big-endian)
//!   - Key bytes
//!   - Value bytes
//! Record 2:
//!   ...
//! ```
//!
//! Records within a block - and blocks within a file - are sorted ascending
//! by raw byte comparison of the key. Duplicate keys are permitted and are
//! always stored contiguously.
//!
//! ## Why This Design?
//!
//! ### Per-Block Compression
//! - A lookup only ever inflates the one block it needs
//! - Corruption is contained to a single block
//! - Uncompressed files can serve blocks zero-copy
//!
//! ### Minimum Keys in the Index
//! - Binary search over minimum keys resolves a key to its block
//! - The search can start from the cursor's current block, so ordered
//!   query streams skip ahead instead of re-searching from the start
//! - "Minimum key greater than the query" proves not-found with no load
//!
//! ### CRC32 Checksum
//! - Detects corruption from storage or transfer in one pass at open
//! - Covers everything before the footer

pub mod index;
pub mod reader;
pub mod scanner;

/// Magic bytes for keyfiles: "KEYF"
pub const FILE_MAGIC: [u8; 4] = *b"KEYF";

/// Version number for the keyfile format
pub const FORMAT_VERSION: u16 = 1;

/// Keyfile header size (32 bytes)
pub const HEADER_SIZE: usize = 32;

/// Keyfile footer size (32 bytes)
pub const FOOTER_SIZE: usize = 32;

/// Block header: magic prefix of every uncompressed block payload.
/// Opaque to the scanner, which starts reading records just past it.
pub const BLOCK_MAGIC: [u8; 8] = *b"KEYBLCK1";

/// Size of the block header the scanner skips (8 bytes)
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Per-record framing ahead of the key/value bytes: two big-endian u32
/// lengths (8 bytes)
pub const RECORD_LENGTHS_SIZE: usize = 8;
