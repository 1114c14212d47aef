//! In-Memory Keyfile Builder
//!
//! Test tooling: builds small keyfiles entirely in memory so tests,
//! benches, and the bundled example have something to read. This is not a
//! general write path - one pass, everything resident, keys must be
//! appended pre-sorted - and it intentionally stays that way.
//!
//! ## Usage
//!
//! ```ignore
//! use keyhouse_storage::fixture::KeyFileBuilder;
//! use keyhouse_core::Compression;
//!
//! let mut builder = KeyFileBuilder::new(Compression::Lz4);
//! builder.add(b"abc", b"X");
//! builder.add(b"abc", b"Y"); // duplicates stay contiguous
//! builder.add(b"abd", b"Z");
//! let file_bytes = builder.finish();
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use keyhouse_core::Compression;

use crate::keyfile::{BLOCK_MAGIC, FILE_MAGIC, FOOTER_SIZE, FORMAT_VERSION, HEADER_SIZE};

/// Builds a keyfile from pre-sorted entries.
pub struct KeyFileBuilder {
    compression: Compression,
    block_size_target: usize,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl KeyFileBuilder {
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            block_size_target: 4096,
            entries: Vec::new(),
        }
    }

    /// Roll to a new block once the current payload reaches this size.
    /// A run of duplicate keys is never split across blocks.
    pub fn block_size_target(mut self, bytes: usize) -> Self {
        self.block_size_target = bytes;
        self
    }

    /// Append one record. Panics when keys are not appended in
    /// non-decreasing order - fixture misuse, not an input condition.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        if let Some((last, _)) = self.entries.last() {
            assert!(
                key >= &last[..],
                "keys must be appended in sorted order ({:?} after {:?})",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(last),
            );
        }
        self.entries.push((key.to_vec(), value.to_vec()));
    }

    /// Assemble the complete file.
    pub fn finish(self) -> Bytes {
        // Split entries into uncompressed block payloads.
        let mut payloads: Vec<Vec<u8>> = Vec::new();
        let mut min_keys: Vec<Vec<u8>> = Vec::new();
        let mut current: Vec<u8> = Vec::new();
        let mut last_key: Vec<u8> = Vec::new();

        for (key, value) in &self.entries {
            let roll = !current.is_empty()
                && current.len() >= self.block_size_target
                && key[..] != last_key[..];
            if roll {
                payloads.push(std::mem::take(&mut current));
            }
            if current.is_empty() {
                current.extend_from_slice(&BLOCK_MAGIC);
                min_keys.push(key.clone());
            }
            current.put_u32(key.len() as u32);
            current.put_u32(value.len() as u32);
            current.extend_from_slice(key);
            current.extend_from_slice(value);
            last_key.clear();
            last_key.extend_from_slice(key);
        }
        if !current.is_empty() {
            payloads.push(current);
        }

        let total_uncompressed: u64 = payloads.iter().map(|p| p.len() as u64).sum();

        // Header.
        let mut file = BytesMut::new();
        file.put_slice(&FILE_MAGIC);
        file.put_u16(FORMAT_VERSION);
        file.put_u16(self.compression as u16);
        file.put_u32(payloads.len() as u32);
        file.put_u64(self.entries.len() as u64);
        file.put_u64(total_uncompressed);
        file.put_bytes(0, HEADER_SIZE - file.len());

        // Blocks.
        let mut index_entries = Vec::with_capacity(payloads.len());
        for (payload, min_key) in payloads.iter().zip(&min_keys) {
            let stored = match self.compression {
                Compression::None => payload.clone(),
                Compression::Snappy => snap::raw::Encoder::new()
                    .compress_vec(payload)
                    .expect("snappy compression"),
                Compression::Lz4 => lz4_flex::block::compress(payload),
                Compression::Zstd => panic!("fixture cannot build Zstd files"),
            };
            index_entries.push((
                file.len() as u64,
                stored.len() as u32,
                payload.len() as u32,
                min_key.clone(),
            ));
            file.put_slice(&stored);
        }

        // Index.
        let index_position = file.len() as u64;
        file.put_u32(index_entries.len() as u32);
        for (file_position, stored_len, uncompressed_len, min_key) in index_entries {
            file.put_u64(file_position);
            file.put_u32(stored_len);
            file.put_u32(uncompressed_len);
            file.put_u16(min_key.len() as u16);
            file.put_slice(&min_key);
        }

        // Footer.
        let mut footer = BytesMut::new();
        footer.put_u64(index_position);
        footer.put_u32(crc32fast::hash(&file));
        footer.put_slice(&FILE_MAGIC);
        footer.put_bytes(0, FOOTER_SIZE - footer.len());
        file.put_slice(&footer);

        file.freeze()
    }
}

/// One-call convenience for tests: build a file from sorted `entries`.
pub fn build_keyfile(
    entries: &[(&[u8], &[u8])],
    compression: Compression,
    block_size_target: usize,
) -> Bytes {
    let mut builder = KeyFileBuilder::new(compression).block_size_target(block_size_target);
    for (key, value) in entries {
        builder.add(key, value);
    }
    builder.finish()
}
