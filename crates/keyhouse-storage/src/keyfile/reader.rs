//! Keyfile Reader - Opening and Serving Immutable Key-Value Files
//!
//! This module implements `KeyFileReader`, which validates a keyfile,
//! materializes its block index, and serves block loads to scanners.
//!
//! ## What Does KeyFileReader Do?
//!
//! 1. **Validates the file** (magic bytes, version, CRC32 checksum)
//! 2. **Parses the header** for codec id and size metadata
//! 3. **Reads the index** of per-block minimum keys from the footer
//! 4. **Loads blocks on demand** into a scanner's reusable buffer,
//!    decompressing when the file's codec requires it
//! 5. **Hands out scanners**, recycled through the pool when possible
//!
//! ## Validation Process
//!
//! 1. Check the file is at least header + footer sized
//! 2. Verify magic bytes at the start
//! 3. Check the version is supported (currently v1)
//! 4. Read the footer to get the index position
//! 5. Verify the CRC32 of everything before the footer (skippable)
//! 6. Verify magic bytes at the end
//! 7. Parse index entries and check they agree with the header
//!
//! ## Thread Safety
//!
//! The reader is immutable after open and safe to share behind `Arc`.
//! Cursor state lives in [`Scanner`], one per logical caller; the stats
//! sink uses atomic adds and the pool is lock-free, so any number of
//! scanners can run against one reader concurrently.

use std::path::Path;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use keyhouse_core::{Compression, Error, Result};

use super::index::{BlockIndex, BlockIndexEntry};
use super::scanner::Scanner;
use super::{BLOCK_HEADER_SIZE, BLOCK_MAGIC, FILE_MAGIC, FOOTER_SIZE, FORMAT_VERSION, HEADER_SIZE};
use crate::config::ReaderConfig;
use crate::pool::ScannerPool;
use crate::stats::{NoopStats, StatsSink};

/// Where the bytes of a loaded block ended up.
#[derive(Debug)]
pub enum BlockData {
    /// Uncompressed block served zero-copy from the underlying file bytes.
    Mapped(Bytes),
    /// Block was decompressed into the caller's reuse buffer.
    Inflated,
}

#[derive(Debug, Clone)]
struct FileHeader {
    compression: Compression,
    block_count: u32,
    record_count: u64,
    total_uncompressed: u64,
}

/// Serves lookups against one immutable keyfile.
pub struct KeyFileReader {
    /// The complete file data
    data: Bytes,

    /// Parsed header metadata
    header: FileHeader,

    /// Per-block minimum keys, ascending
    index: BlockIndex,

    /// Recycling queue for released scanner buffers
    pool: ScannerPool,

    /// Receiver for per-phase query timings
    stats: Arc<dyn StatsSink>,

    /// Emit verbose per-query diagnostics; never affects results
    pub debug: bool,
}

impl KeyFileReader {
    /// Open a keyfile from disk.
    pub fn open<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(Bytes::from(data), config)
    }

    /// Open a keyfile already resident in memory.
    pub fn from_bytes(data: Bytes, config: ReaderConfig) -> Result<Self> {
        if data.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(Error::InvalidFile("file too small".to_string()));
        }

        let header = Self::read_header(&data)?;

        let footer_start = data.len() - FOOTER_SIZE;
        let index_position = Self::read_footer(&data, footer_start, config.verify_checksum)?;

        let index = Self::read_index(
            &data,
            index_position as usize,
            footer_start,
            header.block_count,
        )?;

        tracing::debug!(
            blocks = index.len(),
            records = header.record_count,
            codec = ?header.compression,
            "opened keyfile"
        );

        Ok(Self {
            data,
            header,
            index,
            pool: ScannerPool::new(config.pool_capacity),
            stats: Arc::new(NoopStats),
            debug: config.debug,
        })
    }

    /// Inject a stats sink. Call before sharing the reader.
    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    /// Read and validate the file header.
    fn read_header(data: &Bytes) -> Result<FileHeader> {
        let mut cursor = &data[..HEADER_SIZE];

        let mut magic = [0u8; 4];
        cursor.copy_to_slice(&mut magic);
        if magic != FILE_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let version = cursor.get_u16();
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let compression = Compression::try_from(cursor.get_u16())?;
        let block_count = cursor.get_u32();
        let record_count = cursor.get_u64();
        let total_uncompressed = cursor.get_u64();

        Ok(FileHeader {
            compression,
            block_count,
            record_count,
            total_uncompressed,
        })
    }

    /// Read and validate the footer; returns the index position.
    fn read_footer(data: &Bytes, footer_start: usize, verify_checksum: bool) -> Result<u64> {
        let mut cursor = &data[footer_start..];

        let index_position = cursor.get_u64();

        let stored_crc = cursor.get_u32();
        if verify_checksum {
            let calculated_crc = crc32fast::hash(&data[..footer_start]);
            if stored_crc != calculated_crc {
                return Err(Error::CrcMismatch);
            }
        }

        let mut magic = [0u8; 4];
        cursor.copy_to_slice(&mut magic);
        if magic != FILE_MAGIC {
            return Err(Error::InvalidMagic);
        }

        Ok(index_position)
    }

    /// Parse the index section into a [`BlockIndex`].
    fn read_index(
        data: &Bytes,
        index_start: usize,
        footer_start: usize,
        block_count: u32,
    ) -> Result<BlockIndex> {
        let mut cursor = data
            .get(index_start..footer_start)
            .ok_or_else(|| Error::InvalidFile("index position out of bounds".to_string()))?;

        if cursor.remaining() < 4 {
            return Err(Error::InvalidFile("truncated index".to_string()));
        }
        let entry_count = cursor.get_u32();
        if entry_count != block_count {
            return Err(Error::InvalidFile(format!(
                "index entry count {} does not match header block count {}",
                entry_count, block_count
            )));
        }

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            if cursor.remaining() < 8 + 4 + 4 + 2 {
                return Err(Error::InvalidFile("truncated index entry".to_string()));
            }
            let file_position = cursor.get_u64();
            let stored_len = cursor.get_u32();
            let uncompressed_len = cursor.get_u32();
            let min_key_len = cursor.get_u16() as usize;
            if cursor.remaining() < min_key_len {
                return Err(Error::InvalidFile("truncated index entry key".to_string()));
            }
            let min_key = Bytes::copy_from_slice(&cursor[..min_key_len]);
            cursor.advance(min_key_len);

            let end = file_position as usize + stored_len as usize;
            if end > index_start {
                return Err(Error::InvalidFile(format!(
                    "block extent {}..{} overruns index at {}",
                    file_position, end, index_start
                )));
            }

            entries.push(BlockIndexEntry::new(
                min_key,
                file_position,
                stored_len,
                uncompressed_len,
            ));
        }

        Ok(BlockIndex::new(entries))
    }

    /// Compression codec applied to every block of this file.
    pub fn compression(&self) -> Compression {
        self.header.compression
    }

    /// Total number of key-value records in the file.
    pub fn record_count(&self) -> u64 {
        self.header.record_count
    }

    pub fn block_index(&self) -> &BlockIndex {
        &self.index
    }

    pub fn pool(&self) -> &ScannerPool {
        &self.pool
    }

    pub(crate) fn stats(&self) -> &dyn StatsSink {
        &*self.stats
    }

    /// Id of the block that may contain `key`, searching from `from`
    /// onward. Returns an id >= `from` when keys are presented
    /// non-decreasing.
    pub fn find_block(&self, from: usize, key: &[u8]) -> usize {
        self.index.find_from(from, key)
    }

    /// Load block `block_id`, decompressing into `buf` when the codec
    /// requires it. `buf` is grown as needed; its initial size is only a
    /// capacity hint.
    pub fn load_block(&self, block_id: usize, buf: &mut Vec<u8>) -> Result<BlockData> {
        let entry = self
            .index
            .entry(block_id)
            .ok_or_else(|| Error::InvalidFile(format!("block id {} out of range", block_id)))?;

        let start = entry.file_position as usize;
        let end = start + entry.stored_len as usize;
        let stored = self
            .data
            .get(start..end)
            .ok_or_else(|| Error::InvalidFile("block extent out of bounds".to_string()))?;

        match self.header.compression {
            Compression::None => {
                Self::check_block_header(stored)?;
                Ok(BlockData::Mapped(self.data.slice(start..end)))
            }
            Compression::Snappy => {
                let len = entry.uncompressed_len as usize;
                buf.clear();
                buf.resize(len, 0);
                let written = snap::raw::Decoder::new()
                    .decompress(stored, buf)
                    .map_err(|e| Error::Decompression(e.to_string()))?;
                Self::check_inflated(buf, written, len)?;
                Ok(BlockData::Inflated)
            }
            Compression::Lz4 => {
                let len = entry.uncompressed_len as usize;
                buf.clear();
                buf.resize(len, 0);
                let written = lz4_flex::block::decompress_into(stored, buf)
                    .map_err(|e| Error::Decompression(e.to_string()))?;
                Self::check_inflated(buf, written, len)?;
                Ok(BlockData::Inflated)
            }
            Compression::Zstd => Err(Error::Unsupported(
                "Zstd decompression not yet implemented".to_string(),
            )),
        }
    }

    fn check_inflated(buf: &[u8], written: usize, expected: usize) -> Result<()> {
        if written != expected {
            return Err(Error::Decompression(format!(
                "expected {} bytes, got {}",
                expected, written
            )));
        }
        Self::check_block_header(buf)
    }

    fn check_block_header(payload: &[u8]) -> Result<()> {
        if payload.len() < BLOCK_HEADER_SIZE || payload[..BLOCK_HEADER_SIZE] != BLOCK_MAGIC {
            return Err(Error::InvalidFile("bad block header".to_string()));
        }
        Ok(())
    }

    /// Get a scanner for this reader: a recycled one from the pool when
    /// available, freshly constructed otherwise.
    pub fn scanner(self: &Arc<Self>) -> Scanner {
        let buf = self
            .pool
            .acquire()
            .unwrap_or_else(|| Vec::with_capacity(self.scan_buf_capacity()));
        Scanner::new(Arc::clone(self), buf)
    }

    /// Initial capacity for a fresh scanner's decompression buffer: 1.5x
    /// the mean uncompressed block length. A hint only - `load_block` grows
    /// the buffer whenever a block turns out larger.
    fn scan_buf_capacity(&self) -> usize {
        if !self.header.compression.is_compressed() || self.index.is_empty() {
            return 0;
        }
        let mean = self.header.total_uncompressed / self.index.len() as u64;
        (mean + mean / 2) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::build_keyfile;

    fn sample_entries() -> Vec<(Vec<u8>, Vec<u8>)> {
        (0..100u32)
            .map(|i| {
                (
                    format!("key{:04}", i).into_bytes(),
                    format!("value{}", i).into_bytes(),
                )
            })
            .collect()
    }

    fn sample_file(compression: Compression) -> Bytes {
        let entries = sample_entries();
        let pairs: Vec<(&[u8], &[u8])> = entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();
        build_keyfile(&pairs, compression, 256)
    }

    #[test]
    fn open_valid_file() {
        for compression in [Compression::None, Compression::Snappy, Compression::Lz4] {
            let reader =
                KeyFileReader::from_bytes(sample_file(compression), ReaderConfig::default())
                    .unwrap();
            assert_eq!(reader.compression(), compression);
            assert_eq!(reader.record_count(), 100);
            assert!(reader.block_index().len() > 1, "fixture should span blocks");
        }
    }

    #[test]
    fn file_too_small() {
        let result = KeyFileReader::from_bytes(Bytes::from(vec![0u8; 10]), ReaderConfig::default());
        assert!(matches!(result, Err(Error::InvalidFile(_))));
    }

    #[test]
    fn invalid_magic() {
        let mut data = sample_file(Compression::None).to_vec();
        data[0..4].copy_from_slice(b"JUNK");
        let result = KeyFileReader::from_bytes(Bytes::from(data), ReaderConfig::default());
        assert!(matches!(result, Err(Error::InvalidMagic)));
    }

    #[test]
    fn unsupported_version() {
        let mut data = sample_file(Compression::None).to_vec();
        data[4..6].copy_from_slice(&9u16.to_be_bytes());
        let result = KeyFileReader::from_bytes(Bytes::from(data), ReaderConfig::default());
        assert!(matches!(result, Err(Error::UnsupportedVersion(9))));
    }

    #[test]
    fn unknown_codec_id() {
        let mut data = sample_file(Compression::None).to_vec();
        data[6..8].copy_from_slice(&42u16.to_be_bytes());
        let result = KeyFileReader::from_bytes(Bytes::from(data), ReaderConfig::default());
        assert!(matches!(result, Err(Error::InvalidCompression(42))));
    }

    #[test]
    fn corrupted_byte_fails_crc() {
        let mut data = sample_file(Compression::Lz4).to_vec();
        let mid = data.len() / 2;
        data[mid] ^= 0xFF;
        let result = KeyFileReader::from_bytes(Bytes::from(data), ReaderConfig::default());
        assert!(matches!(result, Err(Error::CrcMismatch)));
    }

    #[test]
    fn checksum_verification_can_be_skipped() {
        let mut data = sample_file(Compression::None).to_vec();
        // Flip a bit inside the first block's payload; the header, index,
        // and footer stay structurally sound.
        data[HEADER_SIZE + BLOCK_HEADER_SIZE + 20] ^= 0x01;

        let config = ReaderConfig {
            verify_checksum: false,
            ..Default::default()
        };
        KeyFileReader::from_bytes(Bytes::from(data), config).unwrap();
    }

    #[test]
    fn corrupted_footer_magic() {
        let mut data = sample_file(Compression::None).to_vec();
        let footer_start = data.len() - FOOTER_SIZE;
        data[footer_start + 12..footer_start + 16].copy_from_slice(b"BAD!");
        let config = ReaderConfig {
            verify_checksum: false,
            ..Default::default()
        };
        let result = KeyFileReader::from_bytes(Bytes::from(data), config);
        assert!(matches!(result, Err(Error::InvalidMagic)));
    }

    #[test]
    fn zstd_files_fail_at_load_not_open() {
        let mut data = sample_file(Compression::None).to_vec();
        data[6..8].copy_from_slice(&(Compression::Zstd as u16).to_be_bytes());
        let config = ReaderConfig {
            verify_checksum: false,
            ..Default::default()
        };
        let reader = KeyFileReader::from_bytes(Bytes::from(data), config).unwrap();
        let mut buf = Vec::new();
        let result = reader.load_block(0, &mut buf);
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn load_block_grows_undersized_buffer() {
        let reader =
            KeyFileReader::from_bytes(sample_file(Compression::Snappy), ReaderConfig::default())
                .unwrap();
        let mut buf = Vec::new(); // deliberately no capacity
        let data = reader.load_block(0, &mut buf).unwrap();
        assert!(matches!(data, BlockData::Inflated));
        assert_eq!(&buf[..BLOCK_HEADER_SIZE], &BLOCK_MAGIC);
    }

    #[test]
    fn load_block_out_of_range() {
        let reader =
            KeyFileReader::from_bytes(sample_file(Compression::None), ReaderConfig::default())
                .unwrap();
        let blocks = reader.block_index().len();
        let mut buf = Vec::new();
        assert!(matches!(
            reader.load_block(blocks, &mut buf),
            Err(Error::InvalidFile(_))
        ));
    }

    #[test]
    fn uncompressed_blocks_are_mapped() {
        let reader =
            KeyFileReader::from_bytes(sample_file(Compression::None), ReaderConfig::default())
                .unwrap();
        let mut buf = Vec::new();
        match reader.load_block(0, &mut buf).unwrap() {
            BlockData::Mapped(bytes) => assert_eq!(&bytes[..BLOCK_HEADER_SIZE], &BLOCK_MAGIC),
            BlockData::Inflated => panic!("uncompressed block should be served zero-copy"),
        }
        assert!(buf.is_empty(), "reuse buffer must stay untouched");
    }

    #[test]
    fn empty_file_opens() {
        let reader = KeyFileReader::from_bytes(
            build_keyfile(&[], Compression::None, 256),
            ReaderConfig::default(),
        )
        .unwrap();
        assert_eq!(reader.record_count(), 0);
        assert!(reader.block_index().is_empty());
    }

    #[test]
    fn scan_buffer_capacity_hint() {
        let reader =
            KeyFileReader::from_bytes(sample_file(Compression::Lz4), ReaderConfig::default())
                .unwrap();
        let blocks = reader.block_index().len() as u64;
        let mean = reader.header.total_uncompressed / blocks;
        assert_eq!(reader.scan_buf_capacity(), (mean + mean / 2) as usize);

        let uncompressed =
            KeyFileReader::from_bytes(sample_file(Compression::None), ReaderConfig::default())
                .unwrap();
        assert_eq!(uncompressed.scan_buf_capacity(), 0);
    }
}
