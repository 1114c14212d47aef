//! KeyHouse Storage Layer
//!
//! This crate implements the read path for keyfiles - immutable, sorted,
//! block-compressed key-value files served at high query rates.
//!
//! ## What is the Read Path?
//!
//! A keyfile is written once, then queried many times. The read path turns
//! raw file bytes into answered lookups:
//!
//! 1. **Opening**: Validating magic bytes, version, and CRC32 checksum, and
//!    materializing the block index from the footer
//! 2. **Block resolution**: Mapping a query key to the block that may hold
//!    it, skipping ahead from the current position under ordered queries
//! 3. **Decompression**: Inflating one block at a time into a reusable
//!    buffer (Snappy or LZ4), or serving uncompressed blocks zero-copy
//! 4. **Record scanning**: Walking the sorted records of a block to extract
//!    the first or all values stored under the key
//! 5. **Recycling**: Returning scanner resources to a bounded pool so
//!    sustained query load doesn't churn the allocator
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────┐
//! │   Caller    │ one logical caller per scanner
//! └──────┬──────┘
//!        │ get_first(key) / get_all(key)
//!        ▼
//! ┌─────────────────┐     ┌───────────────┐
//! │ Scanner         │────▶│ KeyOrderGuard │ rejects decreasing keys
//! │ - cursor state  │     └───────────────┘ (when enforcement is on)
//! │ - reuse buffer  │
//! └────────┬────────┘
//!          │ find_block / load_block
//!          ▼
//! ┌─────────────────┐     ┌───────────────┐
//! │ KeyFileReader   │────▶│ BlockIndex    │ per-block minimum keys
//! │ - file bytes    │     └───────────────┘
//! │ - ScannerPool   │
//! │ - StatsSink     │
//! └─────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keyhouse_storage::{KeyFileReader, ReaderConfig};
//!
//! let reader = Arc::new(KeyFileReader::open("users.keyfile", ReaderConfig::default())?);
//!
//! let mut scanner = reader.scanner();
//! // Keys must be presented in non-decreasing order while the (default)
//! // order enforcement is active.
//! if let Some(value) = scanner.get_first(b"user/1001")? {
//!     println!("found {} bytes", value.len());
//! }
//! let all = scanner.get_all(b"user/1002")?;
//! scanner.release();
//! ```
//!
//! ## Thread Safety
//!
//! A `KeyFileReader` is immutable after open and safe to share across
//! threads behind `Arc`. A `Scanner` mutates its cursor in place and belongs
//! to exactly one logical caller at a time; concurrency comes from each
//! caller drawing its own scanner from the reader.

pub mod config;
#[doc(hidden)]
pub mod fixture;
pub mod keyfile;
pub mod order;
pub mod pool;
pub mod stats;

pub use config::ReaderConfig;
pub use keyfile::reader::{BlockData, KeyFileReader};
pub use keyfile::scanner::Scanner;
pub use order::KeyOrderGuard;
pub use pool::ScannerPool;
pub use stats::{NoopStats, ScanStats, StatsSink};
