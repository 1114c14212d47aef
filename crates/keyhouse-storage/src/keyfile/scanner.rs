//! Scanner - The Keyfile Lookup Cursor
//!
//! This module implements `Scanner`, the stateful cursor that answers
//! point and multi-value lookups against one [`KeyFileReader`].
//!
//! ## How a Lookup Works
//!
//! 1. **Order check**: with enforcement on (the default), a key smaller
//!    than the previous one fails with `OutOfOrderKey` before any block
//!    work
//! 2. **Fast path**: when the current block's minimum key already exceeds
//!    the query key, report not-found with zero block loads
//! 3. **Block resolution**: binary-search the index from the current block
//!    onward; load and decompress the target block only when the cursor
//!    actually moves (or nothing is loaded yet)
//! 4. **Record scan**: walk the sorted records from the saved in-block
//!    offset - skip smaller keys, copy out values for equal keys, stop at
//!    the first greater key and remember where it was
//!
//! The persisted offset is what makes ordered query streams cheap: a query
//! for an equal-or-greater key resumes scanning exactly where the last one
//! stopped, and walking off the end of a block flows naturally into loading
//! the next one.
//!
//! ## Ordered Queries and the Fast Path
//!
//! The not-found fast path in step 2 is only sound while keys arrive in
//! non-decreasing order, because the cursor never moves backwards on its
//! own. With `enforce_key_order` disabled that precondition is unchecked:
//! an out-of-order query may report not-found for a key that exists in an
//! earlier block. That is a deliberate trade-off - callers with naturally
//! sorted workloads skip the per-query comparison - not a defect. Call
//! [`Scanner::reset`] before starting an unrelated (re-descending) key
//! sequence.
//!
//! ## Usage Example
//!
//! ```ignore
//! let mut scanner = reader.scanner();
//! for key in sorted_keys {
//!     if let Some(value) = scanner.get_first(key)? {
//!         serve(key, value);
//!     }
//! }
//! scanner.release();
//! ```
//!
//! ## Thread Safety
//!
//! A scanner mutates its cursor fields in place and must be driven by one
//! logical caller at a time. Concurrency comes from many scanners sharing
//! one reader, not from sharing a scanner.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use keyhouse_core::{Error, Result};

use super::reader::{BlockData, KeyFileReader};
use super::{BLOCK_HEADER_SIZE, RECORD_LENGTHS_SIZE};
use crate::order::{hex_bytes, KeyOrderGuard};

/// Reusable cursor performing ordered point and multi-value lookups.
pub struct Scanner {
    reader: Arc<KeyFileReader>,

    /// Block the cursor is currently positioned on
    block_id: usize,

    /// The currently loaded block, if any
    block: Option<BlockData>,

    /// Byte offset of the next unscanned record in the loaded block
    pos: usize,

    /// Reusable decompression buffer; holds the block payload when
    /// `block` is `Inflated`
    buf: Vec<u8>,

    /// When true (the default), decreasing query keys fail with
    /// `OutOfOrderKey` instead of risking a silently wrong not-found.
    /// Set before use.
    pub enforce_key_order: bool,

    guard: KeyOrderGuard,
}

impl Scanner {
    pub(crate) fn new(reader: Arc<KeyFileReader>, buf: Vec<u8>) -> Self {
        Self {
            reader,
            block_id: 0,
            block: None,
            pos: 0,
            buf,
            enforce_key_order: true,
            guard: KeyOrderGuard::new(),
        }
    }

    /// The first value stored under `key`, or `None`. Stops scanning at
    /// the first match.
    pub fn get_first(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        let timer = self.reader.stats().enabled().then(Instant::now);
        let resolved = self.ensure_block(key);
        if let Some(t) = timer {
            self.reader
                .stats()
                .add_resolve_nanos(t.elapsed().as_nanos() as u64);
        }
        if !resolved? {
            if self.reader.debug {
                tracing::debug!(key = %hex_bytes(key), "no candidate block for key");
            }
            return Ok(None);
        }

        if self.reader.debug {
            tracing::debug!(key = %hex_bytes(key), pos = self.pos, "scanning block for first value");
        }

        let timer = self.reader.stats().enabled().then(Instant::now);
        let mut pos = self.pos;
        let scanned = scan_records(self.block_bytes(), &mut pos, key, true);
        if let Some(t) = timer {
            self.reader
                .stats()
                .add_extract_nanos(t.elapsed().as_nanos() as u64);
        }

        let mut values = scanned?;
        self.pos = pos;
        Ok(values.pop())
    }

    /// Every value stored under `key`, in on-disk order. Empty when the
    /// key is absent.
    pub fn get_all(&mut self, key: &[u8]) -> Result<Vec<Bytes>> {
        let timer = self.reader.stats().enabled().then(Instant::now);
        let resolved = self.ensure_block(key);
        if let Some(t) = timer {
            self.reader
                .stats()
                .add_resolve_nanos(t.elapsed().as_nanos() as u64);
        }
        if !resolved? {
            if self.reader.debug {
                tracing::debug!(key = %hex_bytes(key), "no candidate block for key");
            }
            return Ok(Vec::new());
        }

        if self.reader.debug {
            tracing::debug!(key = %hex_bytes(key), pos = self.pos, "scanning block for all values");
        }

        let timer = self.reader.stats().enabled().then(Instant::now);
        let mut pos = self.pos;
        let scanned = scan_records(self.block_bytes(), &mut pos, key, false);
        if let Some(t) = timer {
            self.reader
                .stats()
                .add_extract_nanos(t.elapsed().as_nanos() as u64);
        }

        let values = scanned?;
        self.pos = pos;
        Ok(values)
    }

    /// Return the cursor to its initial state: block 0, nothing loaded,
    /// ordering guard cleared. Required before starting an unrelated key
    /// sequence.
    pub fn reset(&mut self) {
        self.block_id = 0;
        self.block = None;
        self.pos = 0;
        self.guard.reset();
    }

    /// Reset, then hand the scanner's reusable buffer back to the
    /// reader's pool. A full pool drops it; nothing blocks either way.
    pub fn release(mut self) {
        self.reset();
        let buf = std::mem::take(&mut self.buf);
        self.reader.pool().release(buf);
    }

    /// The most recent key the ordering guard has seen.
    pub fn last_key(&self) -> Option<&[u8]> {
        self.guard.last_key()
    }

    /// Position the cursor on the block that may contain `key`, loading
    /// it when the cursor moves. `Ok(false)` means no block can contain
    /// `key` - decided without any load.
    fn ensure_block(&mut self, key: &[u8]) -> Result<bool> {
        if self.enforce_key_order {
            self.guard.observe(key)?;
        }

        let Some(entry) = self.reader.block_index().entry(self.block_id) else {
            return Ok(false); // empty file
        };
        if entry.is_after(key) {
            return Ok(false);
        }

        let target = self.reader.find_block(self.block_id, key);
        if target != self.block_id || self.block.is_none() {
            if self.reader.debug {
                tracing::debug!(from = self.block_id, to = target, "loading block");
            }
            let loaded = self.reader.load_block(target, &mut self.buf)?;
            self.block = Some(loaded);
            self.block_id = target;
            self.pos = BLOCK_HEADER_SIZE;
        }

        Ok(true)
    }

    fn block_bytes(&self) -> &[u8] {
        match &self.block {
            Some(BlockData::Mapped(bytes)) => bytes,
            Some(BlockData::Inflated) => &self.buf,
            None => &[],
        }
    }
}

/// Walk the records of `block` from `*pos` looking for `key`.
///
/// Values of matching records are copied out, decoupling them from the
/// scanner's reusable storage. On return `*pos` sits at the first record
/// with a greater key (or at block end), so a later query with an
/// equal-or-greater key resumes without rework. `*pos` is only left
/// untouched on a malformed record.
fn scan_records(
    block: &[u8],
    pos: &mut usize,
    key: &[u8],
    first_only: bool,
) -> Result<Vec<Bytes>> {
    let mut acc = Vec::new();
    let mut i = *pos;

    while block.len() - i > RECORD_LENGTHS_SIZE {
        let key_len = read_u32(block, i) as usize;
        let val_len = read_u32(block, i + 4) as usize;
        let key_start = i + RECORD_LENGTHS_SIZE;
        let key_end = key_start + key_len;
        let val_end = key_end + val_len;
        if val_end > block.len() {
            return Err(Error::InvalidFile(
                "record overruns block payload".to_string(),
            ));
        }

        match block[key_start..key_end].cmp(key) {
            Ordering::Equal => {
                let value = Bytes::copy_from_slice(&block[key_end..val_end]);
                i = val_end;
                if first_only {
                    *pos = i;
                    return Ok(vec![value]);
                }
                // Duplicates are contiguous; keep scanning.
                acc.push(value);
            }
            Ordering::Greater => {
                // Park on this record so an equal-or-greater query
                // resumes here.
                *pos = i;
                return Ok(acc);
            }
            Ordering::Less => {
                i = val_end;
            }
        }
    }

    // Walked off the block; the next query proceeds to the following one.
    *pos = i;
    Ok(acc)
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
