//! Block Index
//!
//! The index maps keys to blocks: one entry per block, carrying the block's
//! minimum key, its position in the file, and its stored/uncompressed
//! lengths. Entries are parsed once at open, sorted ascending by minimum
//! key, and never mutated afterwards - every scanner of a reader searches
//! the same shared index.
//!
//! Resolution is a binary search for the last block whose minimum key does
//! not exceed the query key. The search accepts a hint position and only
//! looks at entries from the hint onward, which is what makes ordered query
//! streams cheap: a cursor that just served key K starts the search for the
//! next key at the block it is already on.

use bytes::Bytes;

/// Index entry for one block.
#[derive(Debug, Clone)]
pub struct BlockIndexEntry {
    /// The block's first (minimum) key
    min_key: Bytes,

    /// Offset of the stored block in the file
    pub(crate) file_position: u64,

    /// On-disk (possibly compressed) length of the block
    pub(crate) stored_len: u32,

    /// Length of the block payload after decompression
    pub(crate) uncompressed_len: u32,
}

impl BlockIndexEntry {
    pub(crate) fn new(
        min_key: Bytes,
        file_position: u64,
        stored_len: u32,
        uncompressed_len: u32,
    ) -> Self {
        Self {
            min_key,
            file_position,
            stored_len,
            uncompressed_len,
        }
    }

    pub fn min_key(&self) -> &[u8] {
        &self.min_key
    }

    /// Offset of the stored block in the file.
    pub fn file_position(&self) -> u64 {
        self.file_position
    }

    /// On-disk (possibly compressed) length of the block.
    pub fn stored_len(&self) -> u32 {
        self.stored_len
    }

    /// Length of the block payload after decompression.
    pub fn uncompressed_len(&self) -> u32 {
        self.uncompressed_len
    }

    /// True when this block's minimum key is strictly greater than `key`,
    /// i.e. the block (and every block after it) cannot contain `key`.
    pub fn is_after(&self, key: &[u8]) -> bool {
        &self.min_key[..] > key
    }
}

/// Immutable ascending sequence of per-block minimum keys.
#[derive(Debug)]
pub struct BlockIndex {
    entries: Vec<BlockIndexEntry>,
}

impl BlockIndex {
    pub(crate) fn new(entries: Vec<BlockIndexEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, block_id: usize) -> Option<&BlockIndexEntry> {
        self.entries.get(block_id)
    }

    /// Id of the block that may contain `key`, searching only from `from`
    /// onward: the last block at or after `from` whose minimum key is not
    /// greater than `key`. Returns `from` itself when even that block's
    /// minimum key exceeds `key` (callers rule this out with
    /// [`BlockIndexEntry::is_after`] first).
    pub fn find_from(&self, from: usize, key: &[u8]) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let from = from.min(self.entries.len() - 1);
        let ahead = self.entries[from..].partition_point(|e| e.min_key() <= key);
        from + ahead.saturating_sub(1)
    }
}
