//! Query-Order Guard
//!
//! Ordered block resolution has a fast path: when the current block's
//! minimum key already exceeds the query key, the scanner reports not-found
//! without loading anything. That shortcut is only sound while queries
//! arrive in non-decreasing key order, because the cursor never moves
//! backwards on its own.
//!
//! [`KeyOrderGuard`] makes the contract checkable. It remembers the last
//! key a scanner saw and fails a strictly smaller one with
//! [`Error::OutOfOrderKey`] before any block work happens - turning a
//! silently-wrong not-found into a loud contract violation. Scanners with
//! enforcement disabled never consult the guard and accept the trade-off:
//! out-of-order queries may miss keys that exist in earlier blocks, in
//! exchange for skipping the comparison on every call.

use keyhouse_core::{Error, Result};

/// Render a key for error messages and diagnostics.
pub(crate) fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Remembers the last query key of one scanner and rejects regressions.
#[derive(Debug, Default)]
pub struct KeyOrderGuard {
    last: Option<Vec<u8>>,
}

impl KeyOrderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when `key` is strictly smaller than the previously observed
    /// key; otherwise remembers `key`, reusing the existing allocation.
    pub fn observe(&mut self, key: &[u8]) -> Result<()> {
        match &mut self.last {
            Some(last) => {
                if key < &last[..] {
                    return Err(Error::OutOfOrderKey {
                        key: hex_bytes(key),
                        last: hex_bytes(last),
                    });
                }
                last.clear();
                last.extend_from_slice(key);
            }
            None => self.last = Some(key.to_vec()),
        }
        Ok(())
    }

    /// The most recently observed key, if any.
    pub fn last_key(&self) -> Option<&[u8]> {
        self.last.as_deref()
    }

    /// Forget the observed key; the next query may use any key.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
