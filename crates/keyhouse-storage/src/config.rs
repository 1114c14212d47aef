//! Reader Configuration
//!
//! This module defines configuration for opening keyfiles.
//!
//! ## ReaderConfig
//!
//! - **verify_checksum**: Validate the footer CRC32 over the whole file at
//!   open (default: true). Disable only for files already verified by the
//!   surrounding system; block-level decode errors are still detected.
//! - **debug**: Emit verbose `tracing` events for each phase of every query.
//!   Diagnostic only; never changes returned results.
//! - **pool_capacity**: Maximum number of released scanner buffers kept for
//!   reuse (default: 64). 0 disables recycling entirely.
//!
//! ## Usage
//!
//! ```ignore
//! use keyhouse_storage::ReaderConfig;
//!
//! // Serving config
//! let config = ReaderConfig::default();
//!
//! // Debugging a miss on a pre-verified file
//! let config = ReaderConfig {
//!     verify_checksum: false,
//!     debug: true,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Verify the footer CRC32 over the whole file at open (default: true)
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,

    /// Emit verbose per-query diagnostic events (default: false)
    #[serde(default)]
    pub debug: bool,

    /// Scanner buffers kept for reuse; 0 disables recycling (default: 64)
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            verify_checksum: default_verify_checksum(),
            debug: false,
            pool_capacity: default_pool_capacity(),
        }
    }
}

fn default_verify_checksum() -> bool {
    true
}

fn default_pool_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReaderConfig::default();
        assert!(config.verify_checksum);
        assert!(!config.debug);
        assert_eq!(config.pool_capacity, 64);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ReaderConfig = serde_json::from_str("{}").unwrap();
        assert!(config.verify_checksum);
        assert_eq!(config.pool_capacity, 64);

        let config: ReaderConfig = serde_json::from_str(r#"{"pool_capacity": 0}"#).unwrap();
        assert_eq!(config.pool_capacity, 0);
        assert!(config.verify_checksum);
    }
}
