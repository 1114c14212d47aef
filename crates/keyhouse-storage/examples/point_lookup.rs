//! Build a small keyfile in memory, then serve ordered lookups from it.
//!
//! ```bash
//! cargo run -p keyhouse-storage --example point_lookup
//! ```

use std::sync::Arc;

use keyhouse_core::Compression;
use keyhouse_storage::fixture::KeyFileBuilder;
use keyhouse_storage::{KeyFileReader, ReaderConfig, ScanStats};

fn main() -> keyhouse_core::Result<()> {
    // A tiny "users" file: sorted keys, one key with duplicate values.
    let mut builder = KeyFileBuilder::new(Compression::Lz4).block_size_target(1024);
    for i in 0..1_000u32 {
        let key = format!("user/{:04}", i);
        builder.add(key.as_bytes(), format!("profile-{}", i).as_bytes());
        if i == 500 {
            builder.add(key.as_bytes(), b"profile-500-shadow");
        }
    }
    let file_bytes = builder.finish();

    let stats = Arc::new(ScanStats::new());
    let reader = Arc::new(
        KeyFileReader::from_bytes(file_bytes, ReaderConfig::default())?.with_stats(stats.clone()),
    );
    println!(
        "opened keyfile: {} records in {} blocks ({:?})",
        reader.record_count(),
        reader.block_index().len(),
        reader.compression(),
    );

    // Ordered point lookups on one scanner.
    let mut scanner = reader.scanner();
    for key in [&b"user/0007"[..], b"user/0123", b"user/0999"] {
        match scanner.get_first(key)? {
            Some(value) => println!(
                "{} -> {}",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(&value)
            ),
            None => println!("{} -> (not found)", String::from_utf8_lossy(key)),
        }
    }
    scanner.release();

    // Multi-value lookup; note the fresh scanner because user/0500 sorts
    // before the keys above.
    let mut scanner = reader.scanner();
    let values = scanner.get_all(b"user/0500")?;
    println!(
        "user/0500 -> {} values: {:?}",
        values.len(),
        values
            .iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect::<Vec<_>>()
    );
    scanner.release();

    println!(
        "phase timings: resolve {}ns, extract {}ns",
        stats.resolve_nanos(),
        stats.extract_nanos()
    );

    Ok(())
}
