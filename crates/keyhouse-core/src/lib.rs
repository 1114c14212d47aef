pub mod compression;
pub mod error;

pub use compression::Compression;
pub use error::{Error, Result};
