//! Filesystem service used by the conversion pipeline.
//!
//! The pipeline never touches `std::fs` directly. It goes through the
//! [`FileSystem`] trait so tests can run against an in-memory implementation
//! (see [`crate::testing::MemoryFs`]).
//!
//! # Example
//!
//! ```ignore
//! use quackdoc_core::fs::{FileSystem, LocalFs};
//!
//! let fs = LocalFs::new();
//! fs.create_directory(Path::new("./output"), true).await?;
//! let stat = fs.get_file_info(Path::new("./input.html")).await?;
//! if stat.exists {
//!     println!("{} bytes", stat.size);
//! }
//! ```

mod error;
mod local;
mod traits;

pub use error::FsError;
pub use local::LocalFs;
pub use traits::{FileStat, FileSystem};

/// Renders a byte count for log output.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < MB {
        format!("{:.2} KB", size / KB)
    } else if size < GB {
        format!("{:.2} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}

/// Decodes file contents as text.
///
/// A UTF-8 byte order mark is stripped. Invalid UTF-8 is decoded lossily
/// rather than rejected.
pub(crate) fn decode_text(bytes: Vec<u8>) -> String {
    let bytes = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
