//! ZIP archive reading.
//!
//! This module provides the two views a cartography is built from,
//! supporting both standard ZIP format and ZIP64 extensions.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements
//!   (EOCD, file headers, DOS timestamps)
//! - [`parser`]: Random-access central directory parsing over [`ReadAt`]
//!   sources: full per-entry metadata, no decompression
//! - [`stream`]: Forward-only local-file-header reading, the only way
//!   to reach decompressed payload bytes
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each entry
//! 2. Central Directory with metadata for all entries
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The central directory is read from the tail for listing; payloads are
//! only reachable front-to-back, which is why metadata and content are
//! two separate passes.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) and DEFLATE methods
//!
//! ## Limitations
//!
//! - No encryption support (encrypted payloads are skipped)
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods
//!
//! [`ReadAt`]: crate::io::ReadAt

mod parser;
mod stream;
mod structures;

pub use parser::ZipParser;
pub use stream::{StreamEntry, ZipStream};
pub use structures::*;
