//! # arcmap
//!
//! Selective, queryable maps of ZIP archive contents.
//!
//! An `arcmap` query names an archive, an optional whole-name filter,
//! and the pieces of information it wants per entry (atomic tags or
//! named groups). The result is a [`Cartography`]: one [`Resource`] per
//! surviving entry carrying only the requested fields, plus the
//! archive's manifest attribute blocks when asked for. Metadata comes
//! from a single scan of the central directory; content bytes, when
//! requested, come from one sequential decompression sweep correlated
//! back by entry name.
//!
//! ## Example
//!
//! ```no_run
//! use arcmap::{CartographyRequest, Tag};
//!
//! fn main() -> arcmap::Result<()> {
//!     let cartography = CartographyRequest::new("app.jar")?
//!         .filter(r"dir/.*")?
//!         .tags([Tag::BasicInfo, Tag::Content])
//!         .build()?;
//!
//!     for (entry_name, resource) in cartography.resources() {
//!         println!("{entry_name}: {:?} bytes", resource.size);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cartography;
pub mod cli;
pub mod error;
pub mod extract;
pub mod io;
pub mod manifest;
pub mod zip;

pub use cartography::{Cartography, CartographyRequest, MANIFEST_MAIN_ATTRIBUTES, Resource, Tag};
pub use cli::Cli;
pub use error::{Error, Result};
pub use extract::{ExtractOptions, extract_files};
pub use manifest::{MANIFEST_PATH, Manifest};
pub use zip::{CompressionMethod, DosDateTime};
