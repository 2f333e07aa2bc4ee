//! Copying cartography content to the filesystem.
//!
//! Thin plumbing over the core: build a content-bearing cartography,
//! then write each resource's bytes under an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cartography::{CartographyRequest, Tag};
use crate::error::{Error, Result};

/// How extracted files land on disk.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Replace files that already exist
    pub overwrite: bool,
    /// Recreate the archive's directory tree instead of flattening to
    /// basenames
    pub preserve_paths: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            preserve_paths: true,
        }
    }
}

/// Extract matching entries of an archive under `output_dir`.
///
/// Runs a `file` group query (name, path, size, content) with the
/// optional filter, then copies every matched resource. Existing files
/// are left alone unless `overwrite` is set. Returns `true` when the
/// filter matched at least one entry.
pub fn extract_files(
    filename: &str,
    filter: Option<&str>,
    output_dir: &Path,
    options: ExtractOptions,
) -> Result<bool> {
    let mut request = CartographyRequest::new(filename)?.tags([Tag::File]);
    if let Some(pattern) = filter {
        request = request.filter(pattern)?;
    }
    let cartography = request.build()?;

    let mut matched_any = false;
    for resource in cartography.resources().values() {
        matched_any = true;
        let Some(content) = &resource.content else {
            continue;
        };

        let relative: PathBuf = if options.preserve_paths {
            resource.path.as_deref().unwrap_or_default().into()
        } else {
            resource.name.as_deref().unwrap_or_default().into()
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let output = output_dir.join(&relative);

        if output.exists() && !options.overwrite {
            debug!(path = %output.display(), "exists, not overwriting");
            continue;
        }

        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&output, content).map_err(|e| Error::io(&output, e))?;
        debug!(path = %output.display(), bytes = content.len(), "extracted");
    }

    Ok(matched_any)
}
