//! The cartography builder: resolves the request into passes over the
//! archive's two views.
//!
//! Pass order is fixed: manifest (random access, if wanted), structural
//! scan (random access, metadata only), content extraction (sequential
//! decompression, only when the content tag is resolved). The archive is
//! opened once per view; each open is scoped so the handle is released
//! on every exit path.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};
use crate::manifest::{MANIFEST_PATH, Manifest};
use crate::zip::{ZipEntry, ZipParser, ZipStream};

use super::{Cartography, CartographyRequest, MANIFEST_MAIN_ATTRIBUTES, Resource, Tag};

pub(super) fn build(request: CartographyRequest) -> Result<Cartography> {
    // Whole-name semantics: the pattern has to account for every
    // character of the entry name, not merely occur somewhere inside it.
    let pattern = Regex::new(&format!("^(?:{})$", request.filter_pattern()))?;

    let tags = request.resolved_tags().clone();
    let mut cartography = Cartography::new(&request);

    {
        let reader = LocalFileReader::open(Path::new(request.filename()))
            .map_err(|e| Error::io(request.filename(), e))?;
        let parser = ZipParser::new(reader);
        let entries = parser.read_directory()?;
        debug!(
            archive = request.filename(),
            entries = entries.len(),
            "scanned central directory"
        );

        let manifest = read_manifest(&parser, &entries, &request, &tags)?;

        if request.manifest_requested()
            && let Some(manifest) = &manifest
        {
            flatten_manifest(&mut cartography, manifest);
        }

        scan_entries(
            &mut cartography,
            &entries,
            &pattern,
            &tags,
            manifest.as_ref(),
        );
    }

    // Only now do payload bytes get touched
    if tags.contains(&Tag::Content) {
        extract_content(&mut cartography, request.filename())?;
    }

    Ok(cartography)
}

/// Locate and parse `META-INF/MANIFEST.MF` when anything needs it.
///
/// The manifest flag failing to find one is an error; the
/// manifest-attributes tag alone quietly decorates nothing.
fn read_manifest<R: ReadAt>(
    parser: &ZipParser<R>,
    entries: &[ZipEntry],
    request: &CartographyRequest,
    tags: &BTreeSet<Tag>,
) -> Result<Option<Manifest>> {
    if !request.manifest_requested() && !tags.contains(&Tag::ManifestAttributes) {
        return Ok(None);
    }

    let Some(entry) = entries.iter().find(|e| e.name == MANIFEST_PATH) else {
        return if request.manifest_requested() {
            Err(Error::ManifestMissing)
        } else {
            Ok(None)
        };
    };

    let bytes = parser.read_entry_bytes(entry)?;
    let manifest = Manifest::parse(&bytes)?;
    debug!(sections = manifest.entries().len() + 1, "parsed manifest");
    Ok(Some(manifest))
}

/// Flatten main + per-entry attribute blocks into the cartography's
/// attribute maps, the main block under the reserved sentinel.
fn flatten_manifest(cartography: &mut Cartography, manifest: &Manifest) {
    cartography.insert_attributes(
        MANIFEST_MAIN_ATTRIBUTES.to_string(),
        manifest.main_attributes().clone(),
    );
    for (entry, attributes) in manifest.entries() {
        cartography.insert_attributes(entry.clone(), attributes.clone());
    }
}

/// Structural pass: one linear scan of the central directory.
fn scan_entries(
    cartography: &mut Cartography,
    entries: &[ZipEntry],
    pattern: &Regex,
    tags: &BTreeSet<Tag>,
    manifest: Option<&Manifest>,
) {
    for entry in entries {
        if !pattern.is_match(&entry.name) {
            continue;
        }
        if entry.is_directory && !tags.contains(&Tag::IncludeDirectories) {
            continue;
        }

        let mut resource = Resource {
            is_directory: entry.is_directory,
            ..Resource::default()
        };
        if tags.contains(&Tag::Name) {
            resource.name = Some(basename(&entry.name));
        }
        if tags.contains(&Tag::Path) {
            resource.path = Some(entry.name.clone());
        }
        if tags.contains(&Tag::Size) {
            resource.size = Some(entry.uncompressed_size);
        }
        if tags.contains(&Tag::CompressedSize) {
            resource.compressed_size = Some(entry.compressed_size);
        }
        if tags.contains(&Tag::Checksum) {
            resource.checksum = Some(entry.crc32);
        }
        if tags.contains(&Tag::CompressionMethod) {
            resource.compression_method = Some(entry.compression_method);
        }
        if tags.contains(&Tag::Extra) {
            resource.extra = Some(entry.extra.clone());
        }
        if tags.contains(&Tag::Comment) {
            resource.comment = Some(entry.comment.clone());
        }
        if tags.contains(&Tag::Time) {
            resource.modified = Some(entry.modified);
        }
        if tags.contains(&Tag::ManifestAttributes) {
            resource.manifest_attributes = manifest
                .and_then(|m| m.entry_attributes(&entry.name))
                .cloned();
        }
        // Certificates and code signers stay unset: the central
        // directory of a plain ZIP carries no signer metadata, and
        // signature verification is out of scope.

        // Keyed by the full name with separator, even though the stored
        // name field has it stripped; path and name are independent.
        cartography.insert_resource(entry.name.clone(), resource);
    }
    debug!(kept = cartography.resources().len(), "structural pass done");
}

/// Content pass: one sequential decompression sweep, correlated back to
/// the structural pass's records by entry name.
fn extract_content(cartography: &mut Cartography, filename: &str) -> Result<()> {
    let file = File::open(filename).map_err(|e| Error::io(filename, e))?;
    let mut stream = ZipStream::new(BufReader::new(file));

    while let Some(entry) = stream.next_entry()? {
        if entry.is_directory {
            // Content is never meaningful for directories
            continue;
        }
        if entry.is_encrypted() {
            debug!(name = %entry.name, "skipping encrypted entry");
            continue;
        }

        // Prefer the size the structural pass recorded; the stream's own
        // declared size covers entries outside the filter.
        let expected = cartography
            .resource(&entry.name)
            .and_then(|resource| resource.size)
            .unwrap_or(entry.uncompressed_size);

        let bytes = stream.read_content(expected)?;
        if (bytes.len() as u64) < expected {
            return Err(Error::Truncated {
                path: entry.name.clone(),
                expected,
                actual: bytes.len() as u64,
            });
        }

        if let Some(resource) = cartography.resource_mut(&entry.name) {
            resource.content = Some(bytes);
        }
        // Entries that never made it into the map were still consumed,
        // which is what keeps the stream aligned.
    }

    Ok(())
}

/// Last path segment, trailing directory separator stripped.
fn basename(entry_name: &str) -> String {
    let trimmed = entry_name.strip_suffix('/').unwrap_or(entry_name);
    match trimmed.rsplit_once('/') {
        Some((_, base)) => base.to_string(),
        None => trimmed.to_string(),
    }
}
