//! Selective maps of archive contents.
//!
//! A [`CartographyRequest`] names an archive, a filter, and the
//! information wanted per entry; [`CartographyRequest::build`] runs the
//! passes and returns a read-only [`Cartography`] keyed by in-archive
//! entry name.

mod builder;
mod tags;

pub use tags::Tag;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::zip::{CompressionMethod, DosDateTime};

/// Reserved key holding the manifest's main attribute block.
///
/// Distinct from any sensible entry name; the manifest-entry listing
/// always excludes it.
pub const MANIFEST_MAIN_ATTRIBUTES: &str = "MANIFEST_MAIN_ATTRIBUTES";

/// Immutable parameters of one cartography query.
#[derive(Debug, Clone)]
pub struct CartographyRequest {
    filename: String,
    filter: String,
    with_manifest: bool,
    tags: BTreeSet<Tag>,
}

impl CartographyRequest {
    /// Start a request for the given archive path.
    ///
    /// The path is validated before any I/O; blank paths are rejected
    /// here. With no further calls the request carries the
    /// match-everything filter and resolves to `{name}`.
    pub fn new(filename: impl Into<String>) -> Result<Self> {
        let filename = filename.into();
        if filename.trim().is_empty() {
            return Err(Error::InvalidRequest("empty archive path".to_string()));
        }
        Ok(Self {
            filename,
            filter: ".*".to_string(),
            with_manifest: false,
            tags: Tag::resolve([]),
        })
    }

    /// Set the entry-name filter pattern (whole-name regular expression).
    ///
    /// An explicitly supplied blank pattern is rejected; syntax errors
    /// surface at build time, still before any I/O.
    pub fn filter(mut self, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(Error::InvalidRequest("empty filter pattern".to_string()));
        }
        self.filter = pattern;
        Ok(self)
    }

    /// Ask for the archive manifest's attribute maps.
    pub fn with_manifest(mut self, with_manifest: bool) -> Self {
        self.with_manifest = with_manifest;
        self
    }

    /// Request information tags (atomic or groups); they resolve to the
    /// atomic set immediately. An empty iterator keeps the default.
    pub fn tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        self.tags = Tag::resolve(tags);
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn filter_pattern(&self) -> &str {
        &self.filter
    }

    pub fn manifest_requested(&self) -> bool {
        self.with_manifest
    }

    /// The resolved atomic tag set.
    pub fn resolved_tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    /// Run the query: structural pass, manifest pass, content pass.
    pub fn build(self) -> Result<Cartography> {
        builder::build(self)
    }
}

/// One entry's collected information.
///
/// Only fields whose tag was requested are populated; the rest stay
/// `None`. Owned by the [`Cartography`] that built it.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    /// Basename, trailing separator stripped for directories
    pub name: Option<String>,
    /// Full in-archive path, separator kept for directories
    pub path: Option<String>,
    pub size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub checksum: Option<u32>,
    pub compression_method: Option<CompressionMethod>,
    pub extra: Option<Vec<u8>>,
    pub comment: Option<String>,
    pub modified: Option<DosDateTime>,
    pub manifest_attributes: Option<BTreeMap<String, String>>,
    /// Raw certificate blobs. Plain ZIP directories carry none, so this
    /// stays unset for entries scanned from them.
    pub certificates: Option<Vec<Vec<u8>>>,
    pub code_signers: Option<Vec<String>>,
    pub content: Option<Vec<u8>>,
    pub is_directory: bool,
}

/// The aggregate result of one query.
///
/// Built once, then handed to the caller read-only; querying a name the
/// archive never had answers `None`, not an error.
#[derive(Debug)]
pub struct Cartography {
    filename: String,
    filter: String,
    with_manifest: bool,
    tags: BTreeSet<Tag>,
    resources: HashMap<String, Resource>,
    manifest_attributes: HashMap<String, BTreeMap<String, String>>,
}

impl Cartography {
    fn new(request: &CartographyRequest) -> Self {
        Self {
            filename: request.filename.clone(),
            filter: request.filter.clone(),
            with_manifest: request.with_manifest,
            tags: request.tags.clone(),
            resources: HashMap::new(),
            manifest_attributes: HashMap::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn filter_pattern(&self) -> &str {
        &self.filter
    }

    pub fn manifest_requested(&self) -> bool {
        self.with_manifest
    }

    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    /// All surviving entries, keyed by full in-archive name.
    pub fn resources(&self) -> &HashMap<String, Resource> {
        &self.resources
    }

    /// Look up one entry by its full in-archive name.
    pub fn resource(&self, entry_name: &str) -> Option<&Resource> {
        self.resources.get(entry_name)
    }

    /// Main attributes of the manifest, when one was requested and read.
    pub fn manifest_main_attributes(&self) -> Option<&BTreeMap<String, String>> {
        self.manifest_attributes.get(MANIFEST_MAIN_ATTRIBUTES)
    }

    /// Names of the manifest's per-entry sections, sentinel excluded.
    pub fn manifest_entries(&self) -> BTreeSet<&str> {
        self.manifest_attributes
            .keys()
            .filter(|key| key.as_str() != MANIFEST_MAIN_ATTRIBUTES)
            .map(String::as_str)
            .collect()
    }

    /// Attribute map of one manifest section (the sentinel reaches the
    /// main block).
    pub fn manifest_entry_attributes(&self, entry: &str) -> Option<&BTreeMap<String, String>> {
        self.manifest_attributes.get(entry)
    }

    pub(crate) fn insert_resource(&mut self, entry_name: String, resource: Resource) {
        self.resources.insert(entry_name, resource);
    }

    pub(crate) fn insert_attributes(
        &mut self,
        entry: String,
        attributes: BTreeMap<String, String>,
    ) {
        self.manifest_attributes.insert(entry, attributes);
    }

    pub(crate) fn resource_mut(&mut self, entry_name: &str) -> Option<&mut Resource> {
        self.resources.get_mut(entry_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filename_is_rejected() {
        assert!(matches!(
            CartographyRequest::new("  "),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn blank_filter_is_rejected() {
        let request = CartographyRequest::new("some.zip").unwrap();
        assert!(matches!(
            request.filter("   "),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn defaults_are_match_everything_and_name() {
        let request = CartographyRequest::new("some.zip").unwrap();
        assert_eq!(request.filter_pattern(), ".*");
        assert!(!request.manifest_requested());
        assert_eq!(request.resolved_tags(), &BTreeSet::from([Tag::Name]));
    }

    #[test]
    fn group_request_resolves_at_construction() {
        let request = CartographyRequest::new("some.zip")
            .unwrap()
            .tags([Tag::FileInfo]);
        assert_eq!(
            request.resolved_tags(),
            &BTreeSet::from([Tag::Name, Tag::Path, Tag::Size])
        );
    }
}
