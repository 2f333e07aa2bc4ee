//! The vocabulary of requestable information.
//!
//! A [`Tag`] names one piece of information a cartography can collect
//! about an archive entry, or a group standing for a fixed set of atomic
//! tags. Groups are one level deep; expansion is a constant table, not
//! runtime dispatch.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One requestable piece of information (atomic) or a named bundle of
/// them (group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Name,
    Path,
    Size,
    CompressedSize,
    Comment,
    Checksum,
    Extra,
    CompressionMethod,
    Time,
    ManifestAttributes,
    Certificates,
    CodeSigners,
    Content,
    /// Keep directory entries in the resource map
    IncludeDirectories,
    /// Group: what you get when you ask for nothing
    Default,
    /// Group: name, path, size
    FileInfo,
    /// Group: name, path, size, content
    File,
    /// Group: name, size, checksum, time
    BasicInfo,
    /// Group: name, size, compressed size, checksum, method
    CompressionInfo,
    /// Group: everything except content and directories
    FullInfo,
    /// Group: everything
    Full,
}

const DEFAULT_TAGS: &[Tag] = &[Tag::Name];

const FILE_INFO_TAGS: &[Tag] = &[Tag::Name, Tag::Path, Tag::Size];

const FILE_TAGS: &[Tag] = &[Tag::Name, Tag::Path, Tag::Size, Tag::Content];

const BASIC_INFO_TAGS: &[Tag] = &[Tag::Name, Tag::Size, Tag::Checksum, Tag::Time];

const COMPRESSION_INFO_TAGS: &[Tag] = &[
    Tag::Name,
    Tag::Size,
    Tag::CompressedSize,
    Tag::Checksum,
    Tag::CompressionMethod,
];

const FULL_INFO_TAGS: &[Tag] = &[
    Tag::Name,
    Tag::Path,
    Tag::Size,
    Tag::CompressedSize,
    Tag::Comment,
    Tag::Checksum,
    Tag::Extra,
    Tag::CompressionMethod,
    Tag::Time,
    Tag::ManifestAttributes,
    Tag::Certificates,
    Tag::CodeSigners,
];

const FULL_TAGS: &[Tag] = &[
    Tag::Name,
    Tag::Path,
    Tag::Size,
    Tag::CompressedSize,
    Tag::Comment,
    Tag::Checksum,
    Tag::Extra,
    Tag::CompressionMethod,
    Tag::Time,
    Tag::ManifestAttributes,
    Tag::Certificates,
    Tag::CodeSigners,
    Tag::Content,
    Tag::IncludeDirectories,
];

impl Tag {
    /// The ordered atomic tags this tag stands for.
    ///
    /// An atomic tag expands to itself.
    pub fn atoms(self) -> &'static [Tag] {
        match self {
            Tag::Default => DEFAULT_TAGS,
            Tag::FileInfo => FILE_INFO_TAGS,
            Tag::File => FILE_TAGS,
            Tag::BasicInfo => BASIC_INFO_TAGS,
            Tag::CompressionInfo => COMPRESSION_INFO_TAGS,
            Tag::FullInfo => FULL_INFO_TAGS,
            Tag::Full => FULL_TAGS,
            Tag::Name => &[Tag::Name],
            Tag::Path => &[Tag::Path],
            Tag::Size => &[Tag::Size],
            Tag::CompressedSize => &[Tag::CompressedSize],
            Tag::Comment => &[Tag::Comment],
            Tag::Checksum => &[Tag::Checksum],
            Tag::Extra => &[Tag::Extra],
            Tag::CompressionMethod => &[Tag::CompressionMethod],
            Tag::Time => &[Tag::Time],
            Tag::ManifestAttributes => &[Tag::ManifestAttributes],
            Tag::Certificates => &[Tag::Certificates],
            Tag::CodeSigners => &[Tag::CodeSigners],
            Tag::Content => &[Tag::Content],
            Tag::IncludeDirectories => &[Tag::IncludeDirectories],
        }
    }

    /// Expand a set of requested tags into the atomic tags they imply.
    ///
    /// Membership in the returned set, not order, drives everything
    /// downstream. No tags at all resolves to [`Tag::Default`]'s set.
    pub fn resolve<I>(tags: I) -> BTreeSet<Tag>
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut resolved = BTreeSet::new();
        let mut any = false;
        for tag in tags {
            any = true;
            resolved.extend(tag.atoms().iter().copied());
        }
        if !any {
            resolved.extend(DEFAULT_TAGS.iter().copied());
        }
        resolved
    }

    fn as_str(self) -> &'static str {
        match self {
            Tag::Name => "name",
            Tag::Path => "path",
            Tag::Size => "size",
            Tag::CompressedSize => "compressed-size",
            Tag::Comment => "comment",
            Tag::Checksum => "checksum",
            Tag::Extra => "extra",
            Tag::CompressionMethod => "compression-method",
            Tag::Time => "time",
            Tag::ManifestAttributes => "manifest-attributes",
            Tag::Certificates => "certificates",
            Tag::CodeSigners => "code-signers",
            Tag::Content => "content",
            Tag::IncludeDirectories => "include-directories",
            Tag::Default => "default",
            Tag::FileInfo => "file-info",
            Tag::File => "file",
            Tag::BasicInfo => "basic-info",
            Tag::CompressionInfo => "compression-info",
            Tag::FullInfo => "full-info",
            Tag::Full => "full",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Tag::Name),
            "path" => Ok(Tag::Path),
            "size" => Ok(Tag::Size),
            "compressed-size" => Ok(Tag::CompressedSize),
            "comment" => Ok(Tag::Comment),
            "checksum" => Ok(Tag::Checksum),
            "extra" => Ok(Tag::Extra),
            "compression-method" => Ok(Tag::CompressionMethod),
            "time" => Ok(Tag::Time),
            "manifest-attributes" => Ok(Tag::ManifestAttributes),
            "certificates" => Ok(Tag::Certificates),
            "code-signers" => Ok(Tag::CodeSigners),
            "content" => Ok(Tag::Content),
            "include-directories" => Ok(Tag::IncludeDirectories),
            "default" => Ok(Tag::Default),
            "file-info" => Ok(Tag::FileInfo),
            "file" => Ok(Tag::File),
            "basic-info" => Ok(Tag::BasicInfo),
            "compression-info" => Ok(Tag::CompressionInfo),
            "full-info" => Ok(Tag::FullInfo),
            "full" => Ok(Tag::Full),
            other => Err(Error::InvalidRequest(format!("unknown tag '{other}'"))),
        }
    }
}
