//! End-to-end cartography queries over real generated archives.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::FileOptions;

use arcmap::{
    CartographyRequest, Error, ExtractOptions, MANIFEST_MAIN_ATTRIBUTES, Tag, extract_files,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const ALPHA: &[u8] = b"alpha contents, long enough to actually deflate";
const BETA: &[u8] = b"beta";

/// Archive with entries {a.txt, dir/, dir/b.txt}, no manifest.
fn write_basic_archive(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join("basic.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path)?);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    writer.start_file("a.txt", options)?;
    writer.write_all(ALPHA)?;
    writer.add_directory("dir", options)?;
    writer.start_file("dir/b.txt", options)?;
    writer.write_all(BETA)?;
    writer.finish()?;
    Ok(path)
}

/// Same layout plus a manifest with one main attribute and one entry
/// section.
fn write_manifest_archive(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join("manifest.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path)?);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    writer.start_file("META-INF/MANIFEST.MF", options)?;
    writer.write_all(b"Manifest-Version: 1.0\r\nX: Y\r\n\r\nName: a.txt\r\nNote: alpha\r\n")?;
    writer.start_file("a.txt", options)?;
    writer.write_all(ALPHA)?;
    writer.start_file("dir/b.txt", options)?;
    writer.write_all(BETA)?;
    writer.finish()?;
    Ok(path)
}

#[test]
fn default_query_excludes_directories() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?.build()?;

    let mut keys: Vec<&str> = cartography.resources().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["a.txt", "dir/b.txt"]);
    Ok(())
}

#[test]
fn filter_is_whole_name_not_substring() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .filter("dir/.*")?
        .build()?;
    let keys: Vec<&str> = cartography.resources().keys().map(String::as_str).collect();
    assert_eq!(keys, ["dir/b.txt"]);

    // "txt" occurs in every name but matches none of them whole
    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .filter("txt")?
        .build()?;
    assert!(cartography.resources().is_empty());
    Ok(())
}

#[test]
fn include_directories_tag_keeps_directory_entries() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .tags([Tag::Name, Tag::Path, Tag::IncludeDirectories])
        .build()?;

    let resource = cartography.resource("dir/").expect("directory entry kept");
    assert!(resource.is_directory);
    // Name drops the separator, path keeps it
    assert_eq!(resource.name.as_deref(), Some("dir"));
    assert_eq!(resource.path.as_deref(), Some("dir/"));
    Ok(())
}

#[test]
fn only_requested_fields_are_populated() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .tags([Tag::Name, Tag::Size])
        .build()?;

    for resource in cartography.resources().values() {
        assert!(resource.name.is_some());
        assert!(resource.size.is_some());
        assert!(resource.path.is_none());
        assert!(resource.checksum.is_none());
        assert!(resource.content.is_none());
        assert!(resource.certificates.is_none());
        assert!(resource.code_signers.is_none());
        assert!(resource.modified.is_none());
    }
    Ok(())
}

#[test]
fn content_round_trips_byte_for_byte() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .tags([Tag::File])
        .build()?;

    let a = cartography.resource("a.txt").unwrap();
    assert_eq!(a.size, Some(ALPHA.len() as u64));
    assert_eq!(a.content.as_deref(), Some(ALPHA));

    let b = cartography.resource("dir/b.txt").unwrap();
    assert_eq!(b.content.as_deref(), Some(BETA));
    Ok(())
}

#[test]
fn stored_entries_round_trip_too() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("stored.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path)?);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("raw.bin", options)?;
    writer.write_all(ALPHA)?;
    writer.finish()?;

    let cartography = CartographyRequest::new(path.to_str().unwrap())?
        .tags([Tag::Size, Tag::CompressionMethod, Tag::Content])
        .build()?;

    let resource = cartography.resource("raw.bin").unwrap();
    assert_eq!(
        resource.compression_method,
        Some(arcmap::CompressionMethod::Stored)
    );
    assert_eq!(resource.content.as_deref(), Some(ALPHA));
    Ok(())
}

#[test]
fn content_without_size_tag_still_fills_buffers() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .tags([Tag::Content])
        .build()?;

    let resource = cartography.resource("a.txt").unwrap();
    assert!(resource.size.is_none());
    assert_eq!(resource.content.as_deref(), Some(ALPHA));
    Ok(())
}

#[test]
fn content_is_discarded_for_filtered_out_entries() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    // a.txt sits before dir/b.txt in the stream; the pass has to read
    // through it to reach the entry that was kept
    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .filter("dir/.*")?
        .tags([Tag::File])
        .build()?;

    assert!(cartography.resource("a.txt").is_none());
    let b = cartography.resource("dir/b.txt").unwrap();
    assert_eq!(b.content.as_deref(), Some(BETA));
    Ok(())
}

#[test]
fn full_info_populates_directory_metadata() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .tags([Tag::FullInfo])
        .build()?;

    let resource = cartography.resource("a.txt").unwrap();
    assert_eq!(resource.name.as_deref(), Some("a.txt"));
    assert_eq!(resource.path.as_deref(), Some("a.txt"));
    assert_eq!(resource.size, Some(ALPHA.len() as u64));
    assert!(resource.compressed_size.is_some());
    assert!(resource.checksum.is_some());
    assert_eq!(
        resource.compression_method,
        Some(arcmap::CompressionMethod::Deflate)
    );
    assert!(resource.extra.is_some());
    assert!(resource.comment.is_some());
    let stamp = resource.modified.expect("time requested");
    assert!(stamp.ymd().0 >= 1980);
    // No content without the content tag, no signers from a plain ZIP
    assert!(resource.content.is_none());
    assert!(resource.certificates.is_none());
    assert!(resource.code_signers.is_none());
    Ok(())
}

#[test]
fn manifest_main_attributes_live_under_the_sentinel() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_manifest_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .with_manifest(true)
        .build()?;

    let main = cartography.manifest_main_attributes().expect("main block");
    assert_eq!(main.get("X"), Some(&"Y".to_string()));

    let entries = cartography.manifest_entries();
    assert!(entries.contains("a.txt"));
    assert!(!entries.contains(MANIFEST_MAIN_ATTRIBUTES));

    let a = cartography.manifest_entry_attributes("a.txt").unwrap();
    assert_eq!(a.get("Note"), Some(&"alpha".to_string()));
    Ok(())
}

#[test]
fn manifest_attributes_tag_decorates_resources() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_manifest_archive(dir.path())?;

    // Flag stays off: the attribute maps stay empty, resources still get
    // their per-entry blocks
    let cartography = CartographyRequest::new(archive.to_str().unwrap())?
        .tags([Tag::Name, Tag::ManifestAttributes])
        .build()?;

    assert!(cartography.manifest_main_attributes().is_none());
    assert!(cartography.manifest_entries().is_empty());

    let a = cartography.resource("a.txt").unwrap();
    let attributes = a.manifest_attributes.as_ref().expect("entry block");
    assert_eq!(attributes.get("Note"), Some(&"alpha".to_string()));

    // No manifest section for this one
    let b = cartography.resource("dir/b.txt").unwrap();
    assert!(b.manifest_attributes.is_none());
    Ok(())
}

#[test]
fn requesting_manifest_without_one_fails() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let result = CartographyRequest::new(archive.to_str().unwrap())?
        .with_manifest(true)
        .build();
    assert!(matches!(result, Err(Error::ManifestMissing)));
    Ok(())
}

#[test]
fn absent_entry_queries_answer_none() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;

    let cartography = CartographyRequest::new(archive.to_str().unwrap())?.build()?;
    assert!(cartography.resource("never-there.txt").is_none());
    assert!(cartography.manifest_entry_attributes("never-there.txt").is_none());
    Ok(())
}

#[test]
fn archive_comment_does_not_hide_the_directory() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("commented.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path)?);
    writer.set_comment("trailing archive comment");
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    writer.start_file("a.txt", options)?;
    writer.write_all(ALPHA)?;
    writer.finish()?;

    let cartography = CartographyRequest::new(path.to_str().unwrap())?.build()?;
    assert!(cartography.resource("a.txt").is_some());
    Ok(())
}

#[test]
fn invalid_requests_fail_before_any_io() {
    assert!(matches!(
        CartographyRequest::new(""),
        Err(Error::InvalidRequest(_))
    ));

    let request = CartographyRequest::new("never-opened.zip").unwrap();
    assert!(matches!(request.filter(" "), Err(Error::InvalidRequest(_))));

    // Broken regex syntax: also rejected before the path is touched
    let result = CartographyRequest::new("never-opened.zip")
        .unwrap()
        .filter("(unclosed")
        .unwrap()
        .build();
    assert!(matches!(result, Err(Error::Pattern(_))));
}

#[test]
fn missing_or_directory_paths_are_io_failures() -> TestResult {
    let dir = TempDir::new()?;

    let missing = dir.path().join("nope.zip");
    let result = CartographyRequest::new(missing.to_str().unwrap())?.build();
    assert!(matches!(result, Err(Error::Io { .. })));

    let result = CartographyRequest::new(dir.path().to_str().unwrap())?.build();
    assert!(matches!(result, Err(Error::Io { .. })));
    Ok(())
}

#[test]
fn garbage_input_is_a_format_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("not-a.zip");
    std::fs::write(&path, b"this is absolutely not an archive")?;

    let result = CartographyRequest::new(path.to_str().unwrap())?.build();
    assert!(matches!(result, Err(Error::Format(_))));
    Ok(())
}

#[test]
fn extract_preserves_the_archive_tree() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;
    let out = dir.path().join("out");

    let matched = extract_files(
        archive.to_str().unwrap(),
        None,
        &out,
        ExtractOptions::default(),
    )?;
    assert!(matched);
    assert_eq!(std::fs::read(out.join("a.txt"))?, ALPHA);
    assert_eq!(std::fs::read(out.join("dir/b.txt"))?, BETA);
    Ok(())
}

#[test]
fn extract_can_flatten_to_basenames() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;
    let out = dir.path().join("flat");

    extract_files(
        archive.to_str().unwrap(),
        Some("dir/.*"),
        &out,
        ExtractOptions {
            overwrite: false,
            preserve_paths: false,
        },
    )?;
    assert_eq!(std::fs::read(out.join("b.txt"))?, BETA);
    assert!(!out.join("dir").exists());
    Ok(())
}

#[test]
fn extract_honors_the_overwrite_flag() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;
    let out = dir.path().join("out");

    std::fs::create_dir_all(&out)?;
    std::fs::write(out.join("a.txt"), b"old")?;

    extract_files(
        archive.to_str().unwrap(),
        Some("a.txt"),
        &out,
        ExtractOptions {
            overwrite: false,
            preserve_paths: true,
        },
    )?;
    assert_eq!(std::fs::read(out.join("a.txt"))?, b"old");

    extract_files(
        archive.to_str().unwrap(),
        Some("a.txt"),
        &out,
        ExtractOptions {
            overwrite: true,
            preserve_paths: true,
        },
    )?;
    assert_eq!(std::fs::read(out.join("a.txt"))?, ALPHA);
    Ok(())
}

#[test]
fn extract_reports_when_nothing_matched() -> TestResult {
    let dir = TempDir::new()?;
    let archive = write_basic_archive(dir.path())?;
    let out = dir.path().join("out");

    let matched = extract_files(
        archive.to_str().unwrap(),
        Some("no-such-entry"),
        &out,
        ExtractOptions::default(),
    )?;
    assert!(!matched);
    assert!(!out.exists());
    Ok(())
}
