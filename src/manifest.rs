//! JAR-style manifest reader.
//!
//! Archives in the JAR family carry a text manifest at
//! `META-INF/MANIFEST.MF`: a main attribute section, a blank line, then
//! zero or more per-entry sections introduced by a `Name:` attribute.
//! Lines are `Key: Value`; a line starting with a single space continues
//! the previous value. Everything is surfaced as plain string maps.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Well-known in-archive path of the manifest entry.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Parsed manifest: main attributes plus per-entry attribute blocks.
#[derive(Debug, Default, Clone)]
pub struct Manifest {
    main: BTreeMap<String, String>,
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Manifest {
    /// Parse manifest bytes.
    ///
    /// Tolerates CRLF and bare-LF line endings. A section after the
    /// first must carry a `Name` attribute; a line without a colon is
    /// malformed.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(bytes);

        // Unfold continuation lines before splitting into sections
        let mut lines: Vec<String> = Vec::new();
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix(' ') {
                match lines.last_mut() {
                    Some(previous) if !previous.is_empty() => previous.push_str(rest),
                    _ => {
                        return Err(Error::Manifest(
                            "continuation line with nothing to continue".to_string(),
                        ));
                    }
                }
            } else {
                lines.push(line.to_string());
            }
        }

        let mut manifest = Manifest::default();
        let mut section: BTreeMap<String, String> = BTreeMap::new();
        let mut first_section = true;

        let mut flush =
            |section: &mut BTreeMap<String, String>, first: &mut bool| -> Result<()> {
                if section.is_empty() {
                    return Ok(());
                }
                let attributes = std::mem::take(section);
                if *first {
                    manifest.main = attributes;
                    *first = false;
                } else {
                    let name = attributes.get("Name").cloned().ok_or_else(|| {
                        Error::Manifest("entry section without a Name attribute".to_string())
                    })?;
                    manifest.entries.insert(name, attributes);
                }
                Ok(())
            };

        for line in &lines {
            if line.is_empty() {
                flush(&mut section, &mut first_section)?;
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| Error::Manifest(format!("attribute line without ':': {line}")))?;
            section.insert(key.trim().to_string(), value.trim_start().to_string());
        }
        flush(&mut section, &mut first_section)?;

        Ok(manifest)
    }

    /// Attributes of the main section.
    pub fn main_attributes(&self) -> &BTreeMap<String, String> {
        &self.main
    }

    /// Per-entry attribute blocks, keyed by the `Name` attribute.
    pub fn entries(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.entries
    }

    /// Attribute block for one named entry.
    pub fn entry_attributes(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.entries.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_main_and_entry_sections() {
        let text = b"Manifest-Version: 1.0\r\nBuilt-By: someone\r\n\r\nName: a.txt\r\nNote: alpha\r\n\r\nName: dir/b.txt\r\nNote: beta\r\n";
        let manifest = Manifest::parse(text).unwrap();

        assert_eq!(
            manifest.main_attributes().get("Manifest-Version"),
            Some(&"1.0".to_string())
        );
        assert_eq!(manifest.entries().len(), 2);
        assert_eq!(
            manifest.entry_attributes("a.txt").unwrap().get("Note"),
            Some(&"alpha".to_string())
        );
        assert_eq!(
            manifest.entry_attributes("dir/b.txt").unwrap().get("Note"),
            Some(&"beta".to_string())
        );
    }

    #[test]
    fn unfolds_continuation_lines() {
        let text = b"Manifest-Version: 1.0\nLong-Value: first\n  and second\n";
        let manifest = Manifest::parse(text).unwrap();
        // One leading space is the fold marker; the rest of the line is data
        assert_eq!(
            manifest.main_attributes().get("Long-Value"),
            Some(&"first and second".to_string())
        );
    }

    #[test]
    fn rejects_line_without_colon() {
        assert!(Manifest::parse(b"Manifest-Version 1.0\n").is_err());
    }

    #[test]
    fn rejects_entry_section_without_name() {
        let text = b"Manifest-Version: 1.0\n\nNote: orphaned\n";
        assert!(Manifest::parse(text).is_err());
    }

    #[test]
    fn empty_input_is_an_empty_manifest() {
        let manifest = Manifest::parse(b"").unwrap();
        assert!(manifest.main_attributes().is_empty());
        assert!(manifest.entries().is_empty());
    }
}
