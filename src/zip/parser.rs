//! Low-level ZIP central directory parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all entries
//! 4. For a single entry's bytes, read its Local File Header and data
//!
//! The central directory gives random-order access to full per-entry
//! metadata without decompressing anything, which is what the structural
//! scan of a cartography runs on.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read};

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP directory parser.
///
/// Generic over the reader type; the cartography builder feeds it a
/// [`LocalFileReader`](crate::io::LocalFileReader).
pub struct ZipParser<R: ReadAt> {
    reader: R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no archive comment) and archives
    /// with comments by searching backwards for the signature.
    ///
    /// Returns the EOCD record and its offset in the file.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Try the simple no-comment case first: EOCD flush with the end.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf)?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        // EOCD not at the expected location - a trailing comment pushes it
        // earlier. Search backwards from the end of the file.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf)?;

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // Candidate EOCD - the comment length field must account
                // for every remaining byte.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd =
                        EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(Error::Format("no end of central directory found".to_string()))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD carries 0xFFFF/0xFFFFFFFF sentinel
    /// fields.
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The ZIP64 EOCD Locator sits immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| Error::Format("missing ZIP64 locator".to_string()))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator_buf)?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// Enumerate the central directory.
    ///
    /// Returns one [`ZipEntry`] per archive member with its full
    /// directory metadata, in directory order. Nothing is decompressed.
    pub fn read_directory(&self) -> Result<Vec<ZipEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        // One contiguous read covers every file header
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data)?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(&cd_data);

        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Get the offset where an entry's compressed payload begins.
    ///
    /// The Local File Header repeats the name and extra field with
    /// possibly different lengths than the central directory, so the LFH
    /// itself has to be consulted.
    pub fn data_offset(&self, entry: &ZipEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf)?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(Error::Format("invalid local file header".to_string()));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Read and decompress a single entry's bytes.
    ///
    /// Random-access companion to the sequential content pass; the
    /// cartography builder uses it to pull the manifest out without
    /// touching any other payload.
    pub fn read_entry_bytes(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        let data_offset = self.data_offset(entry)?;

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.reader.read_exact_at(data_offset, &mut compressed)?;

        match entry.compression_method {
            CompressionMethod::Stored => Ok(compressed),
            CompressionMethod::Deflate => {
                let mut decoder = DeflateDecoder::new(&compressed[..]);
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::Format(format!("inflate failed for '{}': {e}", entry.name)))?;
                Ok(out)
            }
            CompressionMethod::Unknown(v) => Err(Error::Format(format!(
                "unsupported compression method {v} for '{}'",
                entry.name
            ))),
        }
    }
}

/// Parse one Central Directory File Header from a cursor.
///
/// Keeps the raw extra-field bytes and the entry comment; ZIP64 sizes are
/// resolved from the extra field when the 32-bit fields carry sentinels.
fn parse_cdfh(cursor: &mut Cursor<&Vec<u8>>) -> Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor
        .read_exact(&mut sig)
        .map_err(|_| Error::Format("central directory ended early".to_string()))?;
    if sig != CDFH_SIGNATURE {
        return Err(Error::Format(
            "invalid central directory file header".to_string(),
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Lossy conversion keeps non-UTF8 names queryable
    let name = String::from_utf8_lossy(&file_name_bytes).to_string();

    // Directory entries end with '/'
    let is_directory = name.ends_with('/');

    // Extra field is kept raw; ZIP64 extended information (id 0x0001) is
    // the only block interpreted here.
    let mut extra = vec![0u8; extra_field_length as usize];
    cursor.read_exact(&mut extra)?;

    let mut pos = 0usize;
    while pos + 4 <= extra.len() {
        let header_id = u16::from_le_bytes([extra[pos], extra[pos + 1]]);
        let field_size = u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]) as usize;
        let mut field = &extra[pos + 4..(pos + 4 + field_size).min(extra.len())];

        if header_id == 0x0001 {
            // Fields appear only when the 32-bit header value overflowed
            if uncompressed_size == 0xFFFFFFFF && field.len() >= 8 {
                uncompressed_size = field.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && field.len() >= 8 {
                compressed_size = field.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && field.len() >= 8 {
                lfh_offset = field.read_u64::<LittleEndian>()?;
            }
        }

        pos += 4 + field_size;
    }

    let mut comment_bytes = vec![0u8; file_comment_length as usize];
    cursor.read_exact(&mut comment_bytes)?;
    let comment = String::from_utf8_lossy(&comment_bytes).to_string();

    Ok(ZipEntry {
        name,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        modified: DosDateTime {
            date: last_mod_date,
            time: last_mod_time,
        },
        extra,
        comment,
        is_directory,
    })
}
