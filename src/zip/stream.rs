//! Forward-only reader for the local-file-header stream.
//!
//! The front of a ZIP file is a sequence of local file headers, each
//! followed by its compressed payload. Decompressed bytes are only
//! reachable by consuming this stream in order; there is no random
//! access. The content pass of a cartography walks this view once,
//! end to end, whether it keeps one entry's bytes or all of them.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{self, Read};

use crate::error::{Error, Result};

use super::structures::{
    CDFH_SIGNATURE, CompressionMethod, EndOfCentralDirectory, FLAG_DATA_DESCRIPTOR,
    FLAG_ENCRYPTED, LFH_SIGNATURE,
};

/// Data descriptor signature (optional in the wild)
const DD_SIGNATURE: [u8; 4] = *b"PK\x07\x08";

/// Metadata of the entry the stream is currently positioned on.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    /// Full in-archive name, trailing `/` included for directories
    pub name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub is_directory: bool,
}

impl StreamEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

/// Payload bookkeeping for the entry whose header was just read.
struct Pending {
    method: CompressionMethod,
    compressed: u64,
    descriptor: bool,
}

/// Strictly sequential reader over local-file-header records.
///
/// `next_entry` yields one header at a time; between calls the payload
/// is either read through [`read_content`](Self::read_content) or
/// drained automatically, so the stream never loses alignment.
pub struct ZipStream<R: Read> {
    reader: R,
    pending: Option<Pending>,
}

impl<R: Read> ZipStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: None,
        }
    }

    /// Advance to the next local file header.
    ///
    /// Any unconsumed payload of the previous entry is drained first.
    /// Returns `None` once the central directory (or end of data) is
    /// reached.
    pub fn next_entry(&mut self) -> Result<Option<StreamEntry>> {
        self.skip_entry()?;

        let mut sig = [0u8; 4];
        match self.reader.read_exact(&mut sig) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        if sig == CDFH_SIGNATURE || sig == EndOfCentralDirectory::SIGNATURE {
            // Local records are over; the directory at the tail is the
            // structural pass's concern.
            return Ok(None);
        }
        if sig != LFH_SIGNATURE {
            return Err(Error::Format("unexpected record signature".to_string()));
        }

        let _version_needed = self.reader.read_u16::<LittleEndian>()?;
        let flags = self.reader.read_u16::<LittleEndian>()?;
        let method = self.reader.read_u16::<LittleEndian>()?;
        let _last_mod_time = self.reader.read_u16::<LittleEndian>()?;
        let _last_mod_date = self.reader.read_u16::<LittleEndian>()?;
        let _crc32 = self.reader.read_u32::<LittleEndian>()?;
        let compressed_size = self.reader.read_u32::<LittleEndian>()? as u64;
        let uncompressed_size = self.reader.read_u32::<LittleEndian>()? as u64;
        let file_name_length = self.reader.read_u16::<LittleEndian>()?;
        let extra_field_length = self.reader.read_u16::<LittleEndian>()?;

        let mut name_bytes = vec![0u8; file_name_length as usize];
        self.reader.read_exact(&mut name_bytes)?;
        let name = String::from_utf8_lossy(&name_bytes).to_string();
        let is_directory = name.ends_with('/');

        io::copy(
            &mut (&mut self.reader).take(extra_field_length as u64),
            &mut io::sink(),
        )?;

        let descriptor = flags & FLAG_DATA_DESCRIPTOR != 0;
        if descriptor && compressed_size == 0 && !is_directory {
            // Without a size in the header there is no way to find the
            // end of the payload in a pure forward read.
            return Err(Error::Format(format!(
                "entry '{name}' defers sizes to a data descriptor"
            )));
        }

        self.pending = Some(Pending {
            method: CompressionMethod::from_u16(method),
            compressed: compressed_size,
            descriptor,
        });

        Ok(Some(StreamEntry {
            name,
            flags,
            compression_method: CompressionMethod::from_u16(method),
            compressed_size,
            uncompressed_size,
            is_directory,
        }))
    }

    /// Read up to `expected` decompressed bytes of the current entry.
    ///
    /// The whole payload is consumed either way, so the stream lands on
    /// the next record. The returned buffer is shorter than `expected`
    /// only if the data ended early; the caller decides what a short
    /// read means.
    pub fn read_content(&mut self, expected: u64) -> Result<Vec<u8>> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| Error::Format("no entry is current".to_string()))?;

        let mut out = vec![0u8; expected as usize];
        let mut payload = (&mut self.reader).take(pending.compressed);

        let filled = match pending.method {
            CompressionMethod::Stored => fill_from(&mut payload, &mut out)?,
            CompressionMethod::Deflate => {
                let mut decoder = DeflateDecoder::new(&mut payload);
                let n = fill_from(&mut decoder, &mut out)?;
                // Run the decoder dry so the raw payload is fully consumed
                io::copy(&mut decoder, &mut io::sink())?;
                n
            }
            CompressionMethod::Unknown(v) => {
                return Err(Error::Format(format!(
                    "unsupported compression method {v}"
                )));
            }
        };

        // Whatever the caller did not ask for still has to go by
        io::copy(&mut payload, &mut io::sink())?;

        if pending.descriptor {
            self.skip_descriptor()?;
        }

        out.truncate(filled);
        Ok(out)
    }

    /// Drain the current entry's payload without keeping any bytes.
    pub fn skip_entry(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            io::copy(
                &mut (&mut self.reader).take(pending.compressed),
                &mut io::sink(),
            )?;
            if pending.descriptor {
                self.skip_descriptor()?;
            }
        }
        Ok(())
    }

    /// Step over a trailing data descriptor (12 bytes, or 16 with the
    /// optional signature word).
    fn skip_descriptor(&mut self) -> Result<()> {
        let mut head = [0u8; 4];
        self.reader.read_exact(&mut head)?;
        let remaining = if head == DD_SIGNATURE { 12 } else { 8 };
        io::copy(&mut (&mut self.reader).take(remaining), &mut io::sink())?;
        Ok(())
    }
}

/// Bounded retry loop: keep reading until the buffer is full or the
/// source reports end-of-data.
fn fill_from<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
