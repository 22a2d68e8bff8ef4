//! Binary encoding of template archives.
//!
//! Layout, in order:
//!
//! ```text
//! magic (2 bytes) | reserved header (4 bytes)
//! len:4hex | language (UTF-8)
//! len:4hex | profile data (JSON object)
//! len:4hex | dependencies (JSON array)
//! count:4hex
//! repeated count times: len:4hex | key (UTF-8) | len:8hex | value (raw bytes)
//! ```
//!
//! All lengths are fixed-width, zero-padded, lower-case hexadecimal ASCII.

use std::io::Write;

use indexmap::IndexMap;
use log::{debug, trace};

use super::{check_file_key, TemplateArchive};
use crate::constants::{
    limits::{MAX_FILES, MAX_FILE_KEY_LEN, MAX_FILE_SIZE, MAX_SHORT_FIELD},
    ARCHIVE_HEADER_LEN, ARCHIVE_MAGIC, LEGACY_ARCHIVE_MAGIC,
};
use crate::error::{Error, Result};

const SHORT_WIDTH: usize = 4;
const LONG_WIDTH: usize = 8;

/// Fails with [`Error::LimitExceeded`] if `actual` does not fit in `limit`.
pub fn ensure_fits(field: &str, actual: u64, limit: u64) -> Result<()> {
    if actual > limit {
        return Err(Error::LimitExceeded { field: field.to_string(), limit, actual });
    }
    Ok(())
}

/// Everything that goes on the wire, checked against the format limits.
struct Prepared<'a> {
    archive: &'a TemplateArchive,
    profile_data: String,
    dependencies: String,
}

impl<'a> Prepared<'a> {
    fn new(archive: &'a TemplateArchive) -> Result<Self> {
        let profile_data = serde_json::to_string(&archive.profile_data)?;
        let dependencies = serde_json::to_string(&archive.dependencies)?;

        ensure_fits("the language tag length", archive.language.len() as u64, MAX_SHORT_FIELD)?;
        ensure_fits("the profile data length", profile_data.len() as u64, MAX_SHORT_FIELD)?;
        ensure_fits("the dependency list length", dependencies.len() as u64, MAX_SHORT_FIELD)?;
        ensure_fits("the file count", archive.files.len() as u64, MAX_FILES)?;

        for (key, value) in &archive.files {
            ensure_fits(
                &format!("the length of file key '{key}'"),
                key.len() as u64,
                MAX_FILE_KEY_LEN,
            )?;
            ensure_fits(
                &format!("the size of file '{key}'"),
                value.len() as u64,
                MAX_FILE_SIZE,
            )?;
        }

        Ok(Self { archive, profile_data, dependencies })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&ARCHIVE_MAGIC)?;
        writer.write_all(&[0u8; ARCHIVE_HEADER_LEN])?;

        write_short(writer, self.archive.language.len())?;
        writer.write_all(self.archive.language.as_bytes())?;
        write_short(writer, self.profile_data.len())?;
        writer.write_all(self.profile_data.as_bytes())?;
        write_short(writer, self.dependencies.len())?;
        writer.write_all(self.dependencies.as_bytes())?;

        write_short(writer, self.archive.files.len())?;
        for (key, value) in &self.archive.files {
            write_short(writer, key.len())?;
            writer.write_all(key.as_bytes())?;
            write!(writer, "{:0width$x}", value.len(), width = LONG_WIDTH)?;
            writer.write_all(value)?;
        }
        Ok(())
    }
}

fn write_short<W: Write>(writer: &mut W, len: usize) -> std::io::Result<()> {
    write!(writer, "{:0width$x}", len, width = SHORT_WIDTH)
}

/// Encodes an archive into `writer`.
///
/// Every limit is checked before the first byte is written, so a failed
/// encode never leaves a partial archive behind.
pub fn encode_to<W: Write>(archive: &TemplateArchive, writer: &mut W) -> Result<()> {
    let prepared = Prepared::new(archive)?;
    debug!(
        "Encoding {} file(s) ({} bytes of content)",
        archive.files.len(),
        archive.total_size()
    );
    prepared.write(writer)
}

/// Encodes an archive into a new byte buffer.
pub fn encode(archive: &TemplateArchive) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_to(archive, &mut buf)?;
    Ok(buf)
}

/// Cursor over an encoded archive.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let remaining = self.bytes.len() - self.pos;
        if len > remaining {
            return Err(Error::Truncated { field: field.to_string(), expected: len - remaining });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_len(&mut self, width: usize, field: &str) -> Result<usize> {
        let digits = self.take(width, field)?;
        if !digits.iter().all(u8::is_ascii_hexdigit) {
            return Err(invalid(format!("the length of {field} is not hexadecimal")));
        }
        // All ASCII hex digits, so both conversions are infallible in practice.
        let digits = std::str::from_utf8(digits)
            .map_err(|_| invalid(format!("the length of {field} is not hexadecimal")))?;
        usize::from_str_radix(digits, 16)
            .map_err(|e| invalid(format!("the length of {field} is invalid ({e})")))
    }

    fn read_str(&mut self, width: usize, field: &str) -> Result<&'a str> {
        let len = self.read_len(width, field)?;
        let bytes = self.take(len, field)?;
        std::str::from_utf8(bytes).map_err(|_| invalid(format!("{field} is not valid UTF-8")))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidFormat { reason }
}

/// Decodes an archive from its byte representation.
pub fn decode(bytes: &[u8]) -> Result<TemplateArchive> {
    let mut reader = Reader::new(bytes);

    let magic = reader.take(ARCHIVE_MAGIC.len(), "the format identifier")?;
    if magic == LEGACY_ARCHIVE_MAGIC {
        return Err(Error::UnsupportedVersion);
    }
    if magic != ARCHIVE_MAGIC {
        return Err(invalid("unrecognised format identifier".to_string()));
    }
    reader.take(ARCHIVE_HEADER_LEN, "the reserved header")?;

    let language = reader.read_str(SHORT_WIDTH, "the language tag")?.to_string();
    debug!("Reading template for language '{language}'");

    let profile_data: IndexMap<String, Option<String>> =
        serde_json::from_str(reader.read_str(SHORT_WIDTH, "the profile data")?)
            .map_err(|e| invalid(format!("the profile data is not a JSON object ({e})")))?;
    let dependencies: Vec<String> =
        serde_json::from_str(reader.read_str(SHORT_WIDTH, "the dependency list")?)
            .map_err(|e| invalid(format!("the dependency list is not a JSON array ({e})")))?;

    let count = reader.read_len(SHORT_WIDTH, "the file count")?;
    debug!("Reading {count} file(s)");

    let mut files = IndexMap::with_capacity(count);
    for _ in 0..count {
        let key = reader.read_str(SHORT_WIDTH, "a file key")?.to_string();
        if let Err(reason) = check_file_key(&key) {
            return Err(invalid(format!("file key '{key}' is unsafe: {reason}")));
        }
        let len = reader.read_len(LONG_WIDTH, &format!("file '{key}'"))?;
        let value = reader.take(len, &format!("file '{key}'"))?.to_vec();
        trace!("Read '{key}' ({len} bytes)");
        if files.insert(key.clone(), value).is_some() {
            return Err(invalid(format!("file '{key}' appears more than once")));
        }
    }

    if !reader.is_exhausted() {
        return Err(invalid("unexpected data after the last file".to_string()));
    }

    Ok(TemplateArchive { files, profile_data, dependencies, language })
}
