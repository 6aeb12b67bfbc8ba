use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt};
use core::fmt;

pub use attributes::{attribute, Attributes};
pub use entry_id::EntryId;

use crate::error::{DecodeSnafu, Result};
use crate::formats::endian::{le16, le32};
use crate::formats::path::MAX_FILENAME_SIZE;
use crate::formats::wide::Wide32;
use crate::{const_assert_size, ClusterId};

mod attributes;
mod entry_id;

/// Size of a directory slot on disk.
pub const DIRECTORY_ENTRY_SIZE: usize = 32;

/// Padding of short names and extensions.
const PADDING_CHARACTER: u8 = b' ';
const DOT_CHARACTER: u8 = b'.';
/// A name starting with 0xE5 is stored with 0x05 instead, so it does not read as deleted.
const ESCAPED_E5: u8 = 0x05;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryType {
    File,
    Directory,
}

/// A short (8.3) directory entry, as stored on disk.
#[derive(Copy, Clone, Eq, PartialEq, BinRead)]
pub struct DirectoryEntry {
    /// File name: 8 ASCII characters, padded with spaces.
    /// If the file name starts with 0x00, the previous entry was the last entry.
    /// If the file name starts with 0xE5, this is a deleted/unused entry.
    pub file_name: [u8; 8],
    /// Extension of the file, 3 ASCII characters.
    pub file_ext: [u8; 3],
    pub attributes: Attributes,
    _reserved_win_nt: u8,
    _creation_millis: u8,
    _creation_time: [u8; 4],
    _last_access_date: [u8; 2],
    /// Higher 16bits of the file's ClusterId, at 0x14.
    high_16bits: [u8; 2],
    _last_modification_time: [u8; 4],
    /// Lower 16 bits of the file's ClusterId, at 0x1A.
    low_16bits: [u8; 2],
    /// The size of the file in bytes, at 0x1C.
    file_size: [u8; 4],
}
const_assert_size!(DirectoryEntry, DIRECTORY_ENTRY_SIZE);

impl DirectoryEntry {
    pub fn decode(slot: &[u8]) -> Result<Self> {
        Cursor::new(slot)
            .read_le::<Self>()
            .map_err(|_| DecodeSnafu { what: "directory entry" }.build())
    }

    pub fn id(&self) -> EntryId {
        EntryId::from(self)
    }

    pub fn entry_type(&self) -> EntryType {
        if self.attributes.is_directory() {
            EntryType::Directory
        } else {
            EntryType::File
        }
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type() == EntryType::Directory
    }

    pub fn cluster(&self) -> ClusterId {
        ClusterId::from_high_low(le16(self.high_16bits), le16(self.low_16bits))
    }

    pub fn size(&self) -> Wide32 {
        le32(self.file_size)
    }

    /// The name as "BASE.EXT", without padding. The dot is left out when there is no extension.
    pub fn short_name(&self) -> ShortName {
        let mut name = ShortName::default();
        let base_len = trimmed_len(&self.file_name);
        for (index, byte) in self.file_name[..base_len].iter().enumerate() {
            name.push(match (index, *byte) {
                (0, ESCAPED_E5) => 0xE5,
                (_, byte) => byte,
            });
        }
        let ext_len = trimmed_len(&self.file_ext);
        if ext_len > 0 {
            name.push(DOT_CHARACTER);
            self.file_ext[..ext_len].iter().for_each(|b| name.push(*b));
        }
        name
    }

    /// Case insensitive comparison of the whole short name with `candidate`.
    pub fn matches(&self, candidate: &str) -> bool {
        self.short_name()
            .as_bytes()
            .eq_ignore_ascii_case(candidate.as_bytes())
    }
}

fn trimmed_len(field: &[u8]) -> usize {
    field
        .iter()
        .rposition(|b| *b != PADDING_CHARACTER)
        .map_or(0, |last| last + 1)
}

impl fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryEntry")
            .field("name", &format_args!("{}", self.short_name()))
            .field("attributes", &self.attributes)
            .field("cluster", &self.cluster())
            .field("file_size", &self.size())
            .finish()
    }
}

/// A rendered 8.3 name. Bytes are taken as stored, they are not guaranteed to be ASCII.
#[derive(Copy, Clone, Default, Eq, PartialEq)]
pub struct ShortName {
    bytes: [u8; MAX_FILENAME_SIZE],
    len: usize,
}

impl ShortName {
    fn push(&mut self, byte: u8) {
        self.bytes[self.len] = byte;
        self.len += 1;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// `None` when the name holds bytes outside of UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            let shown = if byte.is_ascii() { *byte as char } else { '?' };
            write!(f, "{}", shown)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}
