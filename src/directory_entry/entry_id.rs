use crate::directory_entry::DirectoryEntry;

/// marks previous entry as last in the directory
pub const ID_LAST_ENTRY_WAS_LAST: u8 = 0x00;

/// marks file as deleted when in name[0]
pub const ID_DELETED_UNUSED_ENTRY: u8 = 0xE5;

/// What a directory slot holds, decided from its first byte and attributes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryId {
    /// No live entry follows in this directory.
    EndOfEntries,
    Deleted,
    LongFileName,
    VolumeLabel,
    Valid,
}

impl From<&DirectoryEntry> for EntryId {
    fn from(entry: &DirectoryEntry) -> Self {
        match entry.file_name[0] {
            ID_LAST_ENTRY_WAS_LAST => Self::EndOfEntries,
            ID_DELETED_UNUSED_ENTRY => Self::Deleted,
            _ if entry.attributes.is_lfn() => Self::LongFileName,
            _ if entry.attributes.is_volume_id() => Self::VolumeLabel,
            _ => Self::Valid,
        }
    }
}
