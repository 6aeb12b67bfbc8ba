use core::fmt;

use binrw::io::SeekFrom;
use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

use crate::cache::{CachedPartition, Owner};
use crate::directory;
use crate::directory_entry::{DirectoryEntry, EntryType};
use crate::error::{BadHandleSnafu, InvalidSeekSnafu, NoFilesystemSnafu, NoFreeHandlesSnafu};
use crate::file::OpenFile;
use crate::formats::wide::Wide32;
use crate::mbr::{locate_partition, PartitionSelector};
use crate::volume::{AddressingMode, Volume};
use crate::{BlockDevice, ClusterId, Error, Path, Result};

/// Number of files that can be open at the same time.
pub const MAX_OPEN_FILES: usize = 4;

/// An open file, numbered from 1. Number 0 is never handed out.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Handle(u8);

impl Handle {
    pub const fn new(raw: u8) -> Self {
        Handle(raw)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn slot(self) -> Option<usize> {
        usize::from(self.0)
            .checked_sub(1)
            .filter(|slot| *slot < MAX_OPEN_FILES)
    }
}

/// A FAT32 filesystem on a block device: the mounted volume, the handle table and the sector
/// buffer they all share.
pub struct FatFs<B: BlockDevice> {
    device: CachedPartition<B>,
    volume: Option<Volume>,
    handles: [Option<OpenFile>; MAX_OPEN_FILES],
}

impl<B: BlockDevice> fmt::Debug for FatFs<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FatFs")
            .field("volume", &self.volume)
            .field(
                "open_files",
                &self.handles.iter().filter(|h| h.is_some()).count(),
            )
            .finish()
    }
}

impl<B: BlockDevice> FatFs<B> {
    /// Wraps `device`. Nothing is read until `locate_filesystem`.
    pub fn new(device: B) -> Self {
        Self {
            device: CachedPartition::new(device),
            volume: None,
            handles: [None; MAX_OPEN_FILES],
        }
    }

    /// Finds the FAT32 partition and reads its geometry. Every open file is closed, and on
    /// failure no volume stays mounted.
    pub fn locate_filesystem(&mut self, selector: PartitionSelector) -> Result<&Volume> {
        self.volume = None;
        self.handles = [None; MAX_OPEN_FILES];
        self.device.invalidate();

        let addressing = AddressingMode::from(self.device.device().card_type());
        let partition = locate_partition(&mut self.device, selector)?;
        let volume = Volume::read(&mut self.device, partition, addressing)?;
        info!("Volume ready, {:?} addressing", volume.addressing);
        Ok(self.volume.insert(volume))
    }

    pub fn volume(&self) -> Option<&Volume> {
        self.volume.as_ref()
    }

    /// Opens the file at `path`. A failed open leaves every handle slot as it was.
    pub fn open(&mut self, path: &str) -> Result<Handle> {
        let volume = self.volume.as_ref().context(NoFilesystemSnafu)?;
        let slot = self
            .handles
            .iter()
            .position(Option::is_none)
            .context(NoFreeHandlesSnafu)?;
        let entry = directory::resolve_path(&mut self.device, volume, Path::new(path))
            .map_err(|err| {
                if err.is_lookup_miss() {
                    debug!("Cannot open '{}': {}", path, err);
                } else {
                    warn!("Cannot open '{}': {}", path, err);
                }
                err
            })?;
        let file = OpenFile::new(volume, entry)?;
        self.handles[slot] = Some(file);
        let handle = Handle(slot as u8 + 1);
        debug!("Opened '{}' as {:?}", path, handle);
        Ok(handle)
    }

    /// Frees the handle's slot. Closing a handle that is not open does nothing.
    pub fn close(&mut self, handle: Handle) {
        if let Some(slot) = handle.slot() {
            self.handles[slot] = None;
        }
    }

    /// Reads from the handle's current position, returns the number of bytes read.
    /// Zero means the end of the file.
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let volume = self.volume.as_ref().context(NoFilesystemSnafu)?;
        let file = open_file(&mut self.handles, handle)?;
        file.read(&mut self.device, volume, Owner::File(handle.0), buf)
    }

    pub fn read_byte(&mut self, handle: Handle) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        Ok(match self.read(handle, &mut byte)? {
            0 => None,
            _ => Some(byte[0]),
        })
    }

    /// Moves the handle's position, returns the new position from the start of the file.
    pub fn seek(&mut self, handle: Handle, pos: SeekFrom) -> Result<u32> {
        let volume = self.volume.as_ref().context(NoFilesystemSnafu)?;
        let file = open_file(&mut self.handles, handle)?;
        let size = file.size();
        let target = match pos {
            SeekFrom::Start(offset) => wide_offset(offset)?,
            SeekFrom::Current(delta) => relative(file.position(), delta)?,
            SeekFrom::End(delta) => relative(size, delta)?,
        };
        ensure!(target <= size, InvalidSeekSnafu);
        file.seek(&mut self.device, volume, target)?;
        Ok(u32::from(target))
    }

    pub fn rewind(&mut self, handle: Handle) -> Result<()> {
        self.seek(handle, SeekFrom::Start(0)).map(|_| ())
    }

    pub fn position(&mut self, handle: Handle) -> Result<u32> {
        Ok(u32::from(open_file(&mut self.handles, handle)?.position()))
    }

    pub fn file_size(&mut self, handle: Handle) -> Result<u32> {
        Ok(u32::from(open_file(&mut self.handles, handle)?.size()))
    }

    /// A copy of the directory entry the handle was opened from.
    pub fn entry(&mut self, handle: Handle) -> Result<DirectoryEntry> {
        Ok(*open_file(&mut self.handles, handle)?.entry())
    }

    /// Looks up `name` in the directory starting at `directory`.
    pub fn find_entry(
        &mut self,
        directory: ClusterId,
        name: &str,
        kind: EntryType,
    ) -> Result<DirectoryEntry> {
        let volume = self.volume.as_ref().context(NoFilesystemSnafu)?;
        directory::find_entry(&mut self.device, volume, directory, name, kind)
    }

    /// Resolves `path` to the entry of a file.
    pub fn resolve_path(&mut self, path: &str) -> Result<DirectoryEntry> {
        let volume = self.volume.as_ref().context(NoFilesystemSnafu)?;
        directory::resolve_path(&mut self.device, volume, Path::new(path))
    }

    /// Resolves `path` to the first cluster of a directory. `/` is the root directory.
    pub fn resolve_directory(&mut self, path: &str) -> Result<ClusterId> {
        let volume = self.volume.as_ref().context(NoFilesystemSnafu)?;
        directory::resolve_directory(&mut self.device, volume, Path::new(path))
    }

    pub fn into_inner(self) -> B {
        self.device.into_inner()
    }
}

fn open_file(
    handles: &mut [Option<OpenFile>; MAX_OPEN_FILES],
    handle: Handle,
) -> Result<&mut OpenFile> {
    handle
        .slot()
        .and_then(|slot| handles[slot].as_mut())
        .context(BadHandleSnafu { handle: handle.0 })
}

fn wide_offset(offset: u64) -> Result<Wide32> {
    u32::try_from(offset)
        .map(Wide32::from)
        .map_err(|_| Error::InvalidSeek)
}

fn relative(base: Wide32, delta: i64) -> Result<Wide32> {
    let magnitude = wide_offset(delta.unsigned_abs())?;
    let moved = if delta < 0 {
        base.checked_sub(magnitude)
    } else {
        base.checked_add(magnitude)
    };
    moved.map_err(|_| Error::InvalidSeek)
}
