//! sdfat is a small, read-only FAT32 driver for targets without a heap.
//!
//! Every sector the driver looks at goes through one 512 byte buffer, shared by up to
//! [`MAX_OPEN_FILES`] open files and the directory walker. Sector and cluster arithmetic is done
//! on [`Wide32`], a 4 byte integer that reports overflow instead of wrapping.
//!
//! ```no_run
//! # fn demo<B: sdfat::BlockDevice>(device: B) -> sdfat::Result<()> {
//! use sdfat::{FatFs, PartitionSelector};
//!
//! let mut fs = FatFs::new(device);
//! fs.locate_filesystem(PartitionSelector::Any)?;
//! let handle = fs.open("/docs/readme.txt")?;
//! let mut buf = [0u8; 64];
//! while fs.read(handle, &mut buf)? > 0 {}
//! fs.close(handle);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod cache;
mod device;
mod directory;
/// Short directory entries and their attributes.
pub mod directory_entry;
/// sdfat error definitions
mod error;
mod fat_table;
mod file;
mod formats;
mod fs;
mod macros;
/// A simple Master Boot Record implementation
pub mod mbr;
/// The FAT32 volume boot record.
pub mod bios_parameter_block;
pub mod volume;

pub use crate::device::{BlockDevice, CardType, TransportError, SECTOR_SIZE};
#[cfg(feature = "std")]
pub use crate::device::FilebackedBlockDevice;
pub use crate::directory_entry::{Attributes, DirectoryEntry, EntryType, ShortName};
pub use crate::error::{Error, Result};
pub use crate::fat_table::FatEntry;
pub use crate::formats::cluster_id::ClusterId;
pub use crate::formats::endian;
pub use crate::formats::path::{Path, MAX_FILENAME_SIZE};
pub use crate::formats::sector_id::SectorId;
pub use crate::formats::wide::Wide32;
pub use crate::fs::{FatFs, Handle, MAX_OPEN_FILES};
pub use crate::mbr::{Partition, PartitionSelector};
pub use crate::volume::{AddressingMode, Volume};
pub use binrw::io::SeekFrom;
