use core::fmt;

#[cfg(feature = "std")]
use log::debug;

/// Every transfer moves exactly one sector of this size.
pub const SECTOR_SIZE: usize = 512;

/// Raw status code reported by the block transport.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TransportError(pub u8);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error {}", self.0)
    }
}

/// How the card interprets the addresses it is given.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CardType {
    /// Older cards, addressed in bytes. The transport scales sector addresses itself.
    LegacyByteAddressed,
    /// High capacity cards, addressed in sectors.
    SectorAddressed,
}

/// A block device is a storage device that reads and writes whole sectors.
///
/// The transport has no 32 bit parameters, so every sector address is passed as
/// two 16 bit halves. Callers split the address, implementations never have to.
pub trait BlockDevice {
    /// Bring the card up. Must succeed before any sector is read.
    fn card_init(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn card_type(&self) -> CardType {
        CardType::SectorAddressed
    }

    /// Read the sector at address `high:low` in `buf`.
    fn read_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &mut [u8; SECTOR_SIZE],
    ) -> Result<(), TransportError>;

    /// Write an entire sector. The filesystem layer never calls this.
    fn write_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &[u8; SECTOR_SIZE],
    ) -> Result<(), TransportError>;

    /// A human readable name for this device
    fn get_canonical_name() -> &'static str
    where
        Self: Sized,
    {
        "Block Device"
    }
}

impl<T: BlockDevice + ?Sized> BlockDevice for &mut T {
    fn card_init(&mut self) -> Result<(), TransportError> {
        (**self).card_init()
    }

    fn card_type(&self) -> CardType {
        (**self).card_type()
    }

    fn read_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &mut [u8; SECTOR_SIZE],
    ) -> Result<(), TransportError> {
        (**self).read_sector(low, high, buf)
    }

    fn write_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &[u8; SECTOR_SIZE],
    ) -> Result<(), TransportError> {
        (**self).write_sector(low, high, buf)
    }
}

/// FilebackedBlockDevice is an implementation of BlockDevice backed by
/// std::fs::File. It's a simple way to explore a card image on a host.
#[cfg(feature = "std")]
pub struct FilebackedBlockDevice {
    pub image: std::fs::File,
}

#[cfg(feature = "std")]
impl FilebackedBlockDevice {
    /// Status reported when the image cannot be read, same as the card's first read error.
    pub const READ_ERROR: TransportError = TransportError(62);
    pub const WRITE_ERROR: TransportError = TransportError(64);

    fn offset(low: u16, high: u16) -> u64 {
        (((high as u64) << 16) | low as u64) * SECTOR_SIZE as u64
    }
}

#[cfg(feature = "std")]
impl BlockDevice for FilebackedBlockDevice {
    fn read_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &mut [u8; SECTOR_SIZE],
    ) -> Result<(), TransportError> {
        use std::io::{Read, Seek, SeekFrom};
        let final_destination = Self::offset(low, high);
        debug!("Reading image at byte offset {}", final_destination);
        self.image
            .seek(SeekFrom::Start(final_destination))
            .map_err(|_| Self::READ_ERROR)?;
        self.image.read_exact(buf).map_err(|_| Self::READ_ERROR)
    }

    fn write_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &[u8; SECTOR_SIZE],
    ) -> Result<(), TransportError> {
        use std::io::{Seek, SeekFrom, Write};
        let final_destination = Self::offset(low, high);
        debug!("Writing image at byte offset {}", final_destination);
        self.image
            .seek(SeekFrom::Start(final_destination))
            .map_err(|_| Self::WRITE_ERROR)?;
        self.image.write_all(buf).map_err(|_| Self::WRITE_ERROR)
    }

    fn get_canonical_name() -> &'static str
    where
        Self: Sized,
    {
        "FileBasedBlockDevice"
    }
}
