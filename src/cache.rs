use log::{debug, error};

use crate::device::{BlockDevice, SECTOR_SIZE};
use crate::error::{IoSnafu, Result};
use crate::SectorId;

/// Who filled the shared sector buffer last.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Owner {
    /// Directory walks, FAT lookups and volume setup.
    Traversal,
    /// An open file, by handle number.
    File(u8),
}

/// The block device together with the one sector buffer every reader shares.
///
/// The buffer is tagged with the owner that filled it and the sector it holds. A reader
/// always goes through [`CachedPartition::restore`], which only skips the device read when
/// both the owner and the sector still match.
pub(crate) struct CachedPartition<B> {
    device: B,
    buffer: [u8; SECTOR_SIZE],
    tag: Option<(Owner, SectorId)>,
}

impl<B: BlockDevice> CachedPartition<B> {
    pub fn new(device: B) -> Self {
        Self {
            device,
            buffer: [0; SECTOR_SIZE],
            tag: None,
        }
    }

    /// Makes the buffer hold `sector` on behalf of `owner` and returns its content.
    /// The borrow ends before anyone else can restore the buffer.
    pub fn restore(&mut self, owner: Owner, sector: SectorId) -> Result<&[u8; SECTOR_SIZE]> {
        if self.tag == Some((owner, sector)) {
            return Ok(&self.buffer);
        }
        debug!("Sector buffer: {:?} loads sector {}", owner, sector);
        // The old content is gone as soon as the read starts.
        self.tag = None;
        let (low, high) = sector.split();
        if let Err(status) = self.device.read_sector(low, high, &mut self.buffer) {
            error!("Failed reading sector {}: {}", sector, status);
            return IoSnafu {
                sector: u32::from(sector),
                status: status.0,
            }
            .fail();
        }
        self.tag = Some((owner, sector));
        Ok(&self.buffer)
    }

    /// Forget the buffer's content, e.g. after the medium may have changed.
    pub fn invalidate(&mut self) {
        self.tag = None;
    }

    pub fn device(&mut self) -> &mut B {
        &mut self.device
    }

    pub fn into_inner(self) -> B {
        self.device
    }
}
