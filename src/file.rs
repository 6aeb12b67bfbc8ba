use log::debug;

use crate::cache::{CachedPartition, Owner};
use crate::device::SECTOR_SIZE;
use crate::directory_entry::DirectoryEntry;
use crate::error::{FsEndSnafu, Result};
use crate::fat_table::next_cluster;
use crate::formats::wide::Wide32;
use crate::volume::Volume;
use crate::{BlockDevice, ClusterId, SectorId};

/// log2(SECTOR_SIZE)
const SECTOR_SHIFT: u8 = 9;
const SECTOR_OFFSET_MASK: u16 = SECTOR_SIZE as u16 - 1;

/// Cursor of an open file.
#[derive(Debug, Copy, Clone)]
pub(crate) struct OpenFile {
    entry: DirectoryEntry,
    start_cluster: ClusterId,
    current_cluster: ClusterId,
    /// `None` for an empty file without clusters.
    current_sector: Option<SectorId>,
    sector_in_cluster: u8,
    /// `SECTOR_SIZE` once the current sector has been consumed.
    pos_in_sector: u16,
    position: Wide32,
}

impl OpenFile {
    pub fn new(volume: &Volume, entry: DirectoryEntry) -> Result<Self> {
        let mut file = Self {
            entry,
            start_cluster: entry.cluster(),
            current_cluster: entry.cluster(),
            current_sector: None,
            sector_in_cluster: 0,
            pos_in_sector: 0,
            position: Wide32::ZERO,
        };
        file.reset(volume)?;
        Ok(file)
    }

    pub fn entry(&self) -> &DirectoryEntry {
        &self.entry
    }

    pub fn size(&self) -> Wide32 {
        self.entry.size()
    }

    pub fn position(&self) -> Wide32 {
        self.position
    }

    fn remaining(&self) -> Wide32 {
        let (left, underflow) = self.size().overflowing_sub(self.position);
        if underflow {
            Wide32::ZERO
        } else {
            left
        }
    }

    /// Reads up to `buf.len()` bytes. Returns fewer at the end of the file or of the chain.
    ///
    /// A failure after some bytes were copied ends the read early with their count. The
    /// cursor stays right behind them, so the next call runs into the failure again.
    pub fn read<B: BlockDevice>(
        &mut self,
        device: &mut CachedPartition<B>,
        volume: &Volume,
        owner: Owner,
        buf: &mut [u8],
    ) -> Result<usize> {
        let mut done = 0;
        while done < buf.len() {
            match self.read_from_sector(device, volume, owner, &mut buf[done..]) {
                Ok(0) => break,
                Ok(read) => done += read,
                Err(err) if done > 0 => {
                    debug!("Read stops at {} after {} bytes: {}", self.position, done, err);
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(done)
    }

    /// Copies from the current sector only. Returns 0 at the end of the file or of the chain.
    /// On error the cursor is left as it was.
    fn read_from_sector<B: BlockDevice>(
        &mut self,
        device: &mut CachedPartition<B>,
        volume: &Volume,
        owner: Owner,
        buf: &mut [u8],
    ) -> Result<usize> {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return Ok(0);
        }
        if usize::from(self.pos_in_sector) == SECTOR_SIZE && !self.advance(device, volume)? {
            debug!("Chain ended after {} bytes", self.position);
            return Ok(0);
        }
        let Some(sector) = self.current_sector else {
            return Ok(0);
        };
        volume.check_in_bounds(sector)?;
        let data = device.restore(owner, sector)?;

        let offset = usize::from(self.pos_in_sector);
        let mut take = (SECTOR_SIZE - offset).min(buf.len());
        // take <= SECTOR_SIZE, so it always fits 16 bits.
        if remaining < Wide32::from_u16(take as u16) {
            take = usize::from(remaining.low16());
        }
        let position = self.position.checked_add(Wide32::from_u16(take as u16))?;
        buf[..take].copy_from_slice(&data[offset..offset + take]);

        self.pos_in_sector += take as u16;
        self.position = position;
        Ok(take)
    }

    /// Moves to the next sector, following the chain at a cluster boundary.
    /// Returns false at the end of the chain. The cursor only moves on success.
    fn advance<B: BlockDevice>(
        &mut self,
        device: &mut CachedPartition<B>,
        volume: &Volume,
    ) -> Result<bool> {
        let Some(sector) = self.current_sector else {
            return Ok(false);
        };
        let next_index = self.sector_in_cluster + 1;
        let (cluster, index, sector) = if next_index < volume.sectors_per_cluster {
            (self.current_cluster, next_index, sector.checked_add(Wide32::ONE)?)
        } else {
            let Some(next) = next_cluster(device, volume, self.current_cluster)? else {
                return Ok(false);
            };
            (next, 0, volume.cluster_to_sector(next)?)
        };
        self.current_cluster = cluster;
        self.sector_in_cluster = index;
        self.current_sector = Some(sector);
        self.pos_in_sector = 0;
        Ok(true)
    }

    /// Back to the first byte of the start cluster.
    fn reset(&mut self, volume: &Volume) -> Result<()> {
        self.current_sector = if self.start_cluster.is_unallocated() {
            None
        } else {
            Some(volume.cluster_to_sector(self.start_cluster)?)
        };
        self.current_cluster = self.start_cluster;
        self.sector_in_cluster = 0;
        self.pos_in_sector = 0;
        self.position = Wide32::ZERO;
        Ok(())
    }

    /// Places the cursor at `target`, which must not be past the end of the file.
    /// The chain is walked again from its first cluster.
    pub fn seek<B: BlockDevice>(
        &mut self,
        device: &mut CachedPartition<B>,
        volume: &Volume,
        target: Wide32,
    ) -> Result<()> {
        self.reset(volume)?;
        if target.is_zero() {
            return Ok(());
        }
        let sector_index = target.shr(SECTOR_SHIFT);
        let offset = target.low16() & SECTOR_OFFSET_MASK;
        // A target on a sector boundary stays at the end of the previous sector.
        let (mut steps, pos_in_sector) = if offset == 0 {
            (sector_index.checked_sub(Wide32::ONE)?, SECTOR_SIZE as u16)
        } else {
            (sector_index, offset)
        };
        while !steps.is_zero() {
            if !self.advance(device, volume)? {
                debug!("Chain is shorter than the file size, seeking to {}", target);
                self.reset(volume)?;
                return FsEndSnafu.fail();
            }
            steps.decrement();
        }
        self.pos_in_sector = pos_in_sector;
        self.position = target;
        Ok(())
    }
}
