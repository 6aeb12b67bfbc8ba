use log::{debug, info, warn};
use snafu::ensure;

use crate::bios_parameter_block::VolumeBootRecord;
use crate::cache::{CachedPartition, Owner};
use crate::device::{CardType, SECTOR_SIZE};
use crate::error::{
    FsEndSnafu, MissingFatSignatureSnafu, MissingRootClusterSnafu, NoSectorSizeInfoSnafu, Result,
    UnsupportedSectorSizeSnafu,
};
use crate::formats::wide::Wide32;
use crate::mbr::{Partition, VALID_BOOTSECTOR_SIGN};
use crate::{BlockDevice, ClusterId, SectorId};

/// FAT entries are 4 bytes, so a 512 byte sector holds 128 of them.
pub const FAT_ENTRIES_PER_SECTOR_SHIFT: u8 = 7;
const FAT_ENTRY_OFFSET_MASK: u8 = 0x7F;
pub const FAT_ENTRY_SIZE: usize = 4;

/// How the card addresses sectors, derived from its type at mount time.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddressingMode {
    Lba,
    Legacy,
}

impl From<CardType> for AddressingMode {
    fn from(card: CardType) -> Self {
        match card {
            CardType::SectorAddressed => AddressingMode::Lba,
            CardType::LegacyByteAddressed => AddressingMode::Legacy,
        }
    }
}

/// Geometry of a mounted FAT32 volume. Only built once every field decoded successfully.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Volume {
    pub partition: Partition,
    pub sector_size: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub sectors_per_fat: Wide32,
    pub fat_start: SectorId,
    pub data_start: SectorId,
    pub root_cluster: ClusterId,
    pub addressing: AddressingMode,
    /// First sector past the partition.
    pub partition_end: SectorId,
}

impl Volume {
    /// Reads the volume boot record of `partition` and derives the geometry.
    /// Fields are checked in on-disk order, the first failing check is reported.
    pub(crate) fn read<B: BlockDevice>(
        device: &mut CachedPartition<B>,
        partition: Partition,
        addressing: AddressingMode,
    ) -> Result<Self> {
        let sector = device.restore(Owner::Traversal, partition.start)?;
        let vbr = VolumeBootRecord::decode(sector)?;
        Self::from_boot_record(&vbr, partition, addressing)
    }

    fn from_boot_record(
        vbr: &VolumeBootRecord,
        partition: Partition,
        addressing: AddressingMode,
    ) -> Result<Self> {
        let sector_size = vbr.bytes_per_sector();
        ensure!(sector_size != 0, NoSectorSizeInfoSnafu);
        if usize::from(sector_size) != SECTOR_SIZE {
            warn!("Sector size {} is not supported.", sector_size);
            return UnsupportedSectorSizeSnafu { size: sector_size }.fail();
        }
        let sectors_per_cluster = vbr.bpb.sectors_per_cluster;
        ensure!(sectors_per_cluster != 0, NoSectorSizeInfoSnafu);

        let sectors_per_fat = vbr.sectors_per_fat();
        let reserved_sectors = vbr.reserved_sectors();
        let fat_count = vbr.bpb.fat_amount;

        let fat_start = partition
            .start
            .checked_add(Wide32::from_u16(reserved_sectors))?;
        let all_fats = sectors_per_fat.checked_mul_small(fat_count)?;
        let data_start = fat_start.checked_add(all_fats)?;

        let root_cluster = vbr.root_cluster();
        ensure!(!root_cluster.is_unallocated(), MissingRootClusterSnafu);

        let signature = vbr.extended.bootable_partition_signature;
        if signature != VALID_BOOTSECTOR_SIGN {
            warn!("Volume boot record ends with {:x?}.", signature);
        }
        ensure!(signature == VALID_BOOTSECTOR_SIGN, MissingFatSignatureSnafu);

        // A zero count means the table did not record one.
        let partition_end = match partition
            .start
            .wide()
            .overflowing_add(partition.sector_count)
        {
            (end, false) if !partition.sector_count.is_zero() => SectorId(end),
            _ => SectorId(Wide32::MAX),
        };

        let volume = Volume {
            partition,
            sector_size,
            sectors_per_cluster,
            reserved_sectors,
            fat_count,
            sectors_per_fat,
            fat_start,
            data_start,
            root_cluster,
            addressing,
            partition_end,
        };
        info!(
            "Mounted FAT32: {} sectors per cluster, {} FATs of {} sectors, FAT at {}, data at {}, root cluster {}",
            sectors_per_cluster, fat_count, sectors_per_fat, fat_start, data_start, root_cluster
        );
        Ok(volume)
    }

    /// First sector of `cluster`. The root cluster always maps to the start of the data area.
    pub fn cluster_to_sector(&self, cluster: ClusterId) -> Result<SectorId> {
        if cluster == self.root_cluster {
            return Ok(self.data_start);
        }
        let index = cluster.wide().checked_sub(Wide32::from_u8(2))?;
        let offset = index.checked_mul_small(self.sectors_per_cluster)?;
        self.data_start.checked_add(offset)
    }

    /// Sector of the FAT holding `cluster`'s entry, and the entry's byte offset in it.
    pub fn fat_entry_location(&self, cluster: ClusterId) -> Result<(SectorId, usize)> {
        let id = cluster.wide();
        let sector = self
            .fat_start
            .checked_add(id.shr(FAT_ENTRIES_PER_SECTOR_SHIFT))?;
        let offset = usize::from(id.low_byte() & FAT_ENTRY_OFFSET_MASK) * FAT_ENTRY_SIZE;
        Ok((sector, offset))
    }

    pub fn check_in_bounds(&self, sector: SectorId) -> Result<()> {
        if sector >= self.partition_end {
            debug!(
                "Sector {} is past the partition end {}",
                sector, self.partition_end
            );
        }
        ensure!(sector < self.partition_end, FsEndSnafu);
        Ok(())
    }

    /// Upper bound on the clusters a single chain can visit.
    pub fn max_chain_length(&self) -> Wide32 {
        let (entries, overflow) = self.sectors_per_fat.overflowing_mul_small(128);
        if overflow {
            Wide32::MAX
        } else {
            entries
        }
    }
}

#[cfg(test)]
mod test {
    use super::{AddressingMode, Volume};
    use crate::bios_parameter_block::VolumeBootRecord;
    use crate::formats::wide::Wide32;
    use crate::mbr::Partition;
    use crate::{ClusterId, Error, SectorId};

    fn boot_sector() -> [u8; 512] {
        let mut sector = [0u8; 512];
        sector[0x0B..0x0D].copy_from_slice(&[0x00, 0x02]);
        sector[0x0D] = 4;
        sector[0x0E..0x10].copy_from_slice(&[0x04, 0x00]);
        sector[0x10] = 2;
        sector[0x24..0x28].copy_from_slice(&[0x02, 0x00, 0x00, 0x00]);
        sector[0x2C..0x30].copy_from_slice(&[0x02, 0x00, 0x00, 0x00]);
        sector[0x1FE..].copy_from_slice(&[0x55, 0xAA]);
        sector
    }

    fn partition() -> Partition {
        Partition {
            number: 1,
            type_code: 0x0C,
            start: SectorId::from(8),
            sector_count: Wide32::from(1000),
        }
    }

    fn geometry(sector: &[u8; 512]) -> Result<Volume, Error> {
        let vbr = VolumeBootRecord::decode(sector)?;
        Volume::from_boot_record(&vbr, partition(), AddressingMode::Lba)
    }

    #[test]
    fn test_geometry() {
        let volume = geometry(&boot_sector()).unwrap();
        assert_eq!(volume.fat_start, SectorId::from(12));
        assert_eq!(volume.data_start, SectorId::from(16));
        assert_eq!(volume.root_cluster, ClusterId::from(2));
        assert_eq!(volume.partition_end, SectorId::from(1008));
        assert_eq!(volume.max_chain_length(), Wide32::from(256));
    }

    #[test]
    fn test_geometry_errors_follow_field_order() {
        let mut sector = boot_sector();
        sector[0x0B..0x0D].copy_from_slice(&[0, 0]);
        sector[0x2C..0x30].copy_from_slice(&[0, 0, 0, 0]);
        sector[0x1FE..].copy_from_slice(&[0, 0]);
        assert_eq!(geometry(&sector), Err(Error::NoSectorSizeInfo));

        sector[0x0B..0x0D].copy_from_slice(&[0x00, 0x04]);
        assert_eq!(
            geometry(&sector),
            Err(Error::UnsupportedSectorSize { size: 1024 })
        );

        sector[0x0B..0x0D].copy_from_slice(&[0x00, 0x02]);
        assert_eq!(geometry(&sector), Err(Error::MissingRootCluster));

        sector[0x2C] = 2;
        assert_eq!(geometry(&sector), Err(Error::MissingFatSignature));

        let mut sector = boot_sector();
        sector[0x0D] = 0;
        assert_eq!(geometry(&sector), Err(Error::NoSectorSizeInfo));
    }

    #[test]
    fn test_data_start_overflow() {
        let mut sector = boot_sector();
        sector[0x24..0x28].copy_from_slice(&[0x00, 0x00, 0x00, 0xF0]);
        assert_eq!(geometry(&sector), Err(Error::Overflow));
    }

    #[test]
    fn test_translation() {
        let volume = geometry(&boot_sector()).unwrap();
        assert_eq!(
            volume.cluster_to_sector(volume.root_cluster).unwrap(),
            volume.data_start
        );
        assert_eq!(
            volume.cluster_to_sector(ClusterId::from(5)).unwrap(),
            SectorId::from(16 + 3 * 4)
        );
        assert_eq!(
            volume.cluster_to_sector(ClusterId::from(1)),
            Err(Error::Underflow)
        );

        assert_eq!(
            volume.fat_entry_location(ClusterId::from(2)).unwrap(),
            (SectorId::from(12), 8)
        );
        assert_eq!(
            volume.fat_entry_location(ClusterId::from(130)).unwrap(),
            (SectorId::from(13), 8)
        );
        assert_eq!(
            volume.fat_entry_location(ClusterId::from(127)).unwrap(),
            (SectorId::from(12), 508)
        );
    }

    #[test]
    fn test_bounds() {
        let volume = geometry(&boot_sector()).unwrap();
        assert!(volume.check_in_bounds(SectorId::from(1007)).is_ok());
        assert_eq!(
            volume.check_in_bounds(SectorId::from(1008)),
            Err(Error::FsEnd)
        );
    }
}
