use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt};
use log::{debug, info, warn};
use snafu::ensure;

use crate::cache::{CachedPartition, Owner};
use crate::error::{DecodeSnafu, MissingBootChecksumSnafu, NoPartitionEntrySnafu, Result};
use crate::formats::endian::le32;
use crate::formats::wide::Wide32;
use crate::{const_assert_size, BlockDevice, SectorId};

/// Magic indicating a valid bootsector
pub const VALID_BOOTSECTOR_SIGN: [u8; 2] = [0x55, 0xAA];

/// Look at PartitionEntry / bootable_indicator_flag.
pub const BOOTABLE_PARTITION_FLAG: u8 = 0x80;

/// From: https://en.wikipedia.org/wiki/Partition_type#List_of_partition_IDs
/// 0x0B is FAT32 with CHS addressing, 0x0C is FAT32 with LBA.
pub const FAT32_PARTITION_ID: [u8; 2] = [0x0B, 0x0C];

/// Number of slots in the partition table.
pub const PARTITION_SLOTS: u8 = 4;

/// Always available in sector 0
#[derive(Debug, Clone, BinRead)]
pub struct MasterBootRecord {
    /// MBRBootstrap(flat binary executable code) and the optional disk id.
    _mbr_bootstrap: [u8; 446],
    /// MBRPartition Table, with 4 entries
    pub partitions: [PartitionEntry; 4],
    /// (0x55, 0xAA) "Valid bootsector" signature bytes - check `VALID_BOOTSECTOR_SIGN`
    pub valid_bootsector_sign: [u8; 2],
}
const_assert_size!(MasterBootRecord, 512);

impl MasterBootRecord {
    pub fn decode(sector: &[u8; 512]) -> Result<Self> {
        Cursor::new(&sector[..])
            .read_le::<Self>()
            .map_err(|_| DecodeSnafu { what: "master boot record" }.build())
    }

    pub fn has_valid_signature(&self) -> bool {
        self.valid_bootsector_sign == VALID_BOOTSECTOR_SIGN
    }
}

/// An entry in the MBR partition table. Multi byte fields stay in their on-disk order.
#[derive(Debug, Default, Clone, Copy, BinRead)]
pub struct PartitionEntry {
    /// Boot indicator bit flag: 0 = no, 0x80 = bootable (or "active")
    pub bootable_indicator_flag: u8,
    /// Head, sector and cylinder of the first sector. Unused.
    _chs_begin: [u8; 3],
    /// Partition Type (0xB or 0xC for FAT32).
    pub partition_type: u8,
    _chs_end: [u8; 3],
    /// Relative Sector (offset, in sectors, from start of disk to start of the partition)
    lba_begin: [u8; 4],
    sector_count: [u8; 4],
}
const_assert_size!(PartitionEntry, 16);

impl PartitionEntry {
    pub fn is_fat32(&self) -> bool {
        FAT32_PARTITION_ID.contains(&self.partition_type)
    }

    pub fn start_sector(&self) -> SectorId {
        SectorId(le32(self.lba_begin))
    }

    pub fn sector_count(&self) -> Wide32 {
        le32(self.sector_count)
    }
}

/// Which partition table slots `locate_partition` may pick from.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum PartitionSelector {
    /// The first FAT32 slot wins.
    #[default]
    Any,
    /// Only slot n, counting from 1.
    Slot(u8),
}

/// The partition selected for mounting.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Partition {
    /// Slot number, 1 to 4.
    pub number: u8,
    pub type_code: u8,
    pub start: SectorId,
    pub sector_count: Wide32,
}

/// Reads sector 0 and picks the FAT32 partition matching `selector`.
pub(crate) fn locate_partition<B: BlockDevice>(
    partition: &mut CachedPartition<B>,
    selector: PartitionSelector,
) -> Result<Partition> {
    let sector = partition.restore(Owner::Traversal, SectorId(Wide32::ZERO))?;
    let mbr = MasterBootRecord::decode(sector)?;
    if !mbr.has_valid_signature() {
        warn!(
            "Sector 0 ends with {:x?}, not a master boot record.",
            mbr.valid_bootsector_sign
        );
    }
    ensure!(mbr.has_valid_signature(), MissingBootChecksumSnafu);

    let slots = match selector {
        PartitionSelector::Any => 1..=PARTITION_SLOTS,
        PartitionSelector::Slot(n) if (1..=PARTITION_SLOTS).contains(&n) => n..=n,
        PartitionSelector::Slot(n) => {
            warn!("Requested partition slot {}, valid slots are 1 to 4.", n);
            return NoPartitionEntrySnafu.fail();
        }
    };
    for number in slots {
        let entry = &mbr.partitions[usize::from(number - 1)];
        if !entry.is_fat32() {
            debug!(
                "Partition {} has type {:#04x}, skipping.",
                number, entry.partition_type
            );
            continue;
        }
        let found = Partition {
            number,
            type_code: entry.partition_type,
            start: entry.start_sector(),
            sector_count: entry.sector_count(),
        };
        info!(
            "Using partition {} (type {:#04x}) starting at sector {}",
            found.number, found.type_code, found.start
        );
        return Ok(found);
    }
    warn!("No FAT32 partition matches {:?}.", selector);
    NoPartitionEntrySnafu.fail()
}

#[cfg(test)]
mod test {
    use super::{MasterBootRecord, VALID_BOOTSECTOR_SIGN};
    use crate::formats::wide::Wide32;
    use crate::SectorId;

    #[test]
    fn test_decode_partition_table() {
        let mut sector = [0u8; 512];
        let slot = 0x1BE + 16;
        sector[slot] = 0x80;
        sector[slot + 4] = 0x0C;
        sector[slot + 8..slot + 12].copy_from_slice(&[0x00, 0x08, 0x00, 0x00]);
        sector[slot + 12..slot + 16].copy_from_slice(&[0x00, 0x00, 0x01, 0x00]);
        sector[510..].copy_from_slice(&VALID_BOOTSECTOR_SIGN);

        let mbr = MasterBootRecord::decode(&sector).unwrap();
        assert!(mbr.has_valid_signature());
        assert!(!mbr.partitions[0].is_fat32());
        let entry = &mbr.partitions[1];
        assert!(entry.is_fat32());
        assert_eq!(entry.bootable_indicator_flag, super::BOOTABLE_PARTITION_FLAG);
        assert_eq!(entry.start_sector(), SectorId::from(0x800));
        assert_eq!(entry.sector_count(), Wide32::from(0x10000));
    }
}
