use crate::formats::endian::le32;
use crate::formats::wide::Wide32;
use crate::volume::FAT_ENTRY_SIZE;
use crate::ClusterId;

/// The upper 4 bits of a FAT32 entry are reserved and ignored.
const ENTRY_MASK: u8 = 0x0F;

/// A FAT32 row entry, classified. Each entry describes one cluster.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FatEntry {
    /// A free, unused cluster. 0x00
    Unused,
    /// 0x01, and the reserved range 0x0FFFFFF0..=0x0FFFFFF6.
    Reserved(Wide32),
    /// 0x0FFFFFF7
    Bad,
    /// A data cluster; value points to next cluster in chain.
    DataCluster(ClusterId),
    /// Last cluster in chain: 0x0FFFFFF8..=0x0FFFFFFF.
    LastCluster(Wide32),
}

impl FatEntry {
    /// The next cluster of the chain, if this entry continues one.
    pub fn next(self) -> Option<ClusterId> {
        match self {
            FatEntry::DataCluster(next) => Some(next),
            _ => None,
        }
    }
}

impl From<[u8; FAT_ENTRY_SIZE]> for FatEntry {
    fn from(raw: [u8; FAT_ENTRY_SIZE]) -> Self {
        let mut bytes = le32(raw).to_be_bytes();
        bytes[0] &= ENTRY_MASK;
        let value = Wide32::from_be_bytes(bytes);
        use FatEntry::*;
        match u32::from(value) {
            0x0 => Unused,
            0x0000002..=0xFFFFFEF => DataCluster(ClusterId::new(value)),
            0xFFFFFF7 => Bad,
            0xFFFFFF8..=0xFFFFFFF => LastCluster(value),
            _ => Reserved(value),
        }
    }
}
