use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt};

use crate::const_assert_size;
use crate::error::{DecodeSnafu, Result};
use crate::formats::endian::{le16, le32};
use crate::formats::wide::Wide32;
use crate::ClusterId;

/// https://wiki.osdev.org/FAT#BPB_.28BIOS_Parameter_Block.29
/// Every multi byte field is kept as raw little-endian bytes and decoded on access.
#[derive(Debug, Copy, Clone, BinRead)]
pub struct BiosParameterBlock {
    /// These bytes are EB XX 90 -> JMP SHORT XX NOP
    _jump_instr: [u8; 3],
    /// OEM identifier, padded with spaces. Meaningless to FAT drivers.
    _oem_identifier: [u8; 8],
    /// Number of bytes per sector, at 0x0B.
    bytes_per_sector: [u8; 2],
    /// Number of sectors per cluster, at 0x0D.
    pub sectors_per_cluster: u8,
    /// Number of reserved sectors. Includes boot records.
    reserved_sectors: [u8; 2],
    /// Number of File Allocation Tables (FAT's) on the storage media. Often 2
    pub fat_amount: u8,
    _max_num_directory_entries: [u8; 2],
    _total_logical_sectors: [u8; 2],
    _fat_id: u8,
    /// Number of sectors per FAT. 0 for FAT32; use the 32-bit value in the extended bpb instead
    _sectors_per_fat_16: [u8; 2],
    _num_sectors_per_track: [u8; 2],
    _num_heads_on_storage: [u8; 2],
    _num_hidden_sectors: [u8; 4],
    _total_logical_sectors_gt_u16: [u8; 4],
}
const_assert_size!(BiosParameterBlock, 36);

#[derive(Debug, Copy, Clone, BinRead)]
pub struct ExtendedBiosParameterBlock {
    /// At 0x24 of the volume boot record.
    sectors_per_fat: [u8; 4],
    _flags: [u8; 2],
    _fat_version: [u8; 2],
    /// Cluster pointing to the root (`/`) directory, at 0x2C.
    root_cluster: [u8; 4],
    _fsinfo_sector: [u8; 2],
    _backup_boot_sector: [u8; 2],
    _reserved: [u8; 12],
    _drive_number: u8,
    _reserved2: u8,
    /// 0x28 or 0x29 for FAT32.
    pub signature: u8,
    _volumeid_serial_number: [u8; 4],
    /// Padded with spaces.
    pub volume_label_string: [u8; 11],
    /// The FAT documentation says never to trust this string.
    _system_identifier_string: [u8; 8],
    _boot_code: [u8; 420],
    /// 0x55 0xAA at 0x1FE.
    pub bootable_partition_signature: [u8; 2],
}
const_assert_size!(ExtendedBiosParameterBlock, 476);

/// The first sector of a FAT32 partition.
#[derive(Debug, Clone, BinRead)]
pub struct VolumeBootRecord {
    pub bpb: BiosParameterBlock,
    pub extended: ExtendedBiosParameterBlock,
}
const_assert_size!(VolumeBootRecord, 512);

impl VolumeBootRecord {
    pub fn decode(sector: &[u8; 512]) -> Result<Self> {
        Cursor::new(&sector[..])
            .read_le::<Self>()
            .map_err(|_| DecodeSnafu { what: "volume boot record" }.build())
    }

    pub fn bytes_per_sector(&self) -> u16 {
        le16(self.bpb.bytes_per_sector)
    }

    pub fn reserved_sectors(&self) -> u16 {
        le16(self.bpb.reserved_sectors)
    }

    pub fn sectors_per_fat(&self) -> Wide32 {
        le32(self.extended.sectors_per_fat)
    }

    pub fn root_cluster(&self) -> ClusterId {
        ClusterId::new(le32(self.extended.root_cluster))
    }
}
