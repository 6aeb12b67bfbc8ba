use log::debug;

use crate::cache::{CachedPartition, Owner};
use crate::error::Result;
use crate::fat_table::FatEntry;
use crate::volume::{Volume, FAT_ENTRY_SIZE};
use crate::{BlockDevice, ClusterId};

/// Returns the next clusterid in the chain after the provided cluster_id, if any.
/// `None` is the end of the chain, and so is any entry that is not a data cluster.
pub(crate) fn next_cluster<B: BlockDevice>(
    device: &mut CachedPartition<B>,
    volume: &Volume,
    cluster_id: ClusterId,
) -> Result<Option<ClusterId>> {
    let fat_entry = read_fat_entry(device, volume, cluster_id)?;
    debug!("Fat entry of cluster {}: {:?}", cluster_id, fat_entry);
    Ok(fat_entry.next())
}

pub(crate) fn read_fat_entry<B: BlockDevice>(
    device: &mut CachedPartition<B>,
    volume: &Volume,
    cluster_id: ClusterId,
) -> Result<FatEntry> {
    let (sector, offset) = volume.fat_entry_location(cluster_id)?;
    volume.check_in_bounds(sector)?;
    let data = device.restore(Owner::Traversal, sector)?;
    let mut raw = [0u8; FAT_ENTRY_SIZE];
    raw.copy_from_slice(&data[offset..offset + FAT_ENTRY_SIZE]);
    Ok(FatEntry::from(raw))
}
