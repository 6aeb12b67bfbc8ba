use log::debug;
use snafu::ensure;

use crate::cache::{CachedPartition, Owner};
use crate::directory_entry::{DirectoryEntry, EntryId, EntryType, DIRECTORY_ENTRY_SIZE};
use crate::error::{Error, FilenameTooLongSnafu, FsEndSnafu, Result};
use crate::fat_table::next_cluster;
use crate::formats::path::{Component, Path, MAX_FILENAME_SIZE};
use crate::formats::wide::Wide32;
use crate::volume::Volume;
use crate::{BlockDevice, ClusterId};

fn not_found(kind: EntryType) -> Error {
    match kind {
        EntryType::File => Error::FileNotFound,
        EntryType::Directory => Error::DirNotFound,
    }
}

/// Scans the directory starting at `directory` for a live entry called `name` of type `kind`.
pub(crate) fn find_entry<B: BlockDevice>(
    device: &mut CachedPartition<B>,
    volume: &Volume,
    directory: ClusterId,
    name: &str,
    kind: EntryType,
) -> Result<DirectoryEntry> {
    let budget = volume.max_chain_length();
    let mut visited = Wide32::ZERO;
    let mut cluster = Some(directory);
    while let Some(current) = cluster {
        ensure!(visited < budget, FsEndSnafu);
        visited.increment();

        let first_sector = volume.cluster_to_sector(current)?;
        for index in 0..volume.sectors_per_cluster {
            let sector = first_sector.checked_add(Wide32::from_u8(index))?;
            volume.check_in_bounds(sector)?;
            let data = device.restore(Owner::Traversal, sector)?;
            for slot in data.chunks_exact(DIRECTORY_ENTRY_SIZE) {
                let entry = DirectoryEntry::decode(slot)?;
                match entry.id() {
                    EntryId::EndOfEntries => {
                        debug!("'{}' not found, end of directory at sector {}", name, sector);
                        return Err(not_found(kind));
                    }
                    EntryId::Deleted | EntryId::LongFileName | EntryId::VolumeLabel => continue,
                    EntryId::Valid => {
                        if entry.entry_type() == kind && entry.matches(name) {
                            debug!("Found {:?}", entry);
                            return Ok(entry);
                        }
                    }
                }
            }
        }
        cluster = next_cluster(device, volume, current)?;
    }
    debug!("'{}' not found, directory chain exhausted", name);
    Err(not_found(kind))
}

/// Directory entries store the root directory as cluster 0.
fn directory_cluster(volume: &Volume, entry: &DirectoryEntry) -> ClusterId {
    let cluster = entry.cluster();
    if cluster.is_unallocated() {
        volume.root_cluster
    } else {
        cluster
    }
}

fn lookup<B: BlockDevice>(
    device: &mut CachedPartition<B>,
    volume: &Volume,
    directory: ClusterId,
    component: Component<'_>,
) -> Result<DirectoryEntry> {
    ensure!(
        component.name.len() <= MAX_FILENAME_SIZE,
        FilenameTooLongSnafu
    );
    find_entry(device, volume, directory, component.name, component.kind)
}

/// Resolves `path` from the root directory to the entry of a file.
pub(crate) fn resolve_path<B: BlockDevice>(
    device: &mut CachedPartition<B>,
    volume: &Volume,
    path: Path<'_>,
) -> Result<DirectoryEntry> {
    if path.is_directory() {
        return Err(Error::FileNotFound);
    }
    let mut directory = volume.root_cluster;
    let mut found = None;
    for component in path.components() {
        let entry = lookup(device, volume, directory, component)?;
        directory = directory_cluster(volume, &entry);
        found = Some(entry);
    }
    found.ok_or(Error::FileNotFound)
}

/// Resolves `path` from the root directory to the first cluster of a directory.
pub(crate) fn resolve_directory<B: BlockDevice>(
    device: &mut CachedPartition<B>,
    volume: &Volume,
    path: Path<'_>,
) -> Result<ClusterId> {
    let mut directory = volume.root_cluster;
    for component in path.components() {
        let component = Component {
            kind: EntryType::Directory,
            ..component
        };
        let entry = lookup(device, volume, directory, component)?;
        directory = directory_cluster(volume, &entry);
    }
    Ok(directory)
}
