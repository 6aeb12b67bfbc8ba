//! Builds small FAT32 card images in memory.
#![allow(dead_code)]

use rand::Rng;
use std::path::PathBuf;

pub const SECTOR: usize = 512;
pub const PARTITION_START: u32 = 8;
pub const RESERVED_SECTORS: u16 = 4;
pub const FAT_COUNT: u8 = 2;
pub const SECTORS_PER_FAT: u32 = 2;
pub const FAT_START: u32 = PARTITION_START + RESERVED_SECTORS as u32;
pub const DATA_START: u32 = FAT_START + FAT_COUNT as u32 * SECTORS_PER_FAT;
pub const ROOT_CLUSTER: u32 = 2;
/// Clusters 2 up to 2 + CLUSTER_COUNT exist on the card.
pub const CLUSTER_COUNT: u32 = 120;
pub const END_OF_CHAIN: u32 = 0x0FFF_FFFF;

pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LFN: u8 = 0x0F;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pads "NAME.EXT" into the 11 byte on-disk form.
pub fn short_name(name: &str) -> [u8; 11] {
    let mut raw = [b' '; 11];
    let (base, ext) = match name {
        "." | ".." => (name, ""),
        _ => name.split_once('.').unwrap_or((name, "")),
    };
    raw[..base.len()].copy_from_slice(base.as_bytes());
    raw[8..8 + ext.len()].copy_from_slice(ext.as_bytes());
    raw
}

pub fn raw_entry(name: &[u8; 11], attributes: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut raw = [0u8; 32];
    raw[..11].copy_from_slice(name);
    raw[0x0B] = attributes;
    raw[0x14..0x16].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    raw[0x1A..0x1C].copy_from_slice(&(cluster as u16).to_le_bytes());
    raw[0x1C..0x20].copy_from_slice(&size.to_le_bytes());
    raw
}

/// Deterministic, position dependent content.
pub fn content(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(seed as u32 * 7) as u8)
        .collect()
}

pub struct ImageBuilder {
    pub image: Vec<u8>,
    pub sectors_per_cluster: u8,
    next_free: u32,
}

impl ImageBuilder {
    pub fn new(sectors_per_cluster: u8) -> Self {
        let partition_sectors = RESERVED_SECTORS as u32
            + FAT_COUNT as u32 * SECTORS_PER_FAT
            + CLUSTER_COUNT * sectors_per_cluster as u32;
        let total = (PARTITION_START + partition_sectors) as usize;
        let mut builder = Self {
            image: vec![0; total * SECTOR],
            sectors_per_cluster,
            next_free: ROOT_CLUSTER + 1,
        };
        builder.set_partition(1, 0x0C, PARTITION_START, partition_sectors);
        builder.image[510..512].copy_from_slice(&[0x55, 0xAA]);

        let boot = builder.sector_mut(PARTITION_START);
        boot[..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        boot[3..11].copy_from_slice(b"MSWIN4.1");
        boot[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
        boot[0x0D] = sectors_per_cluster;
        boot[0x0E..0x10].copy_from_slice(&RESERVED_SECTORS.to_le_bytes());
        boot[0x10] = FAT_COUNT;
        boot[0x24..0x28].copy_from_slice(&SECTORS_PER_FAT.to_le_bytes());
        boot[0x2C..0x30].copy_from_slice(&ROOT_CLUSTER.to_le_bytes());
        boot[0x42] = 0x29;
        boot[0x47..0x52].copy_from_slice(b"SDCARD     ");
        boot[0x52..0x5A].copy_from_slice(b"FAT32   ");
        boot[0x1FE..].copy_from_slice(&[0x55, 0xAA]);

        builder.set_fat(0, 0x0FFF_FFF8);
        builder.set_fat(1, END_OF_CHAIN);
        builder.set_fat(ROOT_CLUSTER, END_OF_CHAIN);
        builder
    }

    /// Writes MBR slot `slot` (1 to 4).
    pub fn set_partition(&mut self, slot: usize, type_code: u8, start: u32, sectors: u32) {
        let offset = 0x1BE + (slot - 1) * 16;
        let entry = &mut self.image[offset..offset + 16];
        entry[4] = type_code;
        entry[8..12].copy_from_slice(&start.to_le_bytes());
        entry[12..16].copy_from_slice(&sectors.to_le_bytes());
    }

    pub fn sector_mut(&mut self, sector: u32) -> &mut [u8] {
        let start = sector as usize * SECTOR;
        &mut self.image[start..start + SECTOR]
    }

    pub fn cluster_sector(&self, cluster: u32) -> u32 {
        DATA_START + (cluster - 2) * self.sectors_per_cluster as u32
    }

    pub fn cluster_bytes(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR
    }

    /// Writes `value` to every FAT copy.
    pub fn set_fat(&mut self, cluster: u32, value: u32) {
        for copy in 0..FAT_COUNT as u32 {
            let sector = FAT_START + copy * SECTORS_PER_FAT + cluster / 128;
            let offset = (cluster % 128) as usize * 4;
            self.sector_mut(sector)[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn fat(&self, cluster: u32) -> u32 {
        let offset = FAT_START as usize * SECTOR + cluster as usize * 4;
        u32::from_le_bytes(self.image[offset..offset + 4].try_into().unwrap())
    }

    /// Allocates and links `count` clusters. A fragmented chain leaves a free cluster
    /// between neighbours.
    pub fn allocate(&mut self, count: usize, fragmented: bool) -> Vec<u32> {
        let mut chain = Vec::with_capacity(count);
        for _ in 0..count {
            chain.push(self.next_free);
            self.next_free += if fragmented { 2 } else { 1 };
        }
        assert!(self.next_free <= ROOT_CLUSTER + CLUSTER_COUNT, "image is full");
        for pair in chain.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(last) = chain.last() {
            self.set_fat(*last, END_OF_CHAIN);
        }
        chain
    }

    fn chain(&self, start: u32) -> Vec<u32> {
        let mut chain = vec![start];
        loop {
            let next = self.fat(*chain.last().unwrap()) & 0x0FFF_FFFF;
            if !(2..0x0FFF_FFF0).contains(&next) {
                return chain;
            }
            chain.push(next);
        }
    }

    fn write_chain(&mut self, chain: &[u32], data: &[u8]) {
        let cluster_bytes = self.cluster_bytes();
        for (cluster, chunk) in chain.iter().zip(data.chunks(cluster_bytes)) {
            let start = self.cluster_sector(*cluster) as usize * SECTOR;
            self.image[start..start + chunk.len()].copy_from_slice(chunk);
        }
    }

    /// Puts `raw` in the first free slot of `dir`, growing its chain when it is full.
    pub fn add_raw_entry(&mut self, dir: u32, raw: [u8; 32]) {
        let cluster_bytes = self.cluster_bytes();
        for cluster in self.chain(dir) {
            let start = self.cluster_sector(cluster) as usize * SECTOR;
            for slot in (start..start + cluster_bytes).step_by(32) {
                if self.image[slot] == 0x00 {
                    self.image[slot..slot + 32].copy_from_slice(&raw);
                    return;
                }
            }
        }
        let last = *self.chain(dir).last().unwrap();
        let extension = self.allocate(1, false)[0];
        self.set_fat(last, extension);
        let start = self.cluster_sector(extension) as usize * SECTOR;
        self.image[start..start + 32].copy_from_slice(&raw);
    }

    pub fn add_file(&mut self, dir: u32, name: &str, data: &[u8]) -> u32 {
        self.add_file_with(dir, name, data, false)
    }

    pub fn add_fragmented_file(&mut self, dir: u32, name: &str, data: &[u8]) -> u32 {
        self.add_file_with(dir, name, data, true)
    }

    fn add_file_with(&mut self, dir: u32, name: &str, data: &[u8], fragmented: bool) -> u32 {
        let clusters = (data.len() + self.cluster_bytes() - 1) / self.cluster_bytes();
        let chain = self.allocate(clusters, fragmented);
        self.write_chain(&chain, data);
        let start = chain.first().copied().unwrap_or(0);
        self.add_raw_entry(
            dir,
            raw_entry(&short_name(name), ATTR_ARCHIVE, start, data.len() as u32),
        );
        start
    }

    /// A subdirectory of `parent`, with its "." and ".." entries.
    pub fn add_dir(&mut self, parent: u32, name: &str) -> u32 {
        let cluster = self.allocate(1, false)[0];
        let parent_ref = if parent == ROOT_CLUSTER { 0 } else { parent };
        self.add_raw_entry(cluster, raw_entry(&short_name("."), ATTR_DIRECTORY, cluster, 0));
        self.add_raw_entry(
            cluster,
            raw_entry(&short_name(".."), ATTR_DIRECTORY, parent_ref, 0),
        );
        self.add_raw_entry(parent, raw_entry(&short_name(name), ATTR_DIRECTORY, cluster, 0));
        cluster
    }

    /// A long file name fragment. Its name bytes are UTF-16 and never match a short name.
    pub fn add_lfn(&mut self, dir: u32, sequence: u8) {
        let mut raw = raw_entry(b"\0h\0e\0l\0l\0o\0", ATTR_LFN, 0, 0);
        raw[0] = sequence;
        self.add_raw_entry(dir, raw);
    }

    pub fn add_deleted(&mut self, dir: u32, name: &str, data: &[u8]) {
        let mut raw = raw_entry(&short_name(name), ATTR_ARCHIVE, 0, data.len() as u32);
        raw[0] = 0xE5;
        self.add_raw_entry(dir, raw);
    }

    pub fn add_volume_label(&mut self, dir: u32, label: &str) {
        self.add_raw_entry(dir, raw_entry(&short_name(label), ATTR_VOLUME_ID, 0, 0));
    }

    pub fn build(self) -> Vec<u8> {
        self.image
    }
}

pub fn create_random_dir() -> PathBuf {
    let random_dir_name: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    std::env::temp_dir().join(format!("sdfat_{}", random_dir_name))
}
