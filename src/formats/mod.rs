pub mod cluster_id;
pub mod endian;
pub mod path;
pub mod sector_id;
pub mod wide;
