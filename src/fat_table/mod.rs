pub use fat_entry::FatEntry;
pub(crate) use fat_reader::next_cluster;

mod fat_entry;
mod fat_reader;
