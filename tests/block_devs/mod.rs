pub mod array_blockdev;

pub use array_blockdev::ArrayBackedBlockDevice;
