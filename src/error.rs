use snafu::prelude::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("I/O error on sector {sector}, transport status: {status}"))]
    Io { sector: u32, status: u8 },

    #[snafu(display("Master boot record is missing the 0x55 0xAA checksum"))]
    MissingBootChecksum,
    #[snafu(display("No FAT32 partition entry found"))]
    NoPartitionEntry,
    #[snafu(display("Volume sector carries no sector or cluster size"))]
    NoSectorSizeInfo,
    #[snafu(display("Unsupported sector size: {size}"))]
    UnsupportedSectorSize { size: u16 },
    #[snafu(display("Volume sector has no root directory cluster"))]
    MissingRootCluster,
    #[snafu(display("Volume sector is missing the FAT signature"))]
    MissingFatSignature,
    #[snafu(display("Failed to decode {what}"))]
    Decode { what: &'static str },

    #[snafu(display("32 bit arithmetic overflow"))]
    Overflow,
    #[snafu(display("32 bit arithmetic underflow"))]
    Underflow,

    #[snafu(display("File not found"))]
    FileNotFound,
    #[snafu(display("Directory not found"))]
    DirNotFound,
    #[snafu(display("Reached the end of the filesystem"))]
    FsEnd,
    #[snafu(display("Path component longer than an 8.3 name"))]
    FilenameTooLong,

    #[snafu(display("All file handles are in use"))]
    NoFreeHandles,

    #[snafu(display("No filesystem has been located"))]
    NoFilesystem,
    #[snafu(display("Handle {handle} is not open"))]
    BadHandle { handle: u8 },
    #[snafu(display("Seek outside of the file"))]
    InvalidSeek,
}

impl Error {
    /// The status byte reported to front ends that only understand numeric codes.
    pub fn code(&self) -> u8 {
        use Error::*;
        match self {
            NoPartitionEntry => 146,
            MissingBootChecksum => 147,
            MissingFatSignature => 148,
            MissingRootCluster => 149,
            NoSectorSizeInfo | UnsupportedSectorSize { .. } => 152,
            FileNotFound => 153,
            DirNotFound => 154,
            FsEnd => 155,
            FilenameTooLong => 158,
            NoFreeHandles => 159,
            Overflow | Underflow => 1,
            Io { .. } | Decode { .. } | NoFilesystem | BadHandle { .. } | InvalidSeek => 199,
        }
    }

    /// Lookup misses are an expected outcome of path resolution, not a fault.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound | Error::DirNotFound | Error::FsEnd | Error::FilenameTooLong
        )
    }
}
