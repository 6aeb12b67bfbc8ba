use binrw::BinRead;
use core::fmt;
use core::fmt::Debug;

use crate::const_assert_size;

pub mod attribute {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_ID: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;
    /// Long file name fragments set the whole low nibble.
    pub const LFN: u8 = READ_ONLY | HIDDEN | SYSTEM | VOLUME_ID;
}

#[derive(Copy, Clone, Default, Eq, PartialEq, BinRead)]
#[repr(transparent)]
pub struct Attributes(pub u8);

impl Attributes {
    fn matches(&self, attribute: u8) -> bool {
        self.0 & attribute == attribute
    }
    pub fn is_lfn(&self) -> bool {
        self.matches(attribute::LFN)
    }
    pub fn is_read_only(&self) -> bool {
        self.matches(attribute::READ_ONLY)
    }
    pub fn is_hidden(&self) -> bool {
        self.matches(attribute::HIDDEN)
    }
    pub fn is_system(&self) -> bool {
        self.matches(attribute::SYSTEM)
    }
    /// A volume label. Long file name fragments carry this bit too, check `is_lfn` first.
    pub fn is_volume_id(&self) -> bool {
        self.matches(attribute::VOLUME_ID)
    }
    pub fn is_directory(&self) -> bool {
        self.matches(attribute::DIRECTORY)
    }
    pub fn is_archive(&self) -> bool {
        self.matches(attribute::ARCHIVE)
    }
}

impl Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_lfn() {
            return write!(f, "Attributes(LFN)");
        }
        let flags = [
            (self.is_read_only(), "READ_ONLY"),
            (self.is_hidden(), "HIDDEN"),
            (self.is_system(), "SYSTEM"),
            (self.is_volume_id(), "VOLUME_ID"),
            (self.is_directory(), "DIRECTORY"),
            (self.is_archive(), "ARCHIVE"),
        ];
        let mut list = f.debug_list();
        for (_, name) in flags.iter().filter(|(set, _)| *set) {
            list.entry(&format_args!("{}", name));
        }
        list.finish()
    }
}

const_assert_size!(Attributes, 1);
