use core::fmt;

use crate::formats::wide::Wide32;

/// Index of a cluster in the data area, as found in directory entries and FAT rows.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ClusterId(Wide32);

impl From<ClusterId> for u32 {
    fn from(cid: ClusterId) -> Self {
        cid.0.into()
    }
}

impl From<u32> for ClusterId {
    fn from(id: u32) -> Self {
        ClusterId(id.into())
    }
}

impl ClusterId {
    pub const fn new(id: Wide32) -> Self {
        ClusterId(id)
    }

    pub fn wide(self) -> Wide32 {
        self.0
    }

    /// Zero marks a file without any allocated cluster.
    pub fn is_unallocated(self) -> bool {
        self.0.is_zero()
    }

    // Returns the high and the low part of this cluster id
    pub fn into_high_low(self) -> (u16, u16) {
        (self.0.high16(), self.0.low16())
    }

    // Builds back the clusterid from high and low parts.
    pub fn from_high_low(high: u16, low: u16) -> Self {
        let raw_bytes: [u8; 4] = [
            (high >> 8) as u8,
            (high & 0xFF) as u8,
            (low >> 8) as u8,
            (low & 0xFF) as u8,
        ];
        ClusterId(Wide32::from_be_bytes(raw_bytes))
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
