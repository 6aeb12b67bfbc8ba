use core::fmt;

use crate::formats::wide::Wide32;
use crate::Result;

/// The sector's absolute index on the block device.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SectorId(pub Wide32);

impl From<u32> for SectorId {
    fn from(v: u32) -> Self {
        SectorId(v.into())
    }
}

impl From<SectorId> for u32 {
    fn from(sector: SectorId) -> Self {
        sector.0.into()
    }
}

impl SectorId {
    pub fn wide(self) -> Wide32 {
        self.0
    }

    /// The address halves expected by the block transport: `(low, high)`.
    pub fn split(self) -> (u16, u16) {
        (self.0.low16(), self.0.high16())
    }

    pub fn checked_add(self, rhs: Wide32) -> Result<SectorId> {
        self.0.checked_add(rhs).map(SectorId)
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
