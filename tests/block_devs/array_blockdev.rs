use std::cell::Cell;
use std::rc::Rc;

use sdfat::{BlockDevice, CardType, TransportError, SECTOR_SIZE};

/// A card held in memory. Reads are counted, and one sector can be made to fail.
pub struct ArrayBackedBlockDevice {
    pub arr: Vec<u8>,
    pub reads: Rc<Cell<usize>>,
    pub failing_sector: Rc<Cell<Option<u32>>>,
    pub card_type: CardType,
}

impl ArrayBackedBlockDevice {
    pub const READ_ERROR: TransportError = TransportError(62);

    pub fn new(arr: Vec<u8>) -> Self {
        Self {
            arr,
            reads: Rc::new(Cell::new(0)),
            failing_sector: Rc::new(Cell::new(None)),
            card_type: CardType::SectorAddressed,
        }
    }

    fn range(low: u16, high: u16) -> (u32, std::ops::Range<usize>) {
        let sector = ((high as u32) << 16) | low as u32;
        let start = sector as usize * SECTOR_SIZE;
        (sector, start..start + SECTOR_SIZE)
    }
}

impl BlockDevice for ArrayBackedBlockDevice {
    fn card_type(&self) -> CardType {
        self.card_type
    }

    fn read_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &mut [u8; SECTOR_SIZE],
    ) -> Result<(), TransportError> {
        let (sector, range) = Self::range(low, high);
        if self.failing_sector.get() == Some(sector) {
            return Err(Self::READ_ERROR);
        }
        let data = self.arr.get(range).ok_or(Self::READ_ERROR)?;
        buf.copy_from_slice(data);
        self.reads.set(self.reads.get() + 1);
        Ok(())
    }

    fn write_sector(
        &mut self,
        low: u16,
        high: u16,
        buf: &[u8; SECTOR_SIZE],
    ) -> Result<(), TransportError> {
        let (_, range) = Self::range(low, high);
        self.arr
            .get_mut(range)
            .ok_or(TransportError(64))?
            .copy_from_slice(buf);
        Ok(())
    }

    fn get_canonical_name() -> &'static str
    where
        Self: Sized,
    {
        "ArrayBackedBlockDevice"
    }
}
