use core::fmt;

use crate::error::{OverflowSnafu, Result, UnderflowSnafu};

/// An unsigned 32 bit value stored as 4 bytes, most significant byte first.
///
/// Every operation works byte by byte, the way the target's 8 bit ALU would,
/// and reports carries escaping the top byte instead of wrapping around.
/// Because the most significant byte comes first, the derived ordering is
/// the numeric ordering.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Wide32([u8; 4]);

impl Wide32 {
    pub const ZERO: Wide32 = Wide32([0; 4]);
    pub const ONE: Wide32 = Wide32([0, 0, 0, 1]);
    pub const MAX: Wide32 = Wide32([0xFF; 4]);

    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Wide32(bytes)
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    pub const fn from_u8(value: u8) -> Self {
        Wide32([0, 0, 0, value])
    }

    pub const fn from_u16(value: u16) -> Self {
        Wide32([0, 0, (value >> 8) as u8, (value & 0xFF) as u8])
    }

    /// The 16 least significant bits.
    pub fn low16(self) -> u16 {
        ((self.0[2] as u16) << 8) | self.0[3] as u16
    }

    /// The 16 most significant bits.
    pub fn high16(self) -> u16 {
        ((self.0[0] as u16) << 8) | self.0[1] as u16
    }

    pub fn low_byte(self) -> u8 {
        self.0[3]
    }

    pub fn is_zero(self) -> bool {
        self.0 == [0; 4]
    }

    /// Adds with carry propagation from the least significant byte.
    /// The flag is set if a carry escapes the top byte.
    pub fn overflowing_add(self, rhs: Wide32) -> (Wide32, bool) {
        let mut result = [0u8; 4];
        let mut carry = 0u16;
        for pos in (0..4).rev() {
            let sum = self.0[pos] as u16 + rhs.0[pos] as u16 + carry;
            result[pos] = (sum & 0xFF) as u8;
            carry = sum >> 8;
        }
        (Wide32(result), carry != 0)
    }

    /// Subtracts with borrow propagation. On underflow the result is zero.
    pub fn overflowing_sub(self, rhs: Wide32) -> (Wide32, bool) {
        if self < rhs {
            return (Wide32::ZERO, true);
        }
        let mut result = [0u8; 4];
        let mut borrow = 0i16;
        for pos in (0..4).rev() {
            let mut diff = self.0[pos] as i16 - rhs.0[pos] as i16 - borrow;
            if diff < 0 {
                diff += 0x100;
                borrow = 1;
            } else {
                borrow = 0;
            }
            result[pos] = diff as u8;
        }
        (Wide32(result), false)
    }

    /// Schoolbook multiplication by a single byte.
    pub fn overflowing_mul_small(self, scalar: u8) -> (Wide32, bool) {
        let mut result = [0u8; 4];
        let mut carry = 0u16;
        for pos in (0..4).rev() {
            let product = self.0[pos] as u16 * scalar as u16 + carry;
            result[pos] = (product & 0xFF) as u8;
            carry = product >> 8;
        }
        (Wide32(result), carry != 0)
    }

    /// Divides by `2^shift`, dropping the remainder.
    pub fn shr(self, shift: u8) -> Wide32 {
        if shift >= 32 {
            return Wide32::ZERO;
        }
        let byte_shift = (shift / 8) as usize;
        let bit_shift = shift % 8;
        let mut result = [0u8; 4];
        for pos in (byte_shift..4).rev() {
            let src = pos - byte_shift;
            let mut byte = self.0[src] >> bit_shift;
            if bit_shift != 0 && src > 0 {
                byte |= self.0[src - 1] << (8 - bit_shift);
            }
            result[pos] = byte;
        }
        Wide32(result)
    }

    /// Increments in place. Returns true if the value wrapped to zero.
    pub fn increment(&mut self) -> bool {
        for pos in (0..4).rev() {
            let (byte, carry) = self.0[pos].overflowing_add(1);
            self.0[pos] = byte;
            if !carry {
                return false;
            }
        }
        true
    }

    /// Decrements in place. Returns true if the value wrapped from zero.
    pub fn decrement(&mut self) -> bool {
        for pos in (0..4).rev() {
            let (byte, borrow) = self.0[pos].overflowing_sub(1);
            self.0[pos] = byte;
            if !borrow {
                return false;
            }
        }
        true
    }

    pub fn checked_add(self, rhs: Wide32) -> Result<Wide32> {
        match self.overflowing_add(rhs) {
            (_, true) => OverflowSnafu.fail(),
            (sum, false) => Ok(sum),
        }
    }

    pub fn checked_sub(self, rhs: Wide32) -> Result<Wide32> {
        match self.overflowing_sub(rhs) {
            (_, true) => UnderflowSnafu.fail(),
            (diff, false) => Ok(diff),
        }
    }

    pub fn checked_mul_small(self, scalar: u8) -> Result<Wide32> {
        match self.overflowing_mul_small(scalar) {
            (_, true) => OverflowSnafu.fail(),
            (product, false) => Ok(product),
        }
    }
}

impl From<u32> for Wide32 {
    fn from(value: u32) -> Self {
        Wide32(value.to_be_bytes())
    }
}

impl From<Wide32> for u32 {
    fn from(value: Wide32) -> Self {
        u32::from_be_bytes(value.0)
    }
}

impl fmt::Display for Wide32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u32::from(*self))
    }
}

impl fmt::Debug for Wide32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wide32({:02x}{:02x}{:02x}{:02x})",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}
