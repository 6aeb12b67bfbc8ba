//! On-disk FAT fields are little-endian, `Wide32` is most significant byte first.

use crate::formats::wide::Wide32;

pub fn swap16(field: &mut [u8; 2]) {
    field.swap(0, 1);
}

pub fn swap32(field: &mut [u8; 4]) {
    field.swap(0, 3);
    field.swap(1, 2);
}

/// Decodes a little-endian 16 bit field.
pub fn le16(mut raw: [u8; 2]) -> u16 {
    swap16(&mut raw);
    ((raw[0] as u16) << 8) | raw[1] as u16
}

/// Decodes a little-endian 32 bit field.
pub fn le32(mut raw: [u8; 4]) -> Wide32 {
    swap32(&mut raw);
    Wide32::from_be_bytes(raw)
}
