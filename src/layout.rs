//! Byte layout for the fixed-width records handed to an external page store.
//!
//! One entry record is the packed linear index followed by the point's
//! coordinates, all big-endian:
//!
//! ```text
//! | index: ceil(bits * dims / 8) bytes | coord 0: 8 bytes | ... | coord dims-1 |
//! ```
//!
//! The index field is left-padded, so comparing index fields as raw bytes
//! orders records by curve position.

/// Each coordinate is one big-endian u64.
pub const COORD_SIZE: usize = 8;

pub const INDEX_START: usize = 0;

/// Width in bytes of a packed linear index of `bits * dims` bits.
pub fn index_size(bits: u32, dims: usize) -> usize {
    (bits as usize * dims + 7) / 8
}

pub fn point_start(bits: u32, dims: usize) -> usize {
    INDEX_START + index_size(bits, dims)
}

pub fn point_size(dims: usize) -> usize {
    dims * COORD_SIZE
}

pub fn record_size(bits: u32, dims: usize) -> usize {
    point_start(bits, dims) + point_size(dims)
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn index_width_rounds_up_to_bytes() {
        assert_eq!(index_size(2, 2), 1);
        assert_eq!(index_size(5, 2), 2);
        assert_eq!(index_size(8, 3), 3);
        assert_eq!(index_size(63, 4), 32);
    }

    #[test]
    fn record_fields_are_adjacent() {
        assert_eq!(point_start(5, 2), 2);
        assert_eq!(record_size(5, 2), 2 + 16);
    }
}
