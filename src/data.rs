//! Fixed-width record types for the serialization contract toward an
//! external page store.
//!
//! Records can be sent to and from fixed-length byte slices so a pager can
//! persist them and reconstruct identical values. No file handles live in
//! this crate; a pager owns its own files and counters.

use byteorder::{BigEndian, ByteOrder};
use num_bigint::BigUint;
use rand::Rng;

use crate::error::Error;
use crate::hilbert::HilbertCurve;
use crate::layout;

/// Encodes a packed linear index as `index_size(bits, dims)` big-endian
/// bytes, left-padded with zeros. Lexicographic order of the encoding
/// equals numeric order of the index.
pub fn index_to_bytes(index: &BigUint, bits: u32, dims: usize) -> Result<Vec<u8>, Error> {
    let width_bits = bits as u64 * dims as u64;
    if index.bits() > width_bits {
        return Err(Error::IndexOutOfRange {
            bits_required: index.bits(),
            bits_available: width_bits,
        });
    }
    let width = layout::index_size(bits, dims);
    let raw = index.to_bytes_be();
    let mut out = vec![0u8; width];
    out[width - raw.len()..].copy_from_slice(&raw);
    Ok(out)
}

pub fn index_from_bytes(slice: &[u8], bits: u32, dims: usize) -> Result<BigUint, Error> {
    let width = layout::index_size(bits, dims);
    if slice.len() != width {
        return Err(Error::TruncatedRecord {
            expected: width,
            actual: slice.len(),
        });
    }
    Ok(BigUint::from_bytes_be(slice))
}

/// Coordinates as one big-endian u64 per dimension. The same layout holds a
/// transposed index, which has the same shape as a coordinate vector.
pub fn point_to_bytes(point: &[u64]) -> Vec<u8> {
    let mut out = vec![0u8; layout::point_size(point.len())];
    for (i, &w) in point.iter().enumerate() {
        let start = i * layout::COORD_SIZE;
        BigEndian::write_u64(&mut out[start..start + layout::COORD_SIZE], w);
    }
    out
}

pub fn point_from_bytes(slice: &[u8], dims: usize) -> Result<Vec<u64>, Error> {
    let expected = layout::point_size(dims);
    if slice.len() != expected {
        return Err(Error::TruncatedRecord {
            expected,
            actual: slice.len(),
        });
    }
    let mut point = Vec::with_capacity(dims);
    for i in 0..dims {
        let start = i * layout::COORD_SIZE;
        point.push(BigEndian::read_u64(&slice[start..start + layout::COORD_SIZE]));
    }
    Ok(point)
}

/// One tree entry as an external page store would persist it: the curve
/// index the tree sorts by, plus the point it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPoint {
    pub index: BigUint,
    pub point: Vec<u64>,
}

impl IndexedPoint {
    pub fn new(index: BigUint, point: Vec<u64>) -> Self {
        Self { index, point }
    }

    /// Random in-domain point with its curve index. Test and benchmark
    /// helper; panics on invalid curve geometry.
    pub fn random(bits: u32, dims: usize) -> Self {
        let curve = HilbertCurve::new(bits, dims).expect("valid curve geometry");
        let mut rng = rand::thread_rng();
        let point: Vec<u64> = (0..dims).map(|_| rng.gen_range(0..1u64 << bits)).collect();
        let index = curve.index(&point).expect("point is in domain");
        Self { index, point }
    }

    pub fn to_vec(&self, bits: u32) -> Result<Vec<u8>, Error> {
        let dims = self.point.len();
        let mut vec = Vec::with_capacity(layout::record_size(bits, dims));
        vec.extend_from_slice(&index_to_bytes(&self.index, bits, dims)?);
        vec.extend_from_slice(&point_to_bytes(&self.point));
        assert!(vec.len() == layout::record_size(bits, dims));
        Ok(vec)
    }

    pub fn from_slice(slice: &[u8], bits: u32, dims: usize) -> Result<Self, Error> {
        let expected = layout::record_size(bits, dims);
        if slice.len() < expected {
            return Err(Error::TruncatedRecord {
                expected,
                actual: slice.len(),
            });
        }
        let split = layout::point_start(bits, dims);
        let index = index_from_bytes(&slice[layout::INDEX_START..split], bits, dims)?;
        let point = point_from_bytes(&slice[split..expected], dims)?;
        Ok(Self { index, point })
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn index_bytes_are_fixed_width_big_endian() {
        let encoded = index_to_bytes(&BigUint::from(256u32), 5, 2).unwrap();
        assert_eq!(encoded, vec![0x01, 0x00]);
        let zero = index_to_bytes(&BigUint::from(0u32), 5, 2).unwrap();
        assert_eq!(zero, vec![0x00, 0x00]);
    }

    #[test]
    fn index_bytes_order_matches_numeric_order() {
        let values = [0u32, 1, 2, 7, 255, 256, 300, 1023];
        let mut encoded: Vec<Vec<u8>> = values
            .iter()
            .map(|&v| index_to_bytes(&BigUint::from(v), 5, 2).unwrap())
            .collect();
        let sorted = encoded.clone();
        encoded.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn index_bytes_round_trip() {
        for v in [0u32, 1, 500, 1023] {
            let index = BigUint::from(v);
            let encoded = index_to_bytes(&index, 5, 2).unwrap();
            assert_eq!(index_from_bytes(&encoded, 5, 2).unwrap(), index);
        }
    }

    #[test]
    fn index_bytes_reject_an_oversized_value() {
        let err = index_to_bytes(&BigUint::from(1024u32), 5, 2).unwrap_err();
        assert_eq!(
            err,
            Error::IndexOutOfRange { bits_required: 11, bits_available: 10 }
        );
    }

    #[test]
    fn point_bytes_round_trip() {
        let point = vec![3u64, 1 << 40, u64::MAX];
        let encoded = point_to_bytes(&point);
        assert_eq!(encoded.len(), 24);
        assert_eq!(point_from_bytes(&encoded, 3).unwrap(), point);
    }

    #[test]
    fn record_round_trip() {
        let record = IndexedPoint::new(BigUint::from(256u32), vec![0, 16]);
        let bytes = record.to_vec(5).unwrap();
        assert_eq!(bytes.len(), layout::record_size(5, 2));
        let parsed = IndexedPoint::from_slice(&bytes, 5, 2).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn random_records_round_trip() {
        for _ in 0..50 {
            let record = IndexedPoint::random(7, 3);
            let bytes = record.to_vec(7).unwrap();
            let parsed = IndexedPoint::from_slice(&bytes, 7, 3).unwrap();
            assert_eq!(parsed, record);
        }
    }

    #[test]
    fn truncated_record_is_rejected() {
        let record = IndexedPoint::new(BigUint::from(7u32), vec![1, 2]);
        let bytes = record.to_vec(2).unwrap();
        let err = IndexedPoint::from_slice(&bytes[..bytes.len() - 1], 2, 2).unwrap_err();
        assert_eq!(
            err,
            Error::TruncatedRecord { expected: 17, actual: 16 }
        );
    }
}
