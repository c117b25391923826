//! Converts between Hilbert curve indexes and N-dimensional points.
//!
//! The Hilbert index is carried in transposed form during the bit work, so
//! the core steps run on plain `u64` words and only the packed linear index
//! needs arbitrary precision.
//!
//! ```text
//! Example: 5 bits for each of n=3 coordinates.
//! 15-bit Hilbert integer = A B C D E F G H I J K L M N O is stored
//! as its transpose:
//!    x[0] = A D G J M
//!    x[1] = B E H K N
//!    x[2] = C F I L O
//!           high  low
//! ```
//!
//! The transform is derived from work done by John Skilling and published in
//! "Programming the Hilbert curve" (2004, American Institute of Physics).

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::Error;

/// Most bits per coordinate a `u64` word can carry here.
pub const MAX_BITS: u32 = 63;

/// Transform handle for a Hilbert curve of `bits` depth over `dims`
/// dimensions. All methods are pure; the struct holds no other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HilbertCurve {
    pub bits: u32,
    pub dims: usize,
}

impl HilbertCurve {
    pub fn new(bits: u32, dims: usize) -> Result<Self, Error> {
        if bits == 0 || bits > MAX_BITS {
            return Err(Error::InvalidBits(bits));
        }
        if dims == 0 {
            return Err(Error::InvalidDimensions(dims));
        }
        Ok(Self { bits, dims })
    }

    /// Width of the packed linear index in bits.
    pub fn index_bits(&self) -> u64 {
        self.bits as u64 * self.dims as u64
    }

    /// Converts a transposed index into the coordinates of the point it
    /// represents on the curve.
    ///
    /// In Skilling's paper this function is named `TransposeToAxes`.
    pub fn point(&self, transposed_index: &[u64]) -> Result<Vec<u64>, Error> {
        self.check_vector(transposed_index)?;
        let mut x = transposed_index.to_vec();
        let n = x.len();
        let top = 2u64 << (self.bits - 1);

        // Gray decode by H ^ (H/2). Skilling's appendix runs the cascade
        // down to i == 0, which indexes x[-1]; the loop stops at 1 and the
        // saved top word folds into x[0] instead.
        let t = x[n - 1] >> 1;
        for i in (1..n).rev() {
            x[i] ^= x[i - 1];
        }
        x[0] ^= t;

        // Undo excess work
        let mut q = 2u64;
        while q != top {
            let p = q - 1;
            for i in (0..n).rev() {
                if x[i] & q != 0 {
                    // invert
                    x[0] ^= p;
                } else {
                    // exchange
                    let t = (x[0] ^ x[i]) & p;
                    x[0] ^= t;
                    x[i] ^= t;
                }
            }
            q <<= 1;
        }

        Ok(x)
    }

    /// Given the coordinates of a point in N-space, finds the distance to
    /// that point along the curve, transposed into one word per dimension.
    ///
    /// In Skilling's paper this function is named `AxesToTranspose`.
    pub fn transposed_index(&self, point: &[u64]) -> Result<Vec<u64>, Error> {
        self.check_vector(point)?;
        let mut x = point.to_vec();
        let n = x.len();
        let m = 1u64 << (self.bits - 1);

        // Inverse undo
        let mut q = m;
        while q > 1 {
            let p = q - 1;
            for i in 0..n {
                if x[i] & q != 0 {
                    // invert
                    x[0] ^= p;
                } else {
                    // exchange
                    let t = (x[0] ^ x[i]) & p;
                    x[0] ^= t;
                    x[i] ^= t;
                }
            }
            q >>= 1;
        }

        // Gray encode
        for i in 1..n {
            x[i] ^= x[i - 1];
        }
        let mut t = 0u64;
        let mut q = m;
        while q > 1 {
            if x[n - 1] & q != 0 {
                t ^= q - 1;
            }
            q >>= 1;
        }
        for w in x.iter_mut() {
            *w ^= t;
        }

        Ok(x)
    }

    /// Distance along the curve to `point`, as a packed linear index.
    pub fn index(&self, point: &[u64]) -> Result<BigUint, Error> {
        let transposed = self.transposed_index(point)?;
        self.to_index(&transposed)
    }

    /// Packs a transposed index into a single integer of `bits * dims`
    /// bits: bit planes most-significant-first, each plane enumerating
    /// dimensions in declared order. The zero vector maps to zero.
    pub fn to_index(&self, transposed_index: &[u64]) -> Result<BigUint, Error> {
        self.check_vector(transposed_index)?;
        let mut acc = BigUint::zero();
        let mut mask = 1u64 << (self.bits - 1);
        for _ in 0..self.bits {
            for &w in transposed_index {
                acc <<= 1usize;
                if w & mask != 0 {
                    acc += 1u8;
                }
            }
            mask >>= 1;
        }
        Ok(acc)
    }

    /// Unpacks a linear index back into its transposed form.
    pub fn transpose(&self, index: &BigUint) -> Result<Vec<u64>, Error> {
        let width = self.index_bits();
        if index.bits() > width {
            return Err(Error::IndexOutOfRange {
                bits_required: index.bits(),
                bits_available: width,
            });
        }

        let mut x = vec![0u64; self.dims];
        let mut pos = width;
        for plane in 0..self.bits {
            let mask = 1u64 << (self.bits - 1 - plane);
            for w in x.iter_mut() {
                pos -= 1;
                if index.bit(pos) {
                    *w |= mask;
                }
            }
        }
        Ok(x)
    }

    /// Coordinates of the point at distance `index` along the curve.
    pub fn point_from_index(&self, index: &BigUint) -> Result<Vec<u64>, Error> {
        let transposed = self.transpose(index)?;
        self.point(&transposed)
    }

    fn check_vector(&self, x: &[u64]) -> Result<(), Error> {
        if x.len() != self.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims,
                actual: x.len(),
            });
        }
        let limit = 1u64 << self.bits;
        for (i, &w) in x.iter().enumerate() {
            if w >= limit {
                return Err(Error::CoordinateOutOfRange {
                    dimension: i,
                    value: w,
                    bits: self.bits,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn index_bits2_dims2() {
        let c = HilbertCurve::new(2, 2).unwrap();
        assert_eq!(c.index(&[1, 2]).unwrap(), BigUint::from(7u32));
    }

    #[test]
    fn index_bits5_dims2() {
        let c = HilbertCurve::new(5, 2).unwrap();
        assert_eq!(c.index(&[0, 16]).unwrap(), BigUint::from(256u32));
    }

    #[test]
    fn to_index_packs_planes_high_first() {
        let c = HilbertCurve::new(5, 2).unwrap();
        assert_eq!(c.to_index(&[0, 16]).unwrap(), BigUint::from(256u32));
    }

    #[test]
    fn zero_vector_maps_to_zero() {
        let c = HilbertCurve::new(5, 3).unwrap();
        assert_eq!(c.to_index(&[0, 0, 0]).unwrap(), BigUint::zero());
        assert_eq!(c.index(&[0, 0, 0]).unwrap(), BigUint::zero());
    }

    #[test]
    fn transpose_256() {
        let c = HilbertCurve::new(5, 2).unwrap();
        let ti = c.transpose(&BigUint::from(256u32)).unwrap();
        assert_eq!(ti, vec![0, 16]);
    }

    #[test]
    fn transpose_zero() {
        let c = HilbertCurve::new(5, 2).unwrap();
        let ti = c.transpose(&BigUint::zero()).unwrap();
        assert_eq!(ti, vec![0, 0]);
    }

    #[test]
    fn bits1_point_0_1() {
        let c = HilbertCurve::new(1, 2).unwrap();
        let ti = c.transposed_index(&[0, 1]).unwrap();
        assert_eq!(ti, vec![0, 1]);
        assert_eq!(c.index(&[0, 1]).unwrap(), BigUint::from(1u32));
        assert_eq!(c.transpose(&BigUint::from(1u32)).unwrap(), vec![0, 1]);
    }

    #[test]
    fn bits1_point_1_1() {
        let c = HilbertCurve::new(1, 2).unwrap();
        let ti = c.transposed_index(&[1, 1]).unwrap();
        assert_eq!(ti, vec![1, 0]);
        assert_eq!(c.index(&[1, 1]).unwrap(), BigUint::from(2u32));
        assert_eq!(c.transpose(&BigUint::from(2u32)).unwrap(), vec![1, 0]);
    }

    #[test]
    fn point_round_trips_dims2() {
        for bits in 1..=8u32 {
            let c = HilbertCurve::new(bits, 2).unwrap();
            let n = 1u64 << bits;
            for x in 0..n {
                for y in 0..n {
                    let ti = c.transposed_index(&[x, y]).unwrap();
                    let back = c.point(&ti).unwrap();
                    assert_eq!(back, vec![x, y], "bits={} point=({},{})", bits, x, y);
                }
            }
        }
    }

    #[test]
    fn point_round_trips_dims3() {
        for bits in 1..=4u32 {
            let c = HilbertCurve::new(bits, 3).unwrap();
            let n = 1u64 << bits;
            for x in 0..n {
                for y in 0..n {
                    for z in 0..n {
                        let ti = c.transposed_index(&[x, y, z]).unwrap();
                        let back = c.point(&ti).unwrap();
                        assert_eq!(back, vec![x, y, z], "bits={} point=({},{},{})", bits, x, y, z);
                    }
                }
            }
        }
    }

    #[test]
    fn point_round_trips_dims1() {
        for bits in 1..=8u32 {
            let c = HilbertCurve::new(bits, 1).unwrap();
            for x in 0..(1u64 << bits) {
                let ti = c.transposed_index(&[x]).unwrap();
                assert_eq!(c.point(&ti).unwrap(), vec![x], "bits={} x={}", bits, x);
            }
        }
    }

    #[test]
    fn index_round_trips() {
        for bits in 1..=5u32 {
            let c = HilbertCurve::new(bits, 2).unwrap();
            let n = 1u64 << bits;
            for x in 0..n {
                for y in 0..n {
                    let ti = c.transposed_index(&[x, y]).unwrap();
                    let index = c.to_index(&ti).unwrap();
                    assert_eq!(c.transpose(&index).unwrap(), ti);
                    assert_eq!(c.point_from_index(&index).unwrap(), vec![x, y]);
                }
            }
        }
    }

    #[test]
    fn every_index_is_visited_once() {
        // The curve bijects [0, 2^(bits*dims)) onto the grid.
        let bits = 3u32;
        let c = HilbertCurve::new(bits, 2).unwrap();
        let cells = 1u64 << (2 * bits);
        let mut seen = vec![false; cells as usize];
        for x in 0..(1u64 << bits) {
            for y in 0..(1u64 << bits) {
                let index = c.index(&[x, y]).unwrap();
                let slot: u64 = index.iter_u64_digits().next().unwrap_or(0);
                assert!(!seen[slot as usize]);
                seen[slot as usize] = true;
            }
        }
        assert!(seen.iter().all(|&b| b));
    }

    #[test]
    fn wide_curve_exceeds_native_width() {
        // 40 bits * 4 dims = 160-bit linear index.
        let c = HilbertCurve::new(40, 4).unwrap();
        let point = vec![(1u64 << 40) - 1; 4];
        let index = c.index(&point).unwrap();
        assert!(index.bits() > 64);
        assert_eq!(c.point_from_index(&index).unwrap(), point);
    }

    #[test]
    fn rejects_bad_bits() {
        assert_eq!(HilbertCurve::new(0, 2), Err(Error::InvalidBits(0)));
        assert_eq!(HilbertCurve::new(64, 2), Err(Error::InvalidBits(64)));
        assert_eq!(HilbertCurve::new(3, 0), Err(Error::InvalidDimensions(0)));
    }

    #[test]
    fn rejects_wrong_vector_length() {
        let c = HilbertCurve::new(4, 2).unwrap();
        assert_eq!(
            c.index(&[1, 2, 3]),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        );
    }

    #[test]
    fn rejects_out_of_domain_coordinate() {
        let c = HilbertCurve::new(4, 2).unwrap();
        assert_eq!(
            c.transposed_index(&[3, 16]),
            Err(Error::CoordinateOutOfRange { dimension: 1, value: 16, bits: 4 })
        );
    }

    #[test]
    fn rejects_oversized_index() {
        let c = HilbertCurve::new(2, 2).unwrap();
        let err = c.transpose(&BigUint::from(16u32)).unwrap_err();
        assert_eq!(
            err,
            Error::IndexOutOfRange { bits_required: 5, bits_available: 4 }
        );
    }
}
