//! Utilities for working with raw byte units.

use core::fmt;

/// `1 KiB`
pub const KIB: usize = 1 << 10;
/// `1 MiB`
pub const MIB: usize = 1 << 20;
/// `1 GiB`
pub const GIB: usize = 1 << 30;
/// `1 TiB`
pub const TIB: usize = 1 << 40;

/// Wrapper around a raw byte count that pretty-prints
/// it using the [`Display`](core::fmt::Display)
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteUnit(pub usize);

/// Wrap the number of bytes taken up by `frames` page frames.
pub fn frames(frames: usize) -> ByteUnit {
    ByteUnit(frames.saturating_mul(crate::mem::PAGE_SIZE))
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0 as f64;

        match self.0 {
            0..KIB => write!(f, "{} B", self.0),
            KIB..MIB => write!(f, "{:.2} KiB", count / KIB as f64),
            MIB..GIB => write!(f, "{:.2} MiB", count / MIB as f64),
            GIB..TIB => write!(f, "{:.2} GiB", count / GIB as f64),
            _ => write!(f, "{:.2} TiB", count / TIB as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_the_largest_fitting_unit() {
        assert_eq!(ByteUnit(512).to_string(), "512 B");
        assert_eq!(ByteUnit(4 * KIB).to_string(), "4.00 KiB");
        assert_eq!(ByteUnit(3 * MIB / 2).to_string(), "1.50 MiB");
        assert_eq!(ByteUnit(2 * GIB).to_string(), "2.00 GiB");
        assert_eq!(frames(256).to_string(), "1.00 MiB");
    }
}
