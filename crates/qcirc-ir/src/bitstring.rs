//! Fixed-width classical bit patterns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed-width bit pattern. Bit `i` is the `i`-th bit of the register,
/// so `from_int` is little-endian.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString {
    bits: Vec<bool>,
}

impl BitString {
    /// Create an all-zero pattern of `len` bits.
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Encode `value` into `len` bits, least significant bit first.
    ///
    /// Bits of `value` beyond `len` are dropped.
    pub fn from_int(len: usize, value: u64) -> Self {
        let bits = (0..len)
            .map(|i| i < 64 && (value >> i) & 1 == 1)
            .collect();
        Self { bits }
    }

    /// Create a pattern from explicit bits.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Decode as an integer, or `None` if a set bit does not fit in `u64`.
    pub fn to_int(&self) -> Option<u64> {
        let mut value = 0u64;
        for (i, bit) in self.bits.iter().enumerate() {
            if *bit {
                if i >= 64 {
                    return None;
                }
                value |= 1 << i;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian() {
        let bs = BitString::from_int(4, 0b0110);
        assert_eq!(bs.bits(), &[false, true, true, false]);
        assert_eq!(bs.to_string(), "0110");
        assert_eq!(bs.to_int(), Some(6));
    }

    #[test]
    fn test_truncates_to_width() {
        let bs = BitString::from_int(2, 7);
        assert_eq!(bs.to_int(), Some(3));
        assert_eq!(BitString::zeros(3).to_int(), Some(0));
    }
}
