//! Static cache dimensions and the bit widths derived from them.

use std::fmt;

use serde::Serialize;

use crate::{bin::log2, config::ConfigError};

/// Immutable after construction; every dimension is a power of two and
/// `num_sets * associativity * line_size == total_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    associativity: u32,
    line_size: u32,
    total_size: u32,
    num_sets: u32,
    offset_bits: u32,
    index_bits: u32,
    index_window_bits: u32,
    tag_bits: u32,
}

impl CacheGeometry {
    pub fn new(associativity: u32, line_size: u32, total_size: u32) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("associativity", associativity),
            ("line size", line_size),
            ("total size", total_size),
        ] {
            if !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { name, value });
            }
        }
        let set_bytes = associativity as u64 * line_size as u64;
        if total_size as u64 % set_bytes != 0 || (total_size as u64) < set_bytes {
            return Err(ConfigError::NotDivisible {
                total_size,
                set_bytes,
            });
        }
        let num_sets = (total_size as u64 / set_bytes) as u32;
        let offset_bits = log2(line_size);
        let index_bits = log2(num_sets);
        // raw window read before the set number is reduced modulo `num_sets`
        let index_window_bits = log2(total_size);
        // legacy formula; equal to `32 - offset_bits - index_bits`
        let tag_bits = 32 - index_window_bits + log2(associativity);
        debug_assert_eq!(tag_bits, 32 - offset_bits - index_bits);
        Ok(Self {
            associativity,
            line_size,
            total_size,
            num_sets,
            offset_bits,
            index_bits,
            index_window_bits,
            tag_bits,
        })
    }
    pub fn associativity(&self) -> u32 {
        self.associativity
    }
    pub fn line_size(&self) -> u32 {
        self.line_size
    }
    pub fn total_size(&self) -> u32 {
        self.total_size
    }
    pub fn num_sets(&self) -> u32 {
        self.num_sets
    }
    pub fn num_lines(&self) -> u32 {
        self.num_sets * self.associativity
    }
    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }
    /// width of the effective set index, `log2(num_sets)`
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }
    /// width of the index window before the modulo, `log2(total_size)`
    pub fn index_window_bits(&self) -> u32 {
        self.index_window_bits
    }
    pub fn tag_bits(&self) -> u32 {
        self.tag_bits
    }
}

impl fmt::Display for CacheGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-way, {}B lines, {}B total, {} sets (tag {} / index {} / offset {} bits)",
            self.associativity,
            self.line_size,
            self.total_size,
            self.num_sets,
            self.tag_bits,
            self.index_bits,
            self.offset_bits
        )
    }
}
