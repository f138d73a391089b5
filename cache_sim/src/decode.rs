//! Address decomposition into tag, set index and line offset.

use serde::Serialize;

use crate::{bin::extract, common::Addr, geometry::CacheGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedAddr {
    pub tag: u32,
    pub index: u32,
    pub offset: u32,
}

impl DecodedAddr {
    pub fn decompose(addr: Addr, geometry: &CacheGeometry) -> Self {
        let bin = addr.into_inner();
        let offset_bits = geometry.offset_bits();
        let offset = extract(bin, 0..offset_bits);
        let index = raw_index(addr, geometry) % geometry.num_sets();
        let tag = extract(bin, (offset_bits + geometry.index_bits())..32);
        Self { tag, index, offset }
    }

    /// inverse of [`DecodedAddr::decompose`].
    pub fn compose(&self, geometry: &CacheGeometry) -> Addr {
        let offset_bits = geometry.offset_bits();
        let tag_shift = offset_bits + geometry.index_bits();
        let tag = if tag_shift >= 32 {
            0
        } else {
            self.tag << tag_shift
        };
        Addr::new(tag | (self.index << offset_bits) | self.offset)
    }
}

/// index window of `index_window_bits` directly above the offset, before
/// it is reduced modulo the number of sets. Truncated at bit 32.
pub fn raw_index(addr: Addr, geometry: &CacheGeometry) -> u32 {
    let start = geometry.offset_bits();
    let end = (start + geometry.index_window_bits()).min(32);
    extract(addr.into_inner(), start..end)
}
