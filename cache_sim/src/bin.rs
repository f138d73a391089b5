use std::ops::Range;

/// mask with bits `r.start..r.end` set (LSB is bit 0, end exclusive).
#[inline]
pub const fn bit_range(r: Range<u32>) -> u32 {
    if r.start >= r.end || r.start >= 32 {
        return 0;
    }
    let upper: u32 = if r.end >= 32 {
        u32::MAX
    } else {
        (1 << r.end) - 1
    };
    upper & !((1 << r.start) - 1)
}

#[inline]
pub const fn mask(bin: u32, r: Range<u32>) -> u32 {
    bin & bit_range(r)
}

/// extracts bits `r` of `bin` as an unsigned integer.
#[inline]
pub const fn extract(bin: u32, r: Range<u32>) -> u32 {
    let start = r.start;
    if start >= 32 {
        return 0;
    }
    mask(bin, r) >> start
}

/// `log2` of a power of two.
#[inline]
pub const fn log2(v: u32) -> u32 {
    v.trailing_zeros()
}
