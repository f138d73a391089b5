use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
/// 32-bit memory address, displayed as 8 zero-padded hex digits
pub struct Addr(u32);

impl Addr {
    pub fn new(v: u32) -> Self {
        Self(v)
    }
    pub fn into_inner(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl Serialize for Addr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => f.write_str("Read"),
            Operation::Write => f.write_str("Write"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Outcome {
    Hit,
    Miss,
}

impl Outcome {
    pub fn is_hit(self) -> bool {
        self == Outcome::Hit
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Hit => f.write_str("Hit"),
            Outcome::Miss => f.write_str("Miss"),
        }
    }
}

/// what happens to the age of the line matched by a hit
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitAging {
    /// the matched line becomes the most recently used (age 0)
    #[default]
    ResetOnHit,
    /// the matched line keeps the age it accumulated in the aging pass.
    /// reproduces the legacy tool, which makes replacement FIFO-like.
    KeepAge,
}

impl fmt::Display for HitAging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitAging::ResetOnHit => write!(f, "LRU (reset on hit)"),
            HitAging::KeepAge => write!(f, "legacy (age kept on hit)"),
        }
    }
}

#[derive(Default, Clone, Copy, Debug)]
pub struct SimulationOption {
    pub hit_aging: HitAging,
    /// install write-miss lines dirty instead of clean
    pub dirty_on_write_miss: bool,
}
