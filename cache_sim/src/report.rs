//! Human readable rendering of a finished simulation.

use std::fmt;

use crate::{
    cache::CacheModel,
    sim::{SimOutput, Summary},
};

/// geometry header, one row per reference, then the summary
pub struct Report<'a> {
    output: &'a SimOutput,
}

impl<'a> Report<'a> {
    pub fn new(output: &'a SimOutput) -> Self {
        Self { output }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.output.geometry;
        writeln!(f, "Total Cache Size:  {}B", g.total_size())?;
        writeln!(f, "Line Size:  {}B", g.line_size())?;
        writeln!(f, "Set Size:  {}", g.associativity())?;
        writeln!(f, "Number of Sets:  {}", g.num_sets())?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<8}{:<8}{:<10}{:>9}{:>8}{:>8}   {}",
            "RefNum", "R/W", "Address", "Tag", "Index", "Offset", "H/M"
        )?;
        writeln!(f, "{:*<64}", "")?;
        for (i, r) in self.output.records.iter().enumerate() {
            writeln!(
                f,
                "{i:<8}{:<8}{:<10}{:>9x}{:>8x}{:>8}   {}",
                r.entry.op.to_string(),
                r.entry.addr.to_string(),
                r.decoded.tag,
                r.decoded.index,
                r.decoded.offset,
                r.outcome
            )?;
        }
        writeln!(f)?;
        write!(f, "{}", SummaryView(&self.output.summary))
    }
}

struct SummaryView<'a>(&'a Summary);

impl fmt::Display for SummaryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        writeln!(f, "    Simulation Summary")?;
        writeln!(f, "{:*<26}", "")?;
        writeln!(f, "Total Hits:\t{}", s.hits)?;
        writeln!(f, "Total Misses:\t{}", s.misses())?;
        match (s.hit_rate(), s.miss_rate()) {
            (Some(hit), Some(miss)) => {
                writeln!(f, "Hit Rate:\t{hit:.5}")?;
                writeln!(f, "Miss Rate:\t{miss:.5}")
            }
            _ => writeln!(f, "no accesses recorded"),
        }
    }
}

/// final contents of every valid slot
pub struct CacheDump<'a> {
    model: &'a CacheModel,
}

impl<'a> CacheDump<'a> {
    pub fn new(model: &'a CacheModel) -> Self {
        Self { model }
    }
}

impl fmt::Display for CacheDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8}{:>6}{:>10}{:>8}  {}", "Set", "Way", "Tag", "Age", "Dirty")?;
        for (index, set) in self.model.sets().iter().enumerate() {
            for (way, line) in set.lines() {
                writeln!(
                    f,
                    "{index:>8x}{way:>6}{:>10x}{:>8}  {}",
                    line.tag(),
                    line.age(),
                    if line.is_dirty() { "yes" } else { "no" }
                )?;
            }
        }
        Ok(())
    }
}
