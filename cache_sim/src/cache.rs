//! Set-associative cache with LRU replacement, write-back and
//! write-allocate.

use serde::Serialize;

use crate::{
    common::{HitAging, Operation, Outcome, SimulationOption},
    decode::DecodedAddr,
    geometry::CacheGeometry,
    set::{CacheLine, CacheSet},
};

#[cfg(feature = "stat")]
use crate::stat::{AddStats, Stats};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    pub accesses: u64,
    pub hits: u64,
    pub reads: u64,
    pub read_hits: u64,
    pub writes: u64,
    pub write_hits: u64,
    pub evictions: u64,
    /// evictions of lines that would have been written back
    pub dirty_evictions: u64,
}

impl CacheCounters {
    pub fn misses(&self) -> u64 {
        self.accesses - self.hits
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SetCounters {
    pub accesses: u64,
    pub misses: u64,
}

pub struct CacheModel {
    geometry: CacheGeometry,
    sets: Vec<CacheSet>,
    option: SimulationOption,
    counters: CacheCounters,
    set_counters: Vec<SetCounters>,
}

impl CacheModel {
    pub fn new(geometry: CacheGeometry, option: SimulationOption) -> Self {
        let num_sets = geometry.num_sets() as usize;
        let associativity = geometry.associativity() as usize;
        Self {
            geometry,
            sets: (0..num_sets).map(|_| CacheSet::new(associativity)).collect(),
            option,
            counters: Default::default(),
            set_counters: vec![Default::default(); num_sets],
        }
    }

    pub fn read(&mut self, addr: &DecodedAddr) -> Outcome {
        self.access(Operation::Read, addr)
    }

    pub fn write(&mut self, addr: &DecodedAddr) -> Outcome {
        self.access(Operation::Write, addr)
    }

    /// Ages the set, then either updates the matching line or allocates
    /// a new one, evicting the oldest line of a full set.
    pub fn access(&mut self, op: Operation, addr: &DecodedAddr) -> Outcome {
        let index = addr.index as usize;
        let set = &mut self.sets[index];
        set.age_all();

        let outcome = match set.find_line(addr.tag).and_then(|slot| set.line_mut(slot)) {
            Some(line) => {
                if op == Operation::Write {
                    line.set_dirty();
                }
                if self.option.hit_aging == HitAging::ResetOnHit {
                    line.reset_age();
                }
                Outcome::Hit
            }
            None => {
                let mut line = CacheLine::new(addr.tag);
                if op == Operation::Write && self.option.dirty_on_write_miss {
                    line.set_dirty();
                }
                if set.is_full() {
                    let slot = set.oldest_valid_slot();
                    if let Some(evicted) = set.replace(slot, line) {
                        log::trace!(
                            "set {index:#x}: evicted tag {:#x} from way {slot}{}",
                            evicted.tag(),
                            if evicted.is_dirty() { " (dirty)" } else { "" }
                        );
                        self.counters.evictions += 1;
                        if evicted.is_dirty() {
                            self.counters.dirty_evictions += 1;
                        }
                    }
                } else {
                    let inserted = set.insert_first_free(line);
                    debug_assert!(inserted);
                }
                Outcome::Miss
            }
        };

        self.count(op, index, outcome);
        log::debug!(
            "{op} index {index:#x} tag {:#x} offset {}: {outcome}",
            addr.tag,
            addr.offset
        );
        outcome
    }

    fn count(&mut self, op: Operation, index: usize, outcome: Outcome) {
        let hit = outcome.is_hit() as u64;
        let c = &mut self.counters;
        c.accesses += 1;
        c.hits += hit;
        match op {
            Operation::Read => {
                c.reads += 1;
                c.read_hits += hit;
            }
            Operation::Write => {
                c.writes += 1;
                c.write_hits += hit;
            }
        }
        let s = &mut self.set_counters[index];
        s.accesses += 1;
        s.misses += 1 - hit;
    }

    /// resident line for `addr`, without touching replacement state.
    pub fn probe(&self, addr: &DecodedAddr) -> Option<&CacheLine> {
        let set = self.sets.get(addr.index as usize)?;
        set.find_line(addr.tag).and_then(|slot| set.line(slot))
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }
    pub fn option(&self) -> &SimulationOption {
        &self.option
    }
    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }
    pub fn access_count(&self) -> u64 {
        self.counters.accesses
    }
    pub fn hit_count(&self) -> u64 {
        self.counters.hits
    }
    pub fn miss_count(&self) -> u64 {
        self.counters.misses()
    }
    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }
    pub fn set_counters(&self) -> &[SetCounters] {
        &self.set_counters
    }
}

#[cfg(feature = "stat")]
impl AddStats for CacheModel {
    fn add_stats(&self, buf: &mut Stats) {
        buf.push(Box::new(stat::CacheStat {
            counters: self.counters,
            hit_aging: self.option.hit_aging,
        }));
        buf.push(Box::new(stat::SetStat {
            sets: self.set_counters.clone(),
        }));
    }
}

#[cfg(feature = "stat")]
mod stat {
    use std::fmt;

    use super::{CacheCounters, SetCounters};
    use crate::{common::HitAging, stat::*};

    pub struct CacheStat {
        pub counters: CacheCounters,
        pub hit_aging: HitAging,
    }

    impl Stat for CacheStat {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(self)
        }
    }

    impl StatView for &'_ CacheStat {
        fn header(&self) -> &'static str {
            "cache stat"
        }
        fn width(&self) -> usize {
            40
        }
    }

    impl fmt::Display for &'_ CacheStat {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let c = &self.counters;
            writeln!(f, "  replacement: {:>25}", self.hit_aging.to_string())?;
            writeln!(f, "  {:>13}: {:>11} /{:>11}", "hit / access", c.hits, c.accesses)?;
            writeln!(f, "  {:>13}: {:>11} /{:>11}", "read", c.read_hits, c.reads)?;
            writeln!(f, "  {:>13}: {:>11} /{:>11}", "write", c.write_hits, c.writes)?;
            write!(
                f,
                "  {:>13}: {:>11} /{:>11}",
                "dirty / evict", c.dirty_evictions, c.evictions
            )
        }
    }

    pub struct SetStat {
        pub sets: Vec<SetCounters>,
    }

    /// one entry of the per-set table: `index: misses/accesses`
    const ENTRY_WIDTH: usize = 24;

    impl Width for SetStat {
        fn width_by_chunk_size(chunk_size: usize) -> usize {
            chunk_size * ENTRY_WIDTH
        }
    }

    impl Stat for SetStat {
        fn view(&self, max_width: usize) -> Box<dyn StatView + '_> {
            Box::new(SetStatView {
                stat: self,
                chunk_size: SetStat::chunk_size(max_width),
            })
        }
    }

    struct SetStatView<'a> {
        stat: &'a SetStat,
        chunk_size: usize,
    }

    impl StatView for SetStatView<'_> {
        fn header(&self) -> &'static str {
            "per-set misses / accesses"
        }
        fn width(&self) -> usize {
            SetStat::width_by_chunk_size(self.chunk_size)
        }
    }

    impl fmt::Display for SetStatView<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let rows = self.stat.sets.chunks(self.chunk_size).enumerate();
            let last = self.stat.sets.len().div_ceil(self.chunk_size).saturating_sub(1);
            for (row, chunk) in rows {
                for (i, s) in chunk.iter().enumerate() {
                    let index = row * self.chunk_size + i;
                    let cell = format!("{}/{}", s.misses, s.accesses);
                    write!(f, "  {index:>#6x}: {cell:<14}")?;
                }
                if row != last {
                    writeln!(f)?;
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Addr;

    fn model(assoc: u32, line: u32, total: u32, option: SimulationOption) -> CacheModel {
        CacheModel::new(CacheGeometry::new(assoc, line, total).unwrap(), option)
    }

    fn decode(m: &CacheModel, addr: u32) -> DecodedAddr {
        DecodedAddr::decompose(Addr::new(addr), m.geometry())
    }

    fn run(m: &mut CacheModel, refs: &[(Operation, u32)]) -> Vec<Outcome> {
        refs.iter()
            .map(|&(op, addr)| {
                let d = decode(m, addr);
                m.access(op, &d)
            })
            .collect()
    }

    use Operation::*;
    use Outcome::*;

    #[test]
    fn test_direct_mapped_conflict() {
        let mut m = model(1, 4, 16, Default::default());
        let r = run(&mut m, &[(Read, 0x00), (Read, 0x10), (Read, 0x00)]);
        assert_eq!(r, vec![Miss, Miss, Miss]);
        assert_eq!(m.hit_count(), 0);
        assert_eq!(m.access_count(), 3);
        assert_eq!(m.counters().evictions, 2);
    }
    #[test]
    fn test_repeat_read_hits() {
        let mut m = model(1, 4, 16, Default::default());
        let r = run(&mut m, &[(Read, 0x00), (Read, 0x00)]);
        assert_eq!(r, vec![Miss, Hit]);
        assert_eq!(m.hit_count(), 1);
        assert_eq!(m.access_count(), 2);
        assert_eq!(m.miss_count(), 1);
    }
    #[test]
    fn test_same_line_different_offset_hits() {
        let mut m = model(2, 16, 128, Default::default());
        let r = run(&mut m, &[(Read, 0x100), (Write, 0x10F), (Read, 0x104)]);
        assert_eq!(r, vec![Miss, Hit, Hit]);
    }
    #[test]
    fn test_write_hit_sets_dirty() {
        let mut m = model(1, 4, 16, Default::default());
        let r = run(&mut m, &[(Write, 0x8), (Write, 0x8)]);
        assert_eq!(r, vec![Miss, Hit]);
        let line = m.probe(&decode(&m, 0x8)).unwrap();
        assert!(line.is_dirty());
    }
    #[test]
    fn test_write_miss_installs_clean_line() {
        let mut m = model(1, 4, 16, Default::default());
        let r = run(&mut m, &[(Write, 0x8), (Read, 0x8)]);
        assert_eq!(r, vec![Miss, Hit]);
        let line = m.probe(&decode(&m, 0x8)).unwrap();
        assert!(!line.is_dirty());
    }
    #[test]
    fn test_write_miss_dirty_when_enabled() {
        let option = SimulationOption {
            dirty_on_write_miss: true,
            ..Default::default()
        };
        let mut m = model(1, 4, 16, option);
        let r = run(&mut m, &[(Write, 0x8), (Read, 0x8)]);
        assert_eq!(r, vec![Miss, Hit]);
        let line = m.probe(&decode(&m, 0x8)).unwrap();
        assert!(line.is_dirty());
    }
    #[test]
    fn test_read_hit_keeps_clean() {
        let mut m = model(2, 4, 32, Default::default());
        run(&mut m, &[(Read, 0x0), (Read, 0x0)]);
        assert!(!m.probe(&decode(&m, 0x0)).unwrap().is_dirty());
    }
    #[test]
    fn test_dirty_eviction_counted() {
        let mut m = model(1, 4, 16, Default::default());
        run(&mut m, &[(Read, 0x0), (Write, 0x0), (Read, 0x10), (Read, 0x0)]);
        let c = m.counters();
        assert_eq!(c.evictions, 2);
        assert_eq!(c.dirty_evictions, 1);
        assert_eq!(c.writes, 1);
        assert_eq!(c.write_hits, 1);
        assert_eq!(c.reads, 3);
        assert_eq!(c.read_hits, 0);
    }
    #[test]
    fn test_lru_evicts_least_recently_used() {
        // 2-way, single set: A B A C -> B is least recently used
        let mut m = model(2, 4, 8, Default::default());
        let r = run(&mut m, &[(Read, 0x00), (Read, 0x10), (Read, 0x00), (Read, 0x20)]);
        assert_eq!(r, vec![Miss, Miss, Hit, Miss]);
        assert!(m.probe(&decode(&m, 0x00)).is_some());
        assert!(m.probe(&decode(&m, 0x10)).is_none());
        assert!(m.probe(&decode(&m, 0x20)).is_some());
    }
    #[test]
    fn test_keep_age_evicts_first_inserted() {
        // same sequence, but the hit on A does not refresh it
        let option = SimulationOption {
            hit_aging: HitAging::KeepAge,
            ..Default::default()
        };
        let mut m = model(2, 4, 8, option);
        let r = run(&mut m, &[(Read, 0x00), (Read, 0x10), (Read, 0x00), (Read, 0x20)]);
        assert_eq!(r, vec![Miss, Miss, Hit, Miss]);
        assert!(m.probe(&decode(&m, 0x00)).is_none());
        assert!(m.probe(&decode(&m, 0x10)).is_some());
        assert!(m.probe(&decode(&m, 0x20)).is_some());
    }
    #[test]
    fn test_keep_age_grows_on_hits() {
        let option = SimulationOption {
            hit_aging: HitAging::KeepAge,
            ..Default::default()
        };
        let mut m = model(2, 4, 8, option);
        run(&mut m, &[(Read, 0x0), (Read, 0x0), (Read, 0x0), (Read, 0x0)]);
        assert_eq!(m.probe(&decode(&m, 0x0)).unwrap().age(), 3);

        let mut m = model(2, 4, 8, Default::default());
        run(&mut m, &[(Read, 0x0), (Read, 0x0), (Read, 0x0), (Read, 0x0)]);
        assert_eq!(m.probe(&decode(&m, 0x0)).unwrap().age(), 0);
    }
    #[test]
    fn test_sets_are_independent() {
        // 1-way, 4 sets: different indices never evict each other
        let mut m = model(1, 4, 16, Default::default());
        let r = run(
            &mut m,
            &[(Read, 0x0), (Read, 0x4), (Read, 0x8), (Read, 0xC), (Read, 0x0), (Read, 0xC)],
        );
        assert_eq!(r, vec![Miss, Miss, Miss, Miss, Hit, Hit]);
        assert_eq!(m.counters().evictions, 0);
        assert!(m.set_counters().iter().all(|s| s.misses == 1));
        assert_eq!(m.set_counters()[0].accesses, 2);
    }
    #[test]
    fn test_sets_never_exceed_associativity() {
        let mut m = model(4, 16, 256, Default::default());
        let refs: Vec<_> = (0..200u32)
            .map(|i| (if i % 3 == 0 { Write } else { Read }, i.wrapping_mul(0x9E37_79B9)))
            .collect();
        run(&mut m, &refs);
        assert!(m.sets().iter().all(|s| s.num_valid() <= 4));
        assert!(m.hit_count() <= m.access_count());
        assert_eq!(m.access_count(), 200);
    }
}
