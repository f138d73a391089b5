use serde::Serialize;

use crate::{
    cache::{CacheCounters, CacheModel},
    common::{Outcome, SimulationOption},
    decode::DecodedAddr,
    geometry::CacheGeometry,
    trace::TraceEntry,
};

#[cfg(feature = "stat")]
use crate::stat::{AddStats, Stats};

/// one replayed reference and what the cache did with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(flatten)]
    pub entry: TraceEntry,
    #[serde(flatten)]
    pub decoded: DecodedAddr,
    pub outcome: Outcome,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub hits: u64,
    pub accesses: u64,
}

impl Summary {
    pub fn misses(&self) -> u64 {
        self.accesses - self.hits
    }
    /// `None` when no accesses were recorded
    pub fn hit_rate(&self) -> Option<f64> {
        (self.accesses != 0).then(|| self.hits as f64 / self.accesses as f64)
    }
    pub fn miss_rate(&self) -> Option<f64> {
        (self.accesses != 0).then(|| self.misses() as f64 / self.accesses as f64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimOutput {
    pub geometry: CacheGeometry,
    pub records: Vec<Record>,
    #[serde(serialize_with = "serialize_summary")]
    pub summary: Summary,
}

fn serialize_summary<S: serde::Serializer>(summary: &Summary, s: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Full {
        hits: u64,
        misses: u64,
        accesses: u64,
        hit_rate: Option<f64>,
        miss_rate: Option<f64>,
    }
    Full {
        hits: summary.hits,
        misses: summary.misses(),
        accesses: summary.accesses,
        hit_rate: summary.hit_rate(),
        miss_rate: summary.miss_rate(),
    }
    .serialize(s)
}

/// Replays references through a [`CacheModel`] strictly in order and
/// records the outcome of each.
pub struct Simulator {
    model: CacheModel,
    records: Vec<Record>,
}

impl Simulator {
    pub fn new(geometry: CacheGeometry, option: SimulationOption) -> Self {
        log::info!("cache geometry: {geometry}");
        log::info!("replacement: {}", option.hit_aging);
        Self {
            model: CacheModel::new(geometry, option),
            records: Vec::new(),
        }
    }

    pub fn step(&mut self, entry: &TraceEntry) -> Outcome {
        let decoded = DecodedAddr::decompose(entry.addr, self.model.geometry());
        let outcome = self.model.access(entry.op, &decoded);
        self.records.push(Record {
            entry: *entry,
            decoded,
            outcome,
        });
        outcome
    }

    pub fn run<'a>(&mut self, entries: impl IntoIterator<Item = &'a TraceEntry>) {
        for entry in entries {
            self.step(entry);
        }
        log::info!(
            "replayed {} references: {} hits, {} misses",
            self.records.len(),
            self.model.hit_count(),
            self.model.miss_count()
        );
    }

    pub fn model(&self) -> &CacheModel {
        &self.model
    }
    pub fn records(&self) -> &[Record] {
        &self.records
    }
    pub fn counters(&self) -> &CacheCounters {
        self.model.counters()
    }
    pub fn summary(&self) -> Summary {
        Summary {
            hits: self.model.hit_count(),
            accesses: self.model.access_count(),
        }
    }

    pub fn into_output(self) -> SimOutput {
        let summary = self.summary();
        SimOutput {
            geometry: *self.model.geometry(),
            records: self.records,
            summary,
        }
    }
}

#[cfg(feature = "stat")]
impl Simulator {
    pub fn collect_stat(&self) -> Stats {
        let mut ss = Stats::default();
        self.add_stats(&mut ss);
        ss
    }
}

#[cfg(feature = "stat")]
impl AddStats for Simulator {
    fn add_stats(&self, buf: &mut Stats) {
        self.model.add_stats(buf);
    }
}

/// replays `entries` against a fresh cache.
pub fn run<'a>(
    geometry: CacheGeometry,
    option: SimulationOption,
    entries: impl IntoIterator<Item = &'a TraceEntry>,
) -> SimOutput {
    let mut sim = Simulator::new(geometry, option);
    sim.run(entries);
    sim.into_output()
}
