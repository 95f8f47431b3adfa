// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Incremental evaluation of bound mapping lists.
//!
//! Each arriving sample refreshes only the composite slots owned by its
//! originating node. Failures are per entry: the entry is skipped, the
//! remaining entries still apply, and nothing already written is undone.

use super::bind::{BoundEntry, BoundMappingList, BoundSource};
use super::entry::{HeaderField, TimestampField};
use crate::node::NodeId;
use crate::sample::Sample;
use crate::signal::SignalData;
use crate::stats::StatsProvider;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Per-entry evaluation failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemapError {
    #[error("Mapping entry {index} overflows destination: {end} > capacity {capacity}")]
    DestinationOverflow {
        index: usize,
        end: usize,
        capacity: usize,
    },

    #[error("Mapping entry {index} reads beyond source sample: {end} > length {length}")]
    SourceOutOfRange {
        index: usize,
        end: usize,
        length: usize,
    },
}

/// Outcome of one [`BoundMappingList::remap`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapReport {
    /// Entries that wrote values.
    pub applied: usize,

    /// Entries with nothing to write (absent timestamp, unavailable statistic).
    pub skipped: usize,

    /// Entries that failed; empty on the normal path.
    pub failures: Vec<RemapError>,
}

impl RemapReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Applied,
    Skipped,
}

impl BoundMappingList {
    /// Merge `original`, received from `origin`, into the composite `remapped`.
    ///
    /// Only entries bound to `origin` are evaluated, in list order. Other
    /// slots of `remapped` are left untouched.
    pub fn remap(
        &self,
        origin: NodeId,
        original: &Sample,
        remapped: &mut Sample,
        stats: &dyn StatsProvider,
    ) -> RemapReport {
        let mut report = RemapReport::default();

        for (index, entry) in self.entries.iter().enumerate() {
            if entry.node() != origin {
                continue;
            }

            match entry.apply(index, original, remapped, stats) {
                Ok(Outcome::Applied) => report.applied += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("Skipping mapping {}: {}", entry, e);
                    report.failures.push(e);
                }
            }
        }

        report
    }
}

impl BoundEntry {
    fn apply(
        &self,
        index: usize,
        original: &Sample,
        remapped: &mut Sample,
        stats: &dyn StatsProvider,
    ) -> Result<Outcome, RemapError> {
        let len = self.effective_length(original);
        let offset = self.offset();
        let end = offset.saturating_add(len);

        if end > remapped.capacity() {
            return Err(RemapError::DestinationOverflow {
                index,
                end,
                capacity: remapped.capacity(),
            });
        }

        let value = match self.source() {
            BoundSource::Data {
                offset: src_offset, ..
            } => {
                let values = original.values();
                let src_end = src_offset.saturating_add(len);
                if src_end > values.len() {
                    return Err(RemapError::SourceOutOfRange {
                        index,
                        end: src_end,
                        length: values.len(),
                    });
                }
                if len == 0 {
                    return Ok(Outcome::Skipped);
                }

                remapped.slots_mut()[offset..end].copy_from_slice(&values[*src_offset..src_end]);
                remapped.mark_written(end);
                return Ok(Outcome::Applied);
            }
            BoundSource::Stats {
                metric,
                aggregation,
            } => stats.query(self.node(), *metric, *aggregation),
            BoundSource::Header(HeaderField::Sequence) => {
                original
                    .sequence()
                    .map(|seq| SignalData::Integer(i64::try_from(seq).unwrap_or(i64::MAX)))
            }
            BoundSource::Header(HeaderField::Length) => {
                Some(SignalData::Integer(original.len() as i64))
            }
            BoundSource::Timestamp(TimestampField::Origin) => original
                .ts_origin()
                .map(|ts| SignalData::Integer(ts.as_nanos())),
            BoundSource::Timestamp(TimestampField::Received) => original
                .ts_received()
                .map(|ts| SignalData::Integer(ts.as_nanos())),
        };

        match value {
            Some(value) => {
                remapped.slots_mut()[offset] = value;
                remapped.mark_written(end);
                Ok(Outcome::Applied)
            }
            None => Ok(Outcome::Skipped),
        }
    }
}

/// Cumulative evaluation counters of one path.
#[derive(Debug, Default)]
pub struct RemapStats {
    /// Calls to `remap`.
    pub calls: AtomicU64,

    /// Entries applied.
    pub applied: AtomicU64,

    /// Entries skipped.
    pub skipped: AtomicU64,

    /// Entries failed.
    pub failed: AtomicU64,
}

impl RemapStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one evaluation.
    pub fn record(&self, report: &RemapReport) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.applied
            .fetch_add(report.applied as u64, Ordering::Relaxed);
        self.skipped
            .fetch_add(report.skipped as u64, Ordering::Relaxed);
        self.failed
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RemapStatsSnapshot {
        RemapStatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`RemapStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemapStatsSnapshot {
    pub calls: u64,
    pub applied: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl RemapStatsSnapshot {
    /// Share of evaluated entries that failed.
    pub fn failure_ratio(&self) -> f64 {
        let total = self.applied + self.skipped + self.failed;
        if total > 0 {
            self.failed as f64 / total as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MappingEntry, MappingList};
    use crate::node::{NodeList, NodeRegistry};
    use crate::sample::Timestamp;
    use crate::signal::{SignalKind, SignalList};
    use crate::stats::{Aggregation, Metric, StatsRegistry};
    use std::sync::Arc;

    fn nodes() -> NodeList {
        let mut nodes = NodeList::new();
        nodes.add("A", SignalList::default()).unwrap();
        nodes.add("B", SignalList::default()).unwrap();
        nodes
    }

    fn floats(values: &[f64]) -> Sample {
        Sample::from_values(
            Arc::new(SignalList::default()),
            values.iter().copied().map(SignalData::Float).collect(),
        )
    }

    fn composite(capacity: usize) -> Sample {
        Sample::with_capacity(Arc::new(SignalList::default()), capacity)
    }

    #[test]
    fn test_remap_data_and_header() {
        let nodes = nodes();
        let a = nodes.resolve("A").unwrap();
        let bound = MappingList::parse(["A.data[1-2]", "A.hdr.sequence", "A.hdr.length"])
            .unwrap()
            .prepare(&nodes)
            .unwrap();

        let original = floats(&[1.0, 2.0, 3.0]).with_sequence(42);
        let mut out = composite(4);
        let report = bound.remap(a, &original, &mut out, &StatsRegistry::new());

        assert_eq!(report.applied, 3);
        assert!(report.is_clean());
        assert_eq!(
            out.values(),
            &[
                SignalData::Float(2.0),
                SignalData::Float(3.0),
                SignalData::Integer(42),
                SignalData::Integer(3),
            ]
        );
    }

    #[test]
    fn test_remap_rest_of_sample() {
        let nodes = nodes();
        let a = nodes.resolve("A").unwrap();
        let mut list = MappingList::new();
        list.push(MappingEntry::parse("A").unwrap().with_offset(2))
            .unwrap();
        let bound = list.prepare(&nodes).unwrap();

        let original = floats(&[5.0, 6.0, 7.0]);
        let mut out = composite(8);
        let report = bound.remap(a, &original, &mut out, &StatsRegistry::new());

        assert_eq!(report.applied, 1);
        assert_eq!(out.len(), 5);
        assert_eq!(out.value(4), Some(&SignalData::Float(7.0)));
    }

    #[test]
    fn test_remap_overflow_is_contained() {
        let nodes = nodes();
        let a = nodes.resolve("A").unwrap();
        let bound = MappingList::parse(["A.hdr.sequence", "A.data[0-3]"])
            .unwrap()
            .prepare(&nodes)
            .unwrap();

        let original = floats(&[1.0, 2.0, 3.0, 4.0]).with_sequence(1);
        let mut out = composite(2);
        let report = bound.remap(a, &original, &mut out, &StatsRegistry::new());

        assert_eq!(
            report.failures,
            vec![RemapError::DestinationOverflow {
                index: 1,
                end: 5,
                capacity: 2,
            }]
        );
        assert_eq!(report.applied, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out.value(0), Some(&SignalData::Integer(1)));
    }

    #[test]
    fn test_remap_source_out_of_range() {
        let nodes = nodes();
        let a = nodes.resolve("A").unwrap();
        let bound = MappingList::parse(["A.data[1-4]", "A.hdr.length"])
            .unwrap()
            .prepare(&nodes)
            .unwrap();

        let original = floats(&[1.0, 2.0]);
        let mut out = composite(5);
        let report = bound.remap(a, &original, &mut out, &StatsRegistry::new());

        assert_eq!(
            report.failures,
            vec![RemapError::SourceOutOfRange {
                index: 0,
                end: 5,
                length: 2,
            }]
        );
        assert_eq!(report.applied, 1);
        assert_eq!(out.value(4), Some(&SignalData::Integer(2)));
    }

    #[test]
    fn test_remap_source_at_top_of_index_space() {
        let nodes = nodes();
        let a = nodes.resolve("A").unwrap();
        let bound = MappingList::parse([
            "A.data[18446744073709551615]",
            "A.data[18446744073709551614-18446744073709551615]",
            "A.hdr.length",
        ])
        .unwrap()
        .prepare(&nodes)
        .unwrap();
        assert_eq!(bound.required_capacity(), 4);

        let mut out = composite(bound.required_capacity());
        let report = bound.remap(a, &floats(&[1.0]), &mut out, &StatsRegistry::new());

        assert_eq!(
            report.failures,
            vec![
                RemapError::SourceOutOfRange {
                    index: 0,
                    end: usize::MAX,
                    length: 1,
                },
                RemapError::SourceOutOfRange {
                    index: 1,
                    end: usize::MAX,
                    length: 1,
                },
            ]
        );
        assert_eq!(report.applied, 1);
        assert_eq!(out.value(3), Some(&SignalData::Integer(1)));
    }

    #[test]
    fn test_remap_sequence_saturates() {
        let nodes = nodes();
        let a = nodes.resolve("A").unwrap();
        let bound = MappingList::parse(["A.hdr.sequence"])
            .unwrap()
            .prepare(&nodes)
            .unwrap();

        let mut out = composite(1);
        let original = floats(&[]).with_sequence(u64::MAX);
        let report = bound.remap(a, &original, &mut out, &StatsRegistry::new());
        assert_eq!(report.applied, 1);
        assert_eq!(out.value(0), Some(&SignalData::Integer(i64::MAX)));

        let original = floats(&[]).with_sequence(i64::MAX as u64);
        bound.remap(a, &original, &mut out, &StatsRegistry::new());
        assert_eq!(out.value(0), Some(&SignalData::Integer(i64::MAX)));

        let original = floats(&[]).with_sequence(9);
        bound.remap(a, &original, &mut out, &StatsRegistry::new());
        assert_eq!(out.value(0), Some(&SignalData::Integer(9)));
    }

    #[test]
    fn test_remap_missing_timestamp_is_skipped() {
        let nodes = nodes();
        let a = nodes.resolve("A").unwrap();
        let bound = MappingList::parse(["A.ts.origin", "A.ts.received"])
            .unwrap()
            .prepare(&nodes)
            .unwrap();

        let mut original = floats(&[]);
        original.set_ts_received(Timestamp::new(2, 5));
        let mut out = bound.new_sample();
        let report = bound.remap(a, &original, &mut out, &StatsRegistry::new());

        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.is_clean());
        assert_eq!(out.value(1), Some(&SignalData::Integer(2_000_000_005)));
        assert_eq!(
            out.value_as(1, SignalKind::Integer),
            Ok(SignalData::Integer(2_000_000_005))
        );
    }

    #[test]
    fn test_remap_stats_entry() {
        let nodes = nodes();
        let b = nodes.resolve("B").unwrap();
        let bound = MappingList::parse(["B.stats.owd.mean", "B.stats.owd.total"])
            .unwrap()
            .prepare(&nodes)
            .unwrap();

        let stats = StatsRegistry::new();
        let mut out = bound.new_sample();

        let report = bound.remap(b, &floats(&[]), &mut out, &stats);
        assert_eq!(report.skipped, 2);
        assert!(out.is_empty());

        stats.update(b, Metric::Owd, 0.5);
        let report = bound.remap(b, &floats(&[]), &mut out, &stats);
        assert_eq!(report.applied, 2);
        assert_eq!(out.value(0), Some(&SignalData::Float(0.5)));
        assert_eq!(out.value(1), Some(&SignalData::Integer(1)));
        assert_eq!(
            stats.query(b, Metric::Owd, Aggregation::Last),
            Some(SignalData::Float(0.5))
        );
    }

    #[test]
    fn test_remap_ignores_other_nodes() {
        let nodes = nodes();
        let b = nodes.resolve("B").unwrap();
        let bound = MappingList::parse(["A.data[0]"])
            .unwrap()
            .prepare(&nodes)
            .unwrap();

        let mut out = bound.new_sample();
        let report = bound.remap(b, &floats(&[9.0]), &mut out, &StatsRegistry::new());

        assert_eq!(report, RemapReport::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_remap_stats_counters() {
        let stats = RemapStats::new();
        stats.record(&RemapReport {
            applied: 3,
            skipped: 0,
            failures: vec![RemapError::DestinationOverflow {
                index: 1,
                end: 9,
                capacity: 8,
            }],
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.calls, 1);
        assert_eq!(snapshot.applied, 3);
        assert_eq!(snapshot.failed, 1);
        assert!((snapshot.failure_ratio() - 0.25).abs() < f64::EPSILON);
    }
}
