// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binding of mapping lists against a node registry.
//!
//! Binding resolves node names to identities and signal names to offsets,
//! and lays out destination offsets. It runs once per list, before any
//! evaluation, and either binds every entry or none.

use super::entry::{DataRange, HeaderField, MappingEntry, MappingSource, SignalRef, TimestampField};
use super::list::{ListState, MappingList};
use super::{MappingError, MAX_LAYOUT_LEN};
use crate::node::{NodeId, NodeRegistry};
use crate::sample::Sample;
use crate::signal::{Signal, SignalKind, SignalList};
use crate::stats::{Aggregation, Metric};
use std::fmt;
use std::sync::Arc;

/// Resolved field selection of a bound entry.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundSource {
    Data {
        /// First source value.
        offset: usize,
        /// Descriptor of the first source signal, if the node declares it.
        signal: Option<Signal>,
    },
    Stats {
        metric: Metric,
        aggregation: Aggregation,
    },
    Header(HeaderField),
    Timestamp(TimestampField),
}

/// A mapping entry resolved against a node registry.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundEntry {
    node: NodeId,
    node_name: String,
    offset: usize,
    length: usize,
    source: BoundSource,
}

impl BoundEntry {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Destination offset in the composite sample.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Static span; 0 means "rest of the source sample".
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn source(&self) -> &BoundSource {
        &self.source
    }

    /// Number of values this entry writes for `original`.
    pub fn effective_length(&self, original: &Sample) -> usize {
        match &self.source {
            BoundSource::Data { offset, .. } if self.length == 0 => {
                original.len().saturating_sub(*offset)
            }
            BoundSource::Data { .. } => self.length,
            _ => 1,
        }
    }

    /// Unbound equivalent with numeric indices and explicit offset.
    pub fn to_entry(&self) -> MappingEntry {
        let source = match &self.source {
            BoundSource::Data { offset: 0, .. } if self.length == 0 => {
                MappingSource::Data(DataRange::All)
            }
            BoundSource::Data { offset, .. } if self.length <= 1 => {
                MappingSource::Data(DataRange::Single(SignalRef::Index(*offset)))
            }
            BoundSource::Data { offset, .. } => MappingSource::Data(DataRange::Range {
                first: SignalRef::Index(*offset),
                last: SignalRef::Index(offset + (self.length - 1)),
            }),
            BoundSource::Stats {
                metric,
                aggregation,
            } => MappingSource::Stats {
                metric: *metric,
                aggregation: *aggregation,
            },
            BoundSource::Header(field) => MappingSource::Header(*field),
            BoundSource::Timestamp(field) => MappingSource::Timestamp(*field),
        };

        MappingEntry::new(self.node_name.clone(), source).with_offset(self.offset)
    }
}

impl fmt::Display for BoundEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_entry())
    }
}

/// An immutable, bound mapping list ready for evaluation.
#[derive(Debug, Clone)]
pub struct BoundMappingList {
    pub(super) entries: Box<[BoundEntry]>,
    signals: Arc<SignalList>,
}

impl BoundMappingList {
    pub fn entries(&self) -> &[BoundEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sourced from `node`, in list order.
    pub fn entries_for(&self, node: NodeId) -> impl Iterator<Item = &BoundEntry> {
        self.entries.iter().filter(move |e| e.node == node)
    }

    /// Descriptors of the composite output, one per laid-out slot.
    pub fn output_signals(&self) -> &Arc<SignalList> {
        &self.signals
    }

    /// Minimum capacity of a composite sample for the static layout.
    pub fn required_capacity(&self) -> usize {
        self.signals.len()
    }

    /// An empty composite sample sized for this list.
    pub fn new_sample(&self) -> Sample {
        Sample::with_capacity(self.signals.clone(), self.required_capacity())
    }
}

impl MappingList {
    /// Bind every entry against `registry`.
    ///
    /// On failure no entry is bound and the list stays [`ListState::Parsed`].
    /// A list can be prepared only once.
    pub fn prepare(
        &mut self,
        registry: &dyn NodeRegistry,
    ) -> Result<BoundMappingList, MappingError> {
        if self.state == ListState::Prepared {
            return Err(MappingError::AlreadyPrepared);
        }

        let mut cursor = 0;
        let mut unsized_rest: Option<&str> = None;
        let mut layout: Vec<Signal> = Vec::new();
        let mut bound = Vec::with_capacity(self.entries().len());

        for entry in self.entries() {
            let node = registry
                .resolve(&entry.node_name)
                .ok_or_else(|| MappingError::UnknownNodeReference(entry.node_name.clone()))?;
            let signals = registry.signals_of(node).unwrap_or_default();

            let (source, length) = bind_source(entry, &signals)?;

            // Rest-of-sample entries occupy the node's declared signals.
            let span = match &source {
                BoundSource::Data { offset, .. } if length == 0 => {
                    signals.len().saturating_sub(*offset)
                }
                _ => length,
            };

            let offset = match (entry.offset, unsized_rest) {
                (Some(offset), _) => offset,
                (None, Some(rest)) => {
                    return Err(MappingError::UnsizedLayout {
                        node: entry.node_name.clone(),
                        rest: rest.to_string(),
                    })
                }
                (None, None) => cursor,
            };
            cursor = offset
                .checked_add(span)
                .filter(|end| *end <= MAX_LAYOUT_LEN)
                .ok_or_else(|| MappingError::LayoutTooLarge {
                    node: entry.node_name.clone(),
                    limit: MAX_LAYOUT_LEN,
                })?;

            unsized_rest = (length == 0 && span == 0).then_some(entry.node_name.as_str());
            if unsized_rest.is_some() {
                tracing::warn!(
                    "Mapping {} has no declared signals to size its slots",
                    entry
                );
            }

            if layout.len() < cursor {
                layout.resize(cursor, Signal::anonymous(SignalKind::Float));
            }
            for i in 0..span {
                layout[offset + i] = slot_signal(entry, &source, &signals, i);
            }

            tracing::debug!(
                "Bound mapping {} to {} at offset {} (length {})",
                entry,
                node,
                offset,
                length
            );

            bound.push(BoundEntry {
                node,
                node_name: entry.node_name.clone(),
                offset,
                length,
                source,
            });
        }

        self.state = ListState::Prepared;
        tracing::info!(
            "Prepared mapping list with {} entries ({} output signals)",
            bound.len(),
            layout.len()
        );

        Ok(BoundMappingList {
            entries: bound.into_boxed_slice(),
            signals: Arc::new(SignalList::new(layout)),
        })
    }
}

fn bind_source(
    entry: &MappingEntry,
    signals: &SignalList,
) -> Result<(BoundSource, usize), MappingError> {
    let data = |offset: usize, length: usize| {
        (
            BoundSource::Data {
                offset,
                signal: signals.get(offset).cloned(),
            },
            length,
        )
    };

    Ok(match &entry.source {
        MappingSource::Data(DataRange::All) => data(0, 0),
        MappingSource::Data(DataRange::Single(r)) => data(resolve_ref(entry, r, signals)?, 1),
        MappingSource::Data(DataRange::Range { first, last }) => {
            let first = resolve_ref(entry, first, signals)?;
            let last = resolve_ref(entry, last, signals)?;
            if last < first {
                return Err(MappingError::InvalidRange {
                    node: entry.node_name.clone(),
                    first,
                    last,
                });
            }
            let length = (last - first).checked_add(1).ok_or_else(|| {
                MappingError::RangeTooLarge {
                    node: entry.node_name.clone(),
                    first,
                    last,
                }
            })?;
            data(first, length)
        }
        MappingSource::Stats {
            metric,
            aggregation,
        } => (
            BoundSource::Stats {
                metric: *metric,
                aggregation: *aggregation,
            },
            1,
        ),
        MappingSource::Header(field) => (BoundSource::Header(*field), 1),
        MappingSource::Timestamp(field) => (BoundSource::Timestamp(*field), 1),
    })
}

fn resolve_ref(
    entry: &MappingEntry,
    r: &SignalRef,
    signals: &SignalList,
) -> Result<usize, MappingError> {
    match r {
        SignalRef::Index(i) => Ok(*i),
        SignalRef::Name(name) => signals
            .index_of(name)
            .or_else(|| name.parse().ok())
            .ok_or_else(|| MappingError::UnresolvedSignalReference {
                node: entry.node_name.clone(),
                signal: name.clone(),
            }),
    }
}

/// Descriptor of the `i`-th composite slot written by an entry.
fn slot_signal(entry: &MappingEntry, source: &BoundSource, signals: &SignalList, i: usize) -> Signal {
    let node = &entry.node_name;
    match source {
        BoundSource::Data { offset, .. } => signals
            .get(offset + i)
            .cloned()
            .unwrap_or_else(|| Signal::anonymous(SignalKind::Float)),
        BoundSource::Stats {
            metric,
            aggregation,
        } => Signal::new(
            format!("{}.stats.{}.{}", node, metric, aggregation),
            Some(metric.unit()),
            aggregation.result_kind(),
        ),
        BoundSource::Header(field) => {
            Signal::named(format!("{}.hdr.{}", node, field), SignalKind::Integer)
        }
        BoundSource::Timestamp(field) => Signal::new(
            format!("{}.ts.{}", node, field),
            Some("ns"),
            SignalKind::Integer,
        ),
    }
}
