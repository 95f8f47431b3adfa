// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample remapping engine for a real-time signal gateway.
//!
//! Assembles composite output samples from the data, header fields,
//! timestamps and statistics of several source nodes, as described by
//! compact mapping expressions.
//!
//! # Features
//!
//! - **Mapping expressions**: `A.data[0-3]`, `B.stats.owd.mean`, `A.hdr.sequence`, ...
//! - **One-time binding**: node and signal names are resolved before any sample flows
//! - **Incremental merge**: each arriving sample refreshes only its own slots
//! - **Contained failures**: a bad entry is skipped, the rest still apply
//!
//! # Quick Start
//!
//! ```
//! use sigmux::{MappingList, NodeList, Sample, SignalData, SignalList, StatsRegistry};
//! use std::sync::Arc;
//!
//! let mut nodes = NodeList::new();
//! let a = nodes.add("A", SignalList::default()).unwrap();
//! nodes.add("B", SignalList::default()).unwrap();
//!
//! let mut list = MappingList::parse(["A.data[0-1]", "B.stats.owd.mean", "A.hdr.sequence"]).unwrap();
//! let bound = list.prepare(&nodes).unwrap();
//!
//! let original = Sample::from_values(
//!     Arc::new(SignalList::default()),
//!     vec![SignalData::Float(1.0), SignalData::Float(2.0), SignalData::Float(3.0)],
//! )
//! .with_sequence(7);
//!
//! let mut composite = bound.new_sample();
//! let report = bound.remap(a, &original, &mut composite, &StatsRegistry::new());
//! assert!(report.is_clean());
//! assert_eq!(composite.value(3), Some(&SignalData::Integer(7)));
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! name = "pmu-gateway"
//!
//! [[nodes]]
//! name = "A"
//! signals = [{ name = "va", unit = "V" }, { name = "vb", unit = "V" }]
//!
//! [[nodes]]
//! name = "B"
//!
//! [[paths]]
//! name = "composite"
//! mapping = ["A.data[va-vb]", "B.stats.owd.mean", "A.hdr.sequence"]
//! ```

pub mod config;
pub mod mapping;
pub mod node;
pub mod sample;
pub mod signal;
pub mod stats;

pub use config::{ConfigError, GatewayConfig, NodeConfig, PathConfig};
pub use mapping::{
    parse_entry, BoundMappingList, MappingConfig, MappingEntry, MappingError, MappingList,
    RemapError, RemapReport, RemapStats, RemapStatsSnapshot, MAX_LAYOUT_LEN,
};
pub use node::{NodeError, NodeId, NodeList, NodeRegistry};
pub use sample::{Sample, SampleFlags, Timestamp};
pub use signal::{Signal, SignalData, SignalError, SignalKind, SignalList};
pub use stats::{Aggregation, Metric, StatsProvider, StatsRegistry};
