// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample remapping ("mux") expressions.
//!
//! A mapping list describes how one composite output sample is assembled
//! from fields of the samples and statistics of several source nodes.
//!
//! ```text
//! "A.data[0-1]"  "B.stats.owd.mean"  "A.hdr.sequence"
//!        |                |                  |
//!   MappingList (parsed) --prepare(registry)--> BoundMappingList
//!                                                    |
//!                         remap(origin, original, &mut composite, stats)
//! ```
//!
//! Lifecycle:
//! 1. [`MappingList`] holds entries parsed from text or structured records.
//! 2. [`MappingList::prepare`] resolves node and signal names exactly once
//!    and returns an immutable [`BoundMappingList`].
//! 3. [`BoundMappingList::remap`] refreshes, for each arriving sample, only
//!    the slots owned by the sample's originating node.

mod bind;
mod entry;
mod list;
mod parse;
mod remap;

pub use bind::{BoundEntry, BoundMappingList, BoundSource};
pub use entry::{
    DataRange, HeaderField, MappingEntry, MappingItem, MappingRecord, MappingSource, RecordSource,
    SignalRef, TimestampField,
};
pub use list::{ListState, MappingConfig, MappingList};
pub use parse::parse_entry;
pub use remap::{RemapError, RemapReport, RemapStats, RemapStatsSnapshot};

use thiserror::Error;

/// Upper bound on the number of slots a bound mapping list may lay out.
pub const MAX_LAYOUT_LEN: usize = 1 << 16;

/// Errors raised while parsing or binding mapping expressions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Malformed mapping expression '{expr}': {reason}")]
    MalformedExpression { expr: String, reason: String },

    #[error("Unknown node in mapping: {0}")]
    UnknownNodeReference(String),

    #[error("Unresolved signal '{signal}' of node {node} in mapping")]
    UnresolvedSignalReference { node: String, signal: String },

    #[error("Invalid data range in mapping for node {node}: {last} < {first}")]
    InvalidRange {
        node: String,
        first: usize,
        last: usize,
    },

    #[error("Data range of node {node} is too large: {first}-{last}")]
    RangeTooLarge {
        node: String,
        first: usize,
        last: usize,
    },

    #[error("Mapping for node {node} ends beyond slot limit {limit}")]
    LayoutTooLarge { node: String, limit: usize },

    #[error("Mapping for node {node} follows an unsized rest-of-sample entry of node {rest}; give it an explicit offset")]
    UnsizedLayout { node: String, rest: String },

    #[error("Mapping list is already prepared")]
    AlreadyPrepared,
}

impl MappingError {
    pub(crate) fn malformed(expr: &str, reason: impl Into<String>) -> Self {
        Self::MalformedExpression {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}
