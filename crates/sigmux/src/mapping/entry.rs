// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unbound mapping entries and their configuration forms.

use super::MappingError;
use crate::stats::{Aggregation, Metric};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a source signal, by position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalRef {
    Index(usize),
    Name(String),
}

impl SignalRef {
    /// Classify an operand: purely decimal text is an index, anything else a name.
    ///
    /// Returns `None` for decimal text that does not fit an index.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            text.parse().ok().map(Self::Index)
        } else {
            Some(Self::Name(text.to_string()))
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }

    /// Turn names written as decimal text into indices.
    pub(crate) fn normalized(self) -> Option<Self> {
        match self {
            Self::Name(name) => Self::parse(&name),
            index => Some(index),
        }
    }
}

impl fmt::Display for SignalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{}", i),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Which values of the source sample a DATA entry selects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataRange {
    /// Every value of the source sample.
    All,
    /// One value.
    Single(SignalRef),
    /// An inclusive range of values.
    Range { first: SignalRef, last: SignalRef },
}

/// Sample header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderField {
    Sequence,
    Length,
}

impl HeaderField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Length => "length",
        }
    }
}

impl FromStr for HeaderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequence" => Ok(Self::Sequence),
            "length" => Ok(Self::Length),
            other => Err(format!("unknown header field '{}'", other)),
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sample timestamp field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampField {
    Origin,
    Received,
}

impl TimestampField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Received => "received",
        }
    }
}

impl FromStr for TimestampField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "origin" => Ok(Self::Origin),
            "received" => Ok(Self::Received),
            other => Err(format!("unknown timestamp field '{}'", other)),
        }
    }
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a mapping entry projects into the composite sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MappingSource {
    Data(DataRange),
    Stats {
        metric: Metric,
        aggregation: Aggregation,
    },
    Header(HeaderField),
    Timestamp(TimestampField),
}

/// A parsed, not yet bound, mapping entry.
///
/// The node is referenced by name only; see [`MappingList::prepare`](super::MappingList::prepare).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingEntry {
    /// Name of the source node, stored verbatim.
    pub node_name: String,

    /// Selected field.
    pub source: MappingSource,

    /// Explicit destination offset; laid out sequentially when absent.
    pub offset: Option<usize>,
}

impl MappingEntry {
    /// Parse the textual form, e.g. `"node1.data[2-5]"`.
    pub fn parse(text: &str) -> Result<Self, MappingError> {
        super::parse::parse_entry(text)
    }

    pub fn new(node_name: impl Into<String>, source: MappingSource) -> Self {
        Self {
            node_name: node_name.into(),
            source,
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Canonical textual form (without destination offset).
    pub fn unparse(&self) -> String {
        self.to_string()
    }

    /// Source offset, when known before binding.
    pub fn source_offset(&self) -> Option<usize> {
        match &self.source {
            MappingSource::Data(DataRange::All) => Some(0),
            MappingSource::Data(DataRange::Single(r))
            | MappingSource::Data(DataRange::Range { first: r, .. }) => r.index(),
            _ => Some(0),
        }
    }

    /// Number of values written, when known before binding.
    ///
    /// `Some(0)` means "every remaining value of the source sample".
    pub fn span(&self) -> Option<usize> {
        match &self.source {
            MappingSource::Data(DataRange::All) => Some(0),
            MappingSource::Data(DataRange::Single(_)) => Some(1),
            MappingSource::Data(DataRange::Range { first, last }) => {
                let (first, last) = (first.index()?, last.index()?);
                last.checked_sub(first)?.checked_add(1)
            }
            _ => Some(1),
        }
    }
}

impl fmt::Display for MappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.node_name;
        match &self.source {
            MappingSource::Data(DataRange::All) => f.write_str(node),
            MappingSource::Data(DataRange::Single(r)) => write!(f, "{}.data[{}]", node, r),
            MappingSource::Data(DataRange::Range { first, last }) => {
                write!(f, "{}.data[{}-{}]", node, first, last)
            }
            MappingSource::Stats {
                metric,
                aggregation,
            } => write!(f, "{}.stats.{}.{}", node, metric, aggregation),
            MappingSource::Header(field) => write!(f, "{}.hdr.{}", node, field),
            MappingSource::Timestamp(field) => write!(f, "{}.ts.{}", node, field),
        }
    }
}

impl FromStr for MappingEntry {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Structured form of a mapping entry.
///
/// ```toml
/// { node = "pmu", type = "data", first = "va", last = "vc", offset = 4 }
/// { node = "pmu", type = "stats", metric = "owd", aggregation = "mean" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Source node name.
    pub node: String,

    /// Selected field.
    #[serde(flatten)]
    pub source: RecordSource,

    /// Explicit destination offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Field selection of a [`MappingRecord`], tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordSource {
    Data {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        first: Option<SignalRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last: Option<SignalRef>,
    },
    Stats {
        metric: Metric,
        aggregation: Aggregation,
    },
    Hdr {
        field: HeaderField,
    },
    Ts {
        field: TimestampField,
    },
}

/// One item of a mapping configuration: an expression or a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingItem {
    Expr(String),
    Record(MappingRecord),
}

impl MappingItem {
    /// Compile this item into an unbound entry.
    pub fn to_entry(&self) -> Result<MappingEntry, MappingError> {
        match self {
            Self::Expr(text) => super::parse::parse_entry(text),
            Self::Record(record) => super::parse::parse_record(record),
        }
    }
}

impl From<&str> for MappingItem {
    fn from(text: &str) -> Self {
        Self::Expr(text.to_string())
    }
}
