// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-node runtime statistics.
//!
//! Mapping entries of the STATS kind read a single aggregated value of one
//! metric through a [`StatsProvider`]. [`StatsRegistry`] is the in-memory
//! provider: one [`Histogram`] per metric and node.

use crate::node::NodeId;
use crate::signal::{SignalData, SignalKind};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Statistics metric collected per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Skipped samples and the distance between them.
    Skipped,
    /// Reordered samples and the distance between them.
    Reordered,
    /// Inter-message timestamps as sent by the remote.
    GapSent,
    /// Inter-message arrival time.
    GapReceived,
    /// One-way delay of received messages.
    Owd,
    /// Processing time from receive to send.
    Age,
    /// Fraction lost since the last RTP report.
    RtpLossFraction,
    /// Cumulative number of RTP packets lost.
    RtpPktsLost,
    /// RTP interarrival jitter.
    RtpJitter,
}

impl Metric {
    pub const COUNT: usize = 9;

    pub const ALL: [Metric; Self::COUNT] = [
        Self::Skipped,
        Self::Reordered,
        Self::GapSent,
        Self::GapReceived,
        Self::Owd,
        Self::Age,
        Self::RtpLossFraction,
        Self::RtpPktsLost,
        Self::RtpJitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Reordered => "reordered",
            Self::GapSent => "gap_sent",
            Self::GapReceived => "gap_received",
            Self::Owd => "owd",
            Self::Age => "age",
            Self::RtpLossFraction => "rtp_loss_fraction",
            Self::RtpPktsLost => "rtp_pkts_lost",
            Self::RtpJitter => "rtp_jitter",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Skipped | Self::Reordered => "samples",
            Self::GapSent | Self::GapReceived | Self::Owd | Self::Age | Self::RtpJitter => {
                "seconds"
            }
            Self::RtpLossFraction => "percent",
            Self::RtpPktsLost => "packets",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Skipped => "Skipped samples and the distance between them",
            Self::Reordered => "Reordered samples and the distance between them",
            Self::GapSent => "Inter-message timestamps (as sent by remote)",
            Self::GapReceived => "Inter-message arrival time (as received by this instance)",
            Self::Owd => "One-way-delay (OWD) of received messages",
            Self::Age => "Processing time of packets from receive to sent",
            Self::RtpLossFraction => "Fraction lost since last RTP SR/RR",
            Self::RtpPktsLost => "Cumulative number of packets lost",
            Self::RtpJitter => "Interarrival jitter",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown statistics metric '{}'", s))
    }
}

/// Aggregation applied to a metric's histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Last,
    Highest,
    Lowest,
    Mean,
    Var,
    Stddev,
    Total,
}

impl Aggregation {
    pub const ALL: [Aggregation; 7] = [
        Self::Last,
        Self::Highest,
        Self::Lowest,
        Self::Mean,
        Self::Var,
        Self::Stddev,
        Self::Total,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last => "last",
            Self::Highest => "highest",
            Self::Lowest => "lowest",
            Self::Mean => "mean",
            Self::Var => "var",
            Self::Stddev => "stddev",
            Self::Total => "total",
        }
    }

    /// Kind of the value this aggregation produces.
    pub fn result_kind(&self) -> SignalKind {
        match self {
            Self::Total => SignalKind::Integer,
            _ => SignalKind::Float,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown statistics aggregation '{}'", s))
    }
}

/// Source of aggregated statistics values.
///
/// Implementations must tolerate concurrent queries.
pub trait StatsProvider {
    /// Current value of `metric` for `node`, or `None` when unavailable.
    fn query(&self, node: NodeId, metric: Metric, aggregation: Aggregation)
        -> Option<SignalData>;
}

/// Running summary of one metric (Welford's online algorithm).
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    total: u64,
    last: f64,
    highest: f64,
    lowest: f64,
    mean: f64,
    m2: f64,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation.
    pub fn put(&mut self, value: f64) {
        self.total += 1;
        self.last = value;

        if self.total == 1 {
            self.highest = value;
            self.lowest = value;
        } else {
            self.highest = self.highest.max(value);
            self.lowest = self.lowest.min(value);
        }

        let delta = value - self.mean;
        self.mean += delta / self.total as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; zero with fewer than two observations.
    pub fn var(&self) -> f64 {
        if self.total < 2 {
            0.0
        } else {
            self.m2 / (self.total - 1) as f64
        }
    }

    pub fn stddev(&self) -> f64 {
        self.var().sqrt()
    }

    /// Aggregated value, `None` before the first observation.
    pub fn get(&self, aggregation: Aggregation) -> Option<SignalData> {
        if self.total == 0 {
            return None;
        }

        Some(match aggregation {
            Aggregation::Total => SignalData::Integer(self.total as i64),
            Aggregation::Last => SignalData::Float(self.last),
            Aggregation::Highest => SignalData::Float(self.highest),
            Aggregation::Lowest => SignalData::Float(self.lowest),
            Aggregation::Mean => SignalData::Float(self.mean),
            Aggregation::Var => SignalData::Float(self.var()),
            Aggregation::Stddev => SignalData::Float(self.stddev()),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// All metric histograms of one node.
#[derive(Debug, Clone, Default)]
pub struct NodeStats {
    histograms: [Histogram; Metric::COUNT],
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, metric: Metric, value: f64) {
        self.histograms[metric.index()].put(value);
    }

    pub fn histogram(&self, metric: Metric) -> &Histogram {
        &self.histograms[metric.index()]
    }

    pub fn get(&self, metric: Metric, aggregation: Aggregation) -> Option<SignalData> {
        self.histogram(metric).get(aggregation)
    }

    pub fn reset(&mut self) {
        self.histograms.iter_mut().for_each(Histogram::reset);
    }
}

/// Thread-safe statistics of many nodes.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    nodes: RwLock<HashMap<NodeId, NodeStats>>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation of `metric` for `node`.
    pub fn update(&self, node: NodeId, metric: Metric, value: f64) {
        self.nodes
            .write()
            .entry(node)
            .or_default()
            .update(metric, value);
    }

    /// Copy of a node's statistics.
    pub fn snapshot(&self, node: NodeId) -> Option<NodeStats> {
        self.nodes.read().get(&node).cloned()
    }

    pub fn reset(&self, node: NodeId) {
        if let Some(stats) = self.nodes.write().get_mut(&node) {
            stats.reset();
        }
    }
}

impl StatsProvider for StatsRegistry {
    fn query(
        &self,
        node: NodeId,
        metric: Metric,
        aggregation: Aggregation,
    ) -> Option<SignalData> {
        self.nodes.read().get(&node)?.get(metric, aggregation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_aggregations() {
        let mut h = Histogram::new();
        assert_eq!(h.get(Aggregation::Mean), None);

        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            h.put(v);
        }

        assert_eq!(h.get(Aggregation::Total), Some(SignalData::Integer(8)));
        assert_eq!(h.get(Aggregation::Last), Some(SignalData::Float(9.0)));
        assert_eq!(h.get(Aggregation::Highest), Some(SignalData::Float(9.0)));
        assert_eq!(h.get(Aggregation::Lowest), Some(SignalData::Float(2.0)));
        let mean = h.get(Aggregation::Mean).and_then(|v| v.as_f64()).unwrap();
        assert!((mean - 5.0).abs() < 1e-12);

        let var = h.get(Aggregation::Var).and_then(|v| v.as_f64()).unwrap();
        assert!((var - 32.0 / 7.0).abs() < 1e-9);
        let stddev = h.get(Aggregation::Stddev).and_then(|v| v.as_f64()).unwrap();
        assert!((stddev - var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_single_sample_variance() {
        let mut h = Histogram::new();
        h.put(3.5);
        assert_eq!(h.var(), 0.0);
        assert_eq!(h.get(Aggregation::Lowest), Some(SignalData::Float(3.5)));
    }

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>(), Ok(metric));
        }
        for agg in Aggregation::ALL {
            assert_eq!(agg.as_str().parse::<Aggregation>(), Ok(agg));
        }
        assert!("latency".parse::<Metric>().is_err());
    }

    #[test]
    fn test_result_kinds() {
        assert_eq!(Aggregation::Total.result_kind(), SignalKind::Integer);
        assert_eq!(Aggregation::Stddev.result_kind(), SignalKind::Float);
    }

    #[test]
    fn test_registry_query() {
        let registry = StatsRegistry::new();
        let node = NodeId::from_raw(3);

        assert_eq!(registry.query(node, Metric::Owd, Aggregation::Mean), None);

        registry.update(node, Metric::Owd, 1.0);
        registry.update(node, Metric::Owd, 3.0);

        assert_eq!(
            registry.query(node, Metric::Owd, Aggregation::Mean),
            Some(SignalData::Float(2.0))
        );
        assert_eq!(registry.query(node, Metric::Age, Aggregation::Mean), None);

        registry.reset(node);
        assert_eq!(registry.query(node, Metric::Owd, Aggregation::Mean), None);
    }
}
