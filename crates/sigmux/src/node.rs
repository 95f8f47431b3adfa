// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node identities and the registry that resolves node names.

use crate::signal::SignalList;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Alphabet of node names, shared with the mapping grammar.
pub const NODE_NAME_PATTERN: &str = "[A-Za-z0-9_-]+";

/// Node registry errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NodeError {
    #[error("Duplicate node name: {0}")]
    Duplicate(String),

    #[error("Invalid node name: '{0}'")]
    InvalidName(String),
}

/// Check a name against [`NODE_NAME_PATTERN`].
pub fn is_valid_node_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{}$", NODE_NAME_PATTERN)).expect("node name pattern is valid")
    })
    .is_match(name)
}

/// Stable opaque handle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Resolves node names to identities and exposes their signal lists.
///
/// Implementations are consulted only while binding mapping lists.
pub trait NodeRegistry {
    /// Look up a node by name.
    fn resolve(&self, name: &str) -> Option<NodeId>;

    /// Input signals declared for a node.
    fn signals_of(&self, node: NodeId) -> Option<Arc<SignalList>>;
}

#[derive(Debug, Clone)]
struct NodeEntry {
    name: String,
    signals: Arc<SignalList>,
}

/// In-memory node registry.
#[derive(Debug, Clone, Default)]
pub struct NodeList {
    nodes: Vec<NodeEntry>,
    by_name: HashMap<String, NodeId>,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and return its identity.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        signals: SignalList,
    ) -> Result<NodeId, NodeError> {
        let name = name.into();
        if !is_valid_node_name(&name) {
            return Err(NodeError::InvalidName(name));
        }
        if self.by_name.contains_key(&name) {
            return Err(NodeError::Duplicate(name));
        }

        let id = NodeId(self.nodes.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.nodes.push(NodeEntry {
            name,
            signals: Arc::new(signals),
        });

        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0 as usize).map(|n| n.name.as_str())
    }

    /// Iterate over `(id, name)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n.name.as_str()))
    }
}

impl NodeRegistry for NodeList {
    fn resolve(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    fn signals_of(&self, node: NodeId) -> Option<Arc<SignalList>> {
        self.nodes.get(node.0 as usize).map(|n| n.signals.clone())
    }
}
