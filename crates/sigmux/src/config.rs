// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway configuration.
//!
//! Declares the nodes (with their input signals) and the paths whose
//! composite samples are assembled by mapping lists. Files are TOML, or
//! JSON when the extension is `.json`.

use crate::mapping::{BoundMappingList, MappingConfig, MappingError, MappingList, MAX_LAYOUT_LEN};
use crate::node::{is_valid_node_name, NodeError, NodeList};
use crate::signal::SignalList;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Path '{path}': {source}")]
    Mapping {
        path: String,
        #[source]
        source: MappingError,
    },

    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway name (for identification).
    #[serde(default = "default_gateway_name")]
    pub name: String,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Source nodes.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Paths assembling composite samples.
    #[serde(default)]
    pub paths: Vec<PathConfig>,
}

fn default_gateway_name() -> String {
    "sigmux".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: default_gateway_name(),
            log_level: default_log_level(),
            nodes: Vec::new(),
            paths: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Load and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for node in &self.nodes {
            if !is_valid_node_name(&node.name) {
                return Err(NodeError::InvalidName(node.name.clone()).into());
            }
            if !names.insert(node.name.as_str()) {
                return Err(NodeError::Duplicate(node.name.clone()).into());
            }
        }

        let mut paths = HashSet::new();
        for (i, path) in self.paths.iter().enumerate() {
            if path.name.is_empty() {
                return Err(ConfigError::Invalid(format!("Path {} has empty name", i)));
            }
            if !paths.insert(path.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate path name: {}",
                    path.name
                )));
            }
            if path.mapping.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Path '{}' has no mapping entries",
                    path.name
                )));
            }
            path.mapping_list()?;
        }

        Ok(())
    }

    /// Registry of the configured nodes, in declaration order.
    pub fn node_list(&self) -> Result<NodeList, ConfigError> {
        let mut list = NodeList::new();
        for node in &self.nodes {
            list.add(node.name.clone(), node.signals.clone())?;
        }
        Ok(list)
    }

    pub fn path(&self, name: &str) -> Option<&PathConfig> {
        self.paths.iter().find(|p| p.name == name)
    }

    /// Compile and bind the mapping of path `name`.
    pub fn prepare_path(
        &self,
        name: &str,
        nodes: &NodeList,
    ) -> Result<BoundMappingList, ConfigError> {
        let path = self
            .path(name)
            .ok_or_else(|| ConfigError::Invalid(format!("Unknown path: {}", name)))?;
        path.prepare(nodes)
    }
}

/// A source node and its input signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name, referenced by mapping expressions.
    pub name: String,

    /// Declared input signals.
    #[serde(default)]
    pub signals: SignalList,
}

impl NodeConfig {
    pub fn new(name: impl Into<String>, signals: SignalList) -> Self {
        Self {
            name: name.into(),
            signals,
        }
    }
}

/// A path assembling one composite sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Path name.
    pub name: String,

    /// Mapping expression(s) building the composite sample.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Composite sample capacity; derived from the mapping when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

impl PathConfig {
    pub fn new(name: impl Into<String>, mapping: MappingConfig) -> Self {
        Self {
            name: name.into(),
            mapping,
            capacity: None,
        }
    }

    /// Set an explicit composite capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Compile the mapping without binding it.
    pub fn mapping_list(&self) -> Result<MappingList, ConfigError> {
        MappingList::from_config(&self.mapping).map_err(|source| self.mapping_error(source))
    }

    /// Compile and bind the mapping against `nodes`.
    pub fn prepare(&self, nodes: &NodeList) -> Result<BoundMappingList, ConfigError> {
        let bound = self
            .mapping_list()?
            .prepare(nodes)
            .map_err(|source| self.mapping_error(source))?;

        if let Some(capacity) = self.capacity {
            if capacity < bound.required_capacity() {
                return Err(ConfigError::Invalid(format!(
                    "Path '{}' capacity {} is below required {}",
                    self.name,
                    capacity,
                    bound.required_capacity()
                )));
            }
            if capacity > MAX_LAYOUT_LEN {
                return Err(ConfigError::Invalid(format!(
                    "Path '{}' capacity {} exceeds limit {}",
                    self.name, capacity, MAX_LAYOUT_LEN
                )));
            }
        }

        Ok(bound)
    }

    /// Capacity of the composite sample for `bound`.
    pub fn effective_capacity(&self, bound: &BoundMappingList) -> usize {
        self.capacity.unwrap_or_else(|| bound.required_capacity())
    }

    fn mapping_error(&self, source: MappingError) -> ConfigError {
        ConfigError::Mapping {
            path: self.name.clone(),
            source,
        }
    }
}
