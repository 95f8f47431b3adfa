// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ordered mapping lists.

use super::entry::{MappingEntry, MappingItem};
use super::MappingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mapping configuration of one path: a single expression or a list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingConfig {
    Single(String),
    List(Vec<MappingItem>),
}

impl MappingConfig {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Binding state of a [`MappingList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Entries are parsed; node references are names.
    Parsed,
    /// The list was bound; see [`BoundMappingList`](super::BoundMappingList).
    Prepared,
}

/// Entries compiled together from one configuration block.
///
/// Order matters: later entries overwrite earlier writes to the same
/// destination slots.
#[derive(Debug, Clone)]
pub struct MappingList {
    entries: Vec<MappingEntry>,
    pub(super) state: ListState,
}

impl Default for MappingList {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            state: ListState::Parsed,
        }
    }

    /// Parse a sequence of textual expressions.
    pub fn parse<I, S>(exprs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for expr in exprs {
            list.push_expr(expr.as_ref())?;
        }
        Ok(list)
    }

    /// Compile a mapping configuration block.
    pub fn from_config(config: &MappingConfig) -> Result<Self, MappingError> {
        let mut list = Self::new();
        match config {
            MappingConfig::Single(expr) => list.push_expr(expr)?,
            MappingConfig::List(items) => {
                for item in items {
                    list.push(item.to_entry()?)?;
                }
            }
        }
        Ok(list)
    }

    /// Append an entry. Nothing is added once the list is prepared.
    pub fn push(&mut self, entry: MappingEntry) -> Result<(), MappingError> {
        if self.state == ListState::Prepared {
            return Err(MappingError::AlreadyPrepared);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Parse and append one expression; the list is unchanged on failure.
    pub fn push_expr(&mut self, expr: &str) -> Result<(), MappingError> {
        let entry = MappingEntry::parse(expr)?;
        self.push(entry)
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn is_prepared(&self) -> bool {
        self.state == ListState::Prepared
    }

    /// Configuration items reproducing this list.
    pub fn to_config(&self) -> MappingConfig {
        MappingConfig::List(
            self.entries
                .iter()
                .map(|e| MappingItem::Expr(e.unparse()))
                .collect(),
        )
    }
}

impl fmt::Display for MappingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
