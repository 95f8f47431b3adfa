// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal descriptors and typed sample values.
//!
//! A [`Signal`] describes one value slot of a sample (name, unit, kind).
//! A [`SignalData`] is the value stored in such a slot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Signal value errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("Unknown signal type: {0}")]
    UnknownKind(String),

    #[error("Invalid {kind} value: '{text}'")]
    InvalidValue { kind: SignalKind, text: String },

    #[error("Signal {index} holds a {actual} value, expected {expected}")]
    KindMismatch {
        index: usize,
        expected: SignalKind,
        actual: SignalKind,
    },

    #[error("Signal {index} is not present in sample")]
    Missing { index: usize },
}

/// Kind of value carried by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Boolean,
    Integer,
    #[default]
    Float,
    Complex,
}

impl SignalKind {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" | "bool" => Ok(Self::Boolean),
            "integer" | "int" => Ok(Self::Integer),
            "float" | "double" => Ok(Self::Float),
            "complex" => Ok(Self::Complex),
            other => Err(SignalError::UnknownKind(other.to_string())),
        }
    }
}

/// A typed scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalData {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
}

impl Default for SignalData {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

impl SignalData {
    /// Zero value of the given kind.
    pub fn zero(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Boolean => Self::Boolean(false),
            SignalKind::Integer => Self::Integer(0),
            SignalKind::Float => Self::Float(0.0),
            SignalKind::Complex => Self::Complex { re: 0.0, im: 0.0 },
        }
    }

    /// Kind of this value.
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Boolean(_) => SignalKind::Boolean,
            Self::Integer(_) => SignalKind::Integer,
            Self::Float(_) => SignalKind::Float,
            Self::Complex { .. } => SignalKind::Complex,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Real and imaginary parts.
    pub fn as_complex(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Complex { re, im } => Some((re, im)),
            _ => None,
        }
    }

    /// Parse the textual form of a value of the given kind.
    ///
    /// Complex values accept `re`, `re+imi`, `re-imi` and `imi`.
    pub fn parse_str(kind: SignalKind, text: &str) -> Result<Self, SignalError> {
        let text = text.trim();
        let invalid = || SignalError::InvalidValue {
            kind,
            text: text.to_string(),
        };

        match kind {
            SignalKind::Boolean => match text {
                "1" | "true" => Ok(Self::Boolean(true)),
                "0" | "false" => Ok(Self::Boolean(false)),
                _ => Err(invalid()),
            },
            SignalKind::Integer => text.parse().map(Self::Integer).map_err(|_| invalid()),
            SignalKind::Float => text.parse().map(Self::Float).map_err(|_| invalid()),
            SignalKind::Complex => parse_complex(text)
                .map(|(re, im)| Self::Complex { re, im })
                .ok_or_else(invalid),
        }
    }
}

fn parse_complex(text: &str) -> Option<(f64, f64)> {
    let Some(body) = text.strip_suffix('i') else {
        return text.parse().ok().map(|re| (re, 0.0));
    };

    // Split at the last sign that is not a leading sign or part of an exponent.
    let bytes = body.as_bytes();
    let split = (1..bytes.len()).rev().find(|&i| {
        (bytes[i] == b'+' || bytes[i] == b'-') && !matches!(bytes[i - 1], b'e' | b'E')
    });

    let (re, im) = match split {
        Some(pos) => (body[..pos].parse().ok()?, &body[pos..]),
        None => (0.0, body),
    };

    let im = match im {
        "" | "+" => 1.0,
        "-" => -1.0,
        other => other.parse().ok()?,
    };

    Some((re, im))
}

impl fmt::Display for SignalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Boolean(b) => write!(f, "{}", u8::from(b)),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Complex { re, im } if im < 0.0 => write!(f, "{}-{}i", re, -im),
            Self::Complex { re, im } => write!(f, "{}+{}i", re, im),
        }
    }
}

/// Static metadata for one value slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name, unique within its list when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Physical unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Value kind.
    #[serde(rename = "type", default)]
    pub kind: SignalKind,
}

impl Signal {
    pub fn new(name: impl Into<String>, unit: Option<&str>, kind: SignalKind) -> Self {
        Self {
            name: Some(name.into()),
            unit: unit.map(str::to_string),
            kind,
        }
    }

    /// A named signal without unit.
    pub fn named(name: impl Into<String>, kind: SignalKind) -> Self {
        Self::new(name, None, kind)
    }

    /// An anonymous signal of the given kind.
    pub fn anonymous(kind: SignalKind) -> Self {
        Self {
            name: None,
            unit: None,
            kind,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or("<unnamed>"))?;
        if let Some(unit) = &self.unit {
            write!(f, " [{}]", unit)?;
        }
        write!(f, "({})", self.kind)
    }
}

/// Ordered list of signal descriptors, usually shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalList(Vec<Signal>);

impl SignalList {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self(signals)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Signal> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signal> {
        self.0.iter()
    }

    /// Index of the signal with exactly this name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|s| s.name.as_deref() == Some(name))
    }

    /// Kind of the signal at `index`, defaulting to float for undeclared slots.
    pub fn kind_at(&self, index: usize) -> SignalKind {
        self.0.get(index).map(|s| s.kind).unwrap_or_default()
    }
}

impl FromIterator<Signal> for SignalList {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SignalList {
    type Item = &'a Signal;
    type IntoIter = std::slice::Iter<'a, Signal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
