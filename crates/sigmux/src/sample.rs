// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Timestamped, sequenced samples of typed values.
//!
//! A [`Sample`] owns a fixed value buffer of `capacity` slots, of which the
//! first `len()` are meaningful when [`SampleFlags::HAS_DATA`] is set. The
//! buffer is sized once at construction; writes never reallocate.

use crate::signal::{SignalData, SignalError, SignalKind, SignalList};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Which optional fields of a sample are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct SampleFlags(pub u8);

impl SampleFlags {
    /// Sender-assigned timestamp is valid.
    pub const HAS_TS_ORIGIN: Self = Self(0x01);

    /// Local arrival timestamp is valid.
    pub const HAS_TS_RECEIVED: Self = Self(0x02);

    /// Sequence number is valid.
    pub const HAS_SEQUENCE: Self = Self(0x04);

    /// Values are valid.
    pub const HAS_DATA: Self = Self(0x08);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    pub fn remove(&mut self, flag: Self) {
        self.0 &= !flag.0;
    }
}

impl BitOr for SampleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Point in time relative to the UNIX epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    sec: i64,
    nsec: u32,
}

const NANOS_PER_SEC: i64 = 1_000_000_000;

impl Timestamp {
    /// Create a timestamp, normalizing `nsec` into `[0, 1e9)`.
    pub fn new(sec: i64, nsec: u32) -> Self {
        let carry = i64::from(nsec) / NANOS_PER_SEC;
        Self {
            sec: sec + carry,
            nsec: (i64::from(nsec) % NANOS_PER_SEC) as u32,
        }
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self {
            sec: nanos.div_euclid(NANOS_PER_SEC),
            nsec: nanos.rem_euclid(NANOS_PER_SEC) as u32,
        }
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    pub fn sec(&self) -> i64 {
        self.sec
    }

    pub fn nsec(&self) -> u32 {
        self.nsec
    }

    /// Nanoseconds since the epoch, saturating at the `i64` range.
    pub fn as_nanos(&self) -> i64 {
        self.sec
            .saturating_mul(NANOS_PER_SEC)
            .saturating_add(i64::from(self.nsec))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                Self::from_nanos(-(d.as_nanos() as i64))
            }
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

/// A single record produced by one node.
#[derive(Debug, Clone)]
pub struct Sample {
    signals: Arc<SignalList>,
    data: Box<[SignalData]>,
    length: usize,
    sequence: u64,
    ts_origin: Timestamp,
    ts_received: Timestamp,
    flags: SampleFlags,
}

impl Sample {
    /// Create an empty sample able to hold `capacity` values.
    ///
    /// Slots are pre-filled with the zero value of the matching signal kind.
    pub fn with_capacity(signals: Arc<SignalList>, capacity: usize) -> Self {
        let data = (0..capacity)
            .map(|i| SignalData::zero(signals.kind_at(i)))
            .collect();

        Self {
            signals,
            data,
            length: 0,
            sequence: 0,
            ts_origin: Timestamp::default(),
            ts_received: Timestamp::default(),
            flags: SampleFlags::empty(),
        }
    }

    /// Create a full sample holding exactly `values`.
    pub fn from_values(signals: Arc<SignalList>, values: Vec<SignalData>) -> Self {
        let length = values.len();
        let mut flags = SampleFlags::empty();
        if length > 0 {
            flags.insert(SampleFlags::HAS_DATA);
        }

        Self {
            signals,
            data: values.into_boxed_slice(),
            length,
            sequence: 0,
            ts_origin: Timestamp::default(),
            ts_received: Timestamp::default(),
            flags,
        }
    }

    /// Builder-style sequence setter.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.set_sequence(sequence);
        self
    }

    pub fn signals(&self) -> &Arc<SignalList> {
        &self.signals
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of meaningful values (0 when no data is present).
    pub fn len(&self) -> usize {
        if self.flags.contains(SampleFlags::HAS_DATA) {
            self.length
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flags(&self) -> SampleFlags {
        self.flags
    }

    pub fn has(&self, flag: SampleFlags) -> bool {
        self.flags.contains(flag)
    }

    /// The meaningful values.
    pub fn values(&self) -> &[SignalData] {
        &self.data[..self.len()]
    }

    pub fn value(&self, index: usize) -> Option<&SignalData> {
        self.values().get(index)
    }

    /// Read a value, rejecting it if it is not of the expected kind.
    pub fn value_as(&self, index: usize, kind: SignalKind) -> Result<SignalData, SignalError> {
        let value = *self.value(index).ok_or(SignalError::Missing { index })?;
        if value.kind() != kind {
            return Err(SignalError::KindMismatch {
                index,
                expected: kind,
                actual: value.kind(),
            });
        }
        Ok(value)
    }

    pub fn sequence(&self) -> Option<u64> {
        self.has(SampleFlags::HAS_SEQUENCE).then_some(self.sequence)
    }

    pub fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
        self.flags.insert(SampleFlags::HAS_SEQUENCE);
    }

    pub fn ts_origin(&self) -> Option<Timestamp> {
        self.has(SampleFlags::HAS_TS_ORIGIN).then_some(self.ts_origin)
    }

    pub fn set_ts_origin(&mut self, ts: Timestamp) {
        self.ts_origin = ts;
        self.flags.insert(SampleFlags::HAS_TS_ORIGIN);
    }

    pub fn ts_received(&self) -> Option<Timestamp> {
        self.has(SampleFlags::HAS_TS_RECEIVED).then_some(self.ts_received)
    }

    pub fn set_ts_received(&mut self, ts: Timestamp) {
        self.ts_received = ts;
        self.flags.insert(SampleFlags::HAS_TS_RECEIVED);
    }

    /// Forget all values and header fields, keeping the buffer.
    pub fn clear(&mut self) {
        self.length = 0;
        self.flags = SampleFlags::empty();
    }

    /// Whole value buffer, including slots beyond `len()`.
    pub(crate) fn slots_mut(&mut self) -> &mut [SignalData] {
        &mut self.data
    }

    /// Grow the meaningful length to at least `end` and mark data present.
    pub(crate) fn mark_written(&mut self, end: usize) {
        self.length = if self.flags.contains(SampleFlags::HAS_DATA) {
            self.length.max(end)
        } else {
            end
        };
        self.flags.insert(SampleFlags::HAS_DATA);
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(seq) = self.sequence() {
            write!(f, "seq={} ", seq)?;
        }
        if let Some(ts) = self.ts_origin() {
            write!(f, "ts={} ", ts)?;
        }
        f.write_str("[")?;
        for (i, value) in self.values().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("]")
    }
}
