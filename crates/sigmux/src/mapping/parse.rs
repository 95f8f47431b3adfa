// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapping expression grammar.
//!
//! ```text
//! mapping   := NODE '.' ( "stats." METRIC '.' AGG
//!                       | "hdr." ( "sequence" | "length" )
//!                       | "ts." ( "origin" | "received" )
//!                       | "data[" IDENT ( '-' IDENT )? "]"
//!                       | ( "data." )? IDENT )
//!            | NODE ( '[' IDENT ( '-' IDENT )? ']' )?
//! ```
//!
//! Parsing never consults a node registry; names are stored verbatim.

use super::entry::{DataRange, MappingEntry, MappingRecord, MappingSource, RecordSource, SignalRef};
use super::MappingError;
use crate::node::{is_valid_node_name, NODE_NAME_PATTERN};
use regex::Regex;
use std::sync::OnceLock;

const RE_INDEX: &str = "[A-Za-z0-9_]+";

fn grammar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            concat!(
                r"^(?:(?P<node>{node})\.(?:",
                r"stats\.(?P<metric>[a-z_]+)\.(?P<agg>[a-z]+)",
                r"|hdr\.(?P<hdr>[a-z]+)",
                r"|ts\.(?P<ts>[a-z]+)",
                r"|data\[(?P<d_first>{idx})(?:-(?P<d_last>{idx}))?\]",
                r"|(?:data\.)?(?P<sig>{idx})",
                r")|(?P<bare>{node})(?:\[(?P<b_first>{idx})(?:-(?P<b_last>{idx}))?\])?)$"
            ),
            node = NODE_NAME_PATTERN,
            idx = RE_INDEX,
        );
        Regex::new(&pattern).expect("mapping grammar is a valid regex")
    })
}

/// Compile one textual mapping expression into an unbound entry.
pub fn parse_entry(text: &str) -> Result<MappingEntry, MappingError> {
    let no_match = || MappingError::malformed(text, "does not match mapping grammar");
    let caps = grammar().captures(text).ok_or_else(no_match)?;

    if let Some(node) = caps.name("bare") {
        let range = match caps.name("b_first") {
            Some(first) => {
                data_range(text, first.as_str(), caps.name("b_last").map(|m| m.as_str()))?
            }
            None => DataRange::All,
        };
        return Ok(MappingEntry::new(node.as_str(), MappingSource::Data(range)));
    }

    let node = caps.name("node").ok_or_else(no_match)?.as_str();

    let source = if let (Some(metric), Some(agg)) = (caps.name("metric"), caps.name("agg")) {
        MappingSource::Stats {
            metric: metric
                .as_str()
                .parse()
                .map_err(|e: String| MappingError::malformed(text, e))?,
            aggregation: agg
                .as_str()
                .parse()
                .map_err(|e: String| MappingError::malformed(text, e))?,
        }
    } else if let Some(field) = caps.name("hdr") {
        MappingSource::Header(
            field
                .as_str()
                .parse()
                .map_err(|e: String| MappingError::malformed(text, e))?,
        )
    } else if let Some(field) = caps.name("ts") {
        MappingSource::Timestamp(
            field
                .as_str()
                .parse()
                .map_err(|e: String| MappingError::malformed(text, e))?,
        )
    } else if let Some(first) = caps.name("d_first") {
        MappingSource::Data(data_range(
            text,
            first.as_str(),
            caps.name("d_last").map(|m| m.as_str()),
        )?)
    } else if let Some(sig) = caps.name("sig") {
        MappingSource::Data(DataRange::Single(signal_ref(text, sig.as_str())?))
    } else {
        return Err(no_match());
    };

    Ok(MappingEntry::new(node, source))
}

/// Compile a structured record into an unbound entry.
pub(crate) fn parse_record(record: &MappingRecord) -> Result<MappingEntry, MappingError> {
    let node = record.node.as_str();
    if !is_valid_node_name(node) {
        return Err(MappingError::malformed(node, "invalid node name"));
    }

    let source = match &record.source {
        RecordSource::Data { first, last } => {
            let check = |r: &SignalRef| match r.clone().normalized() {
                Some(SignalRef::Name(name)) if !is_ident(&name) => Err(MappingError::malformed(
                    node,
                    format!("invalid signal reference '{}'", name),
                )),
                Some(r) => Ok(r),
                None => Err(MappingError::malformed(
                    node,
                    format!("signal index {} out of range", r),
                )),
            };

            match (first, last) {
                (None, None) => MappingSource::Data(DataRange::All),
                (Some(first), None) => MappingSource::Data(DataRange::Single(check(first)?)),
                (Some(first), Some(last)) => {
                    MappingSource::Data(make_range(node, check(first)?, check(last)?)?)
                }
                (None, Some(_)) => {
                    return Err(MappingError::malformed(
                        node,
                        "data range has 'last' without 'first'",
                    ))
                }
            }
        }
        RecordSource::Stats {
            metric,
            aggregation,
        } => MappingSource::Stats {
            metric: *metric,
            aggregation: *aggregation,
        },
        RecordSource::Hdr { field } => MappingSource::Header(*field),
        RecordSource::Ts { field } => MappingSource::Timestamp(*field),
    };

    Ok(MappingEntry {
        node_name: node.to_string(),
        source,
        offset: record.offset,
    })
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn signal_ref(expr: &str, operand: &str) -> Result<SignalRef, MappingError> {
    SignalRef::parse(operand)
        .ok_or_else(|| MappingError::malformed(expr, format!("index {} out of range", operand)))
}

fn data_range(expr: &str, first: &str, last: Option<&str>) -> Result<DataRange, MappingError> {
    let first = signal_ref(expr, first)?;
    match last {
        Some(last) => make_range(expr, first, signal_ref(expr, last)?),
        None => Ok(DataRange::Single(first)),
    }
}

fn make_range(expr: &str, first: SignalRef, last: SignalRef) -> Result<DataRange, MappingError> {
    if let (Some(f), Some(l)) = (first.index(), last.index()) {
        if l < f {
            return Err(MappingError::malformed(
                expr,
                format!("inverted range {}-{}", f, l),
            ));
        }
    }
    Ok(DataRange::Range { first, last })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::entry::{HeaderField, TimestampField};
    use crate::stats::{Aggregation, Metric};

    fn range(first: usize, last: usize) -> MappingSource {
        MappingSource::Data(DataRange::Range {
            first: SignalRef::Index(first),
            last: SignalRef::Index(last),
        })
    }

    #[test]
    fn test_parse_data_range() {
        let e = parse_entry("node1.data[2-5]").unwrap();
        assert_eq!(e.node_name, "node1");
        assert_eq!(e.source, range(2, 5));
        assert_eq!(e.source_offset(), Some(2));
        assert_eq!(e.span(), Some(4));
        assert_eq!(e.offset, None);
    }

    #[test]
    fn test_parse_data_single_forms() {
        let bracket = parse_entry("node1.data[3]").unwrap();
        let dotted = parse_entry("node1.data.3").unwrap();
        let short = parse_entry("node1.3").unwrap();

        let expected = MappingSource::Data(DataRange::Single(SignalRef::Index(3)));
        assert_eq!(bracket.source, expected);
        assert_eq!(dotted.source, expected);
        assert_eq!(short.source, expected);
        assert_eq!(short.span(), Some(1));

        let named = parse_entry("pmu.data.va").unwrap();
        assert_eq!(
            named.source,
            MappingSource::Data(DataRange::Single(SignalRef::Name("va".into())))
        );
    }

    #[test]
    fn test_parse_stats() {
        let e = parse_entry("node1.stats.owd.mean").unwrap();
        assert_eq!(
            e.source,
            MappingSource::Stats {
                metric: Metric::Owd,
                aggregation: Aggregation::Mean,
            }
        );

        let e = parse_entry("rtp_in.stats.rtp_pkts_lost.total").unwrap();
        assert_eq!(
            e.source,
            MappingSource::Stats {
                metric: Metric::RtpPktsLost,
                aggregation: Aggregation::Total,
            }
        );
    }

    #[test]
    fn test_parse_header_and_timestamp() {
        assert_eq!(
            parse_entry("node1.hdr.sequence").unwrap().source,
            MappingSource::Header(HeaderField::Sequence)
        );
        assert_eq!(
            parse_entry("node1.hdr.length").unwrap().source,
            MappingSource::Header(HeaderField::Length)
        );
        assert_eq!(
            parse_entry("node1.ts.origin").unwrap().source,
            MappingSource::Timestamp(TimestampField::Origin)
        );
        assert_eq!(
            parse_entry("node1.ts.received").unwrap().source,
            MappingSource::Timestamp(TimestampField::Received)
        );
    }

    #[test]
    fn test_parse_bare_forms() {
        let all = parse_entry("node1").unwrap();
        assert_eq!(all.source, MappingSource::Data(DataRange::All));
        assert_eq!(all.source_offset(), Some(0));
        assert_eq!(all.span(), Some(0));

        let ranged = parse_entry("node1[0-2]").unwrap();
        assert_eq!(ranged.source, range(0, 2));
        assert_eq!(ranged.span(), Some(3));

        let single = parse_entry("node-2[7]").unwrap();
        assert_eq!(single.node_name, "node-2");
        assert_eq!(
            single.source,
            MappingSource::Data(DataRange::Single(SignalRef::Index(7)))
        );
    }

    #[test]
    fn test_parse_symbolic_range() {
        let e = parse_entry("pmu.data[va-vc]").unwrap();
        assert_eq!(
            e.source,
            MappingSource::Data(DataRange::Range {
                first: SignalRef::Name("va".into()),
                last: SignalRef::Name("vc".into()),
            })
        );
        assert_eq!(e.span(), None);
    }

    #[test]
    fn test_parse_malformed() {
        let bad = [
            "",
            "node1.",
            "node1.stats.owd",
            "node1.stats.latency.mean",
            "node1.stats.owd.median",
            "node1.hdr.flags",
            "node1.ts.sent",
            "node1.data[0-]",
            "node1.data[-2]",
            "node1.data[5-2]",
            "node1[1-2-3]",
            "node 1",
            "node1.data[0].x",
        ];

        for text in bad {
            match parse_entry(text) {
                Err(MappingError::MalformedExpression { expr, .. }) => assert_eq!(expr, text),
                other => panic!("expected malformed for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_record() {
        let record = MappingRecord {
            node: "pmu".into(),
            source: RecordSource::Data {
                first: Some(SignalRef::Name("2".into())),
                last: Some(SignalRef::Index(4)),
            },
            offset: Some(6),
        };
        let e = parse_record(&record).unwrap();
        assert_eq!(e.source, range(2, 4));
        assert_eq!(e.offset, Some(6));

        let record = MappingRecord {
            node: "pmu".into(),
            source: RecordSource::Data {
                first: None,
                last: Some(SignalRef::Index(4)),
            },
            offset: None,
        };
        assert!(parse_record(&record).is_err());

        let record = MappingRecord {
            node: "bad.node".into(),
            source: RecordSource::Hdr {
                field: HeaderField::Sequence,
            },
            offset: None,
        };
        assert!(parse_record(&record).is_err());
    }
}
