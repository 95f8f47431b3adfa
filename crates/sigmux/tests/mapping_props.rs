// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Property tests for the mapping grammar and the incremental merge.

#![allow(clippy::float_cmp)]

use proptest::prelude::*;
use sigmux::{
    Aggregation, MappingEntry, MappingList, Metric, NodeId, NodeList, NodeRegistry, Sample, Signal,
    SignalData, SignalKind, SignalList, StatsRegistry,
};
use std::sync::Arc;

fn node_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,12}"
}

fn signal_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![any::<usize>().prop_map(|i| i.to_string()), signal_name()]
}

fn index_range() -> impl Strategy<Value = (usize, usize)> {
    prop_oneof![
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| (a.min(b), a.max(b))),
        (0usize..8, 0usize..8).prop_map(|(first, extra)| (first, first + extra)),
        (0usize..4).prop_map(|back| (usize::MAX - back, usize::MAX)),
    ]
}

/// Any text the grammar accepts, in one of its seven shapes.
fn expression() -> impl Strategy<Value = String> {
    expression_with(node_name().boxed())
}

fn expression_with(node: BoxedStrategy<String>) -> impl Strategy<Value = String> {
    let metric = prop::sample::select(Metric::ALL.to_vec());
    let agg = prop::sample::select(Aggregation::ALL.to_vec());

    prop_oneof![
        (node.clone(), index_range())
            .prop_map(|(n, (first, last))| format!("{}.data[{}-{}]", n, first, last)),
        (node.clone(), operand()).prop_map(|(n, r)| format!("{}.data[{}]", n, r)),
        (node.clone(), operand()).prop_map(|(n, r)| format!("{}.data.{}", n, r)),
        (node.clone(), metric, agg).prop_map(|(n, m, a)| format!("{}.stats.{}.{}", n, m, a)),
        (node.clone(), prop::sample::select(vec!["sequence", "length"]))
            .prop_map(|(n, f)| format!("{}.hdr.{}", n, f)),
        (node.clone(), prop::sample::select(vec!["origin", "received"]))
            .prop_map(|(n, f)| format!("{}.ts.{}", n, f)),
        node.clone(),
        (node, index_range()).prop_map(|(n, (first, last))| format!("{}[{}-{}]", n, first, last)),
    ]
}

fn registry() -> (NodeList, NodeId) {
    let mut nodes = NodeList::new();
    let a = nodes
        .add(
            "A",
            SignalList::new(vec![
                Signal::new("va", Some("V"), SignalKind::Float),
                Signal::new("vb", Some("V"), SignalKind::Float),
                Signal::new("vc", Some("V"), SignalKind::Float),
            ]),
        )
        .unwrap();
    (nodes, a)
}

proptest! {
    #[test]
    fn test_parse_unparse_round_trip(text in expression()) {
        let entry = MappingEntry::parse(&text).unwrap();
        let again = MappingEntry::parse(&entry.unparse()).unwrap();

        // Property: the canonical form describes the same entry
        prop_assert_eq!(&again, &entry);
        prop_assert_eq!(again.source_offset(), entry.source_offset());
        prop_assert_eq!(again.span(), entry.span());
        prop_assert_eq!(again.unparse(), entry.unparse());
    }

    #[test]
    fn test_parse_never_panics(text in "\\PC{0,40}") {
        let _ = MappingEntry::parse(&text);
    }

    #[test]
    fn test_bind_and_remap_never_panic(
        texts in prop::collection::vec(expression_with(Just("A".to_string()).boxed()), 1..4),
        offsets in prop::collection::vec(prop::option::of(any::<usize>()), 4),
        values in prop::collection::vec(-1e6f64..1e6, 0..6),
    ) {
        let (nodes, a) = registry();
        let mut list = MappingList::new();
        for (text, offset) in texts.iter().zip(&offsets) {
            let entry = MappingEntry::parse(text).unwrap();
            let entry = match offset {
                Some(offset) => entry.with_offset(*offset),
                None => entry,
            };
            list.push(entry).unwrap();
        }

        // Binding either succeeds or reports an error; it never panics
        let Ok(bound) = list.prepare(&nodes) else {
            return Ok(());
        };
        prop_assert!(bound.required_capacity() <= sigmux::MAX_LAYOUT_LEN);

        let original = Sample::from_values(
            nodes.signals_of(a).unwrap(),
            values.into_iter().map(SignalData::Float).collect(),
        );
        let mut composite = bound.new_sample();
        let report = bound.remap(a, &original, &mut composite, &StatsRegistry::new());

        // Property: every entry is accounted for exactly once
        prop_assert_eq!(report.applied + report.skipped + report.failures.len(), bound.len());
    }

    #[test]
    fn test_slots_of_other_nodes_are_untouched(
        calls in prop::collection::vec((any::<bool>(), prop::collection::vec(-1e6f64..1e6, 0..6)), 1..20)
    ) {
        let mut nodes = NodeList::new();
        let a = nodes.add("A", SignalList::default()).unwrap();
        let b = nodes.add("B", SignalList::default()).unwrap();

        let mut list = MappingList::parse(["A.data[0-1]", "B.data[0-2]", "A.hdr.length"]).unwrap();
        let bound = list.prepare(&nodes).unwrap();
        let a_slots = [0usize, 1, 5];
        let b_slots = [2usize, 3, 4];

        let mut composite = Sample::with_capacity(Arc::new(SignalList::default()), 6);
        let stats = StatsRegistry::new();

        for (from_a, values) in calls {
            let before = composite.clone();
            let origin = if from_a { a } else { b };
            let original = Sample::from_values(
                Arc::new(SignalList::default()),
                values.into_iter().map(SignalData::Float).collect(),
            );

            bound.remap(origin, &original, &mut composite, &stats);

            // Property: slots owned by the other node keep their value
            let foreign = if from_a { b_slots } else { a_slots };
            for slot in foreign {
                prop_assert_eq!(
                    composite.value(slot).copied().unwrap_or_default(),
                    before.value(slot).copied().unwrap_or_default()
                );
            }
        }
    }
}
