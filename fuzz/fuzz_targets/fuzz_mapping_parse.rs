// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use sigmux::{parse_entry, MappingEntry};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(entry) = parse_entry(text) {
            // Canonical text must parse back to the same entry
            let again = MappingEntry::parse(&entry.unparse());
            assert_eq!(again.as_ref(), Ok(&entry));
        }
    }
});
