// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use sigmux::GatewayConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = GatewayConfig::from_toml_str(text) {
            // Binding a validated config must fail cleanly, never panic
            if let Ok(nodes) = config.node_list() {
                for path in &config.paths {
                    let _ = path.prepare(&nodes);
                }
            }
        }
    }
});
