// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! sigmux CLI
//!
//! Command-line tool for checking gateway configurations and trying out
//! mapping lists on hand-written samples.
//!
//! # Usage
//!
//! ```bash
//! # Validate a configuration and print each path's layout
//! sigmux validate -c gateway.toml
//!
//! # Write an example configuration
//! sigmux gen-config -o gateway.toml
//!
//! # Merge one sample from node A into path "composite"
//! sigmux remap -c gateway.toml -p composite -n A --sequence 7 -v 1.0 2.0 3.0
//! ```

use clap::{Parser, Subcommand};
use sigmux::mapping::{MappingItem, MappingRecord, RecordSource};
use sigmux::{
    Aggregation, BoundMappingList, GatewayConfig, MappingConfig, Metric, NodeConfig, NodeRegistry,
    PathConfig, Sample, Signal, SignalData, SignalKind, SignalList, StatsRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// sigmux sample remapping gateway
#[derive(Parser, Debug)]
#[command(name = "sigmux")]
#[command(about = "sigmux - Sample remapping for real-time signal gateways")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "gateway.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Merge one sample into a path's composite sample
    Remap {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,

        /// Path name
        #[arg(short, long)]
        path: String,

        /// Originating node
        #[arg(short, long)]
        node: String,

        /// Sample values, parsed by the node's declared signal types
        #[arg(short, long, num_args = 0.., allow_hyphen_values = true)]
        values: Vec<String>,

        /// Sample sequence number
        #[arg(long)]
        sequence: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::GenConfig { output } => cmd_gen_config(output),
        Commands::Validate { config } => cmd_validate(config),
        Commands::Remap {
            config,
            path,
            node,
            values,
            sequence,
        } => cmd_remap(config, &path, &node, &values, sequence),
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig {
        name: "example-gateway".into(),
        log_level: "info".into(),
        nodes: vec![
            NodeConfig::new(
                "pmu",
                SignalList::new(vec![
                    Signal::new("va", Some("V"), SignalKind::Float),
                    Signal::new("vb", Some("V"), SignalKind::Float),
                    Signal::new("vc", Some("V"), SignalKind::Float),
                    Signal::named("locked", SignalKind::Boolean),
                ]),
            ),
            NodeConfig::new("sim", SignalList::default()),
        ],
        paths: vec![PathConfig::new(
            "composite",
            MappingConfig::List(vec![
                MappingItem::from("pmu.data[va-vc]"),
                MappingItem::from("pmu.hdr.sequence"),
                MappingItem::from("pmu.ts.origin"),
                MappingItem::Record(MappingRecord {
                    node: "sim".into(),
                    source: RecordSource::Stats {
                        metric: Metric::Owd,
                        aggregation: Aggregation::Mean,
                    },
                    offset: None,
                }),
                MappingItem::from("sim[0-1]"),
            ]),
        )],
    };

    let toml_str = toml::to_string_pretty(&config)?;

    // Add comments
    let content = format!(
        r#"# sigmux Gateway Configuration
# Generated by sigmux gen-config

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let result = GatewayConfig::from_file(&config_path).and_then(|config| {
        let nodes = config.node_list()?;
        let bound = config
            .paths
            .iter()
            .map(|path| path.prepare(&nodes))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((config, bound))
    });

    match result {
        Ok((config, bound)) => {
            println!("Configuration valid!");
            println!();
            println!("Gateway: {}", config.name);
            println!("Nodes: {}", config.nodes.len());
            for node in &config.nodes {
                println!("  {} ({} signals)", node.name, node.signals.len());
            }
            println!("Paths: {}", config.paths.len());
            for (path, list) in config.paths.iter().zip(&bound) {
                println!(
                    "  {} (capacity {})",
                    path.name,
                    path.effective_capacity(list)
                );
                print_layout(list);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_remap(
    config_path: PathBuf,
    path: &str,
    node: &str,
    values: &[String],
    sequence: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::from_file(&config_path)?;
    let nodes = config.node_list()?;
    let bound = config.prepare_path(path, &nodes)?;

    let origin = nodes
        .resolve(node)
        .ok_or_else(|| format!("Unknown node: {}", node))?;
    let signals = nodes.signals_of(origin).unwrap_or_default();

    let data = values
        .iter()
        .enumerate()
        .map(|(i, text)| SignalData::parse_str(signals.kind_at(i), text))
        .collect::<Result<Vec<_>, _>>()?;

    let mut original = Sample::from_values(signals, data);
    if let Some(seq) = sequence {
        original.set_sequence(seq);
    }

    let capacity = config
        .path(path)
        .map(|p| p.effective_capacity(&bound))
        .unwrap_or_else(|| bound.required_capacity());
    let mut composite = Sample::with_capacity(Arc::clone(bound.output_signals()), capacity);

    let report = bound.remap(origin, &original, &mut composite, &StatsRegistry::new());

    println!("Input:  {}", original);
    println!("Output: {}", composite);
    println!(
        "Applied {}, skipped {}, failed {}",
        report.applied,
        report.skipped,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {}", failure);
    }

    Ok(())
}

fn print_layout(list: &BoundMappingList) {
    for entry in list.entries() {
        println!("    [{:>3}] {}", entry.offset(), entry);
    }
    for (i, signal) in list.output_signals().iter().enumerate() {
        println!("    slot {:>3}: {}", i, signal);
    }
}
